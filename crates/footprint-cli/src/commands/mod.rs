//! Subcommand implementations.

pub mod decode;
pub mod digest;
pub mod encode;
pub mod version;
