//! Wire-format generations and the leading version byte.
//!
//! Tag `0` is the legacy generation: records carry only their type name and
//! positional values, so decoding them needs a registered constructor. Every
//! other tag is the current, self-describing generation, which also embeds
//! record field names. Persisted footprints of either generation must keep
//! decoding exactly as they did when written.

use crate::errors::{FootprintError, Result};

/// Version tag of the legacy generation.
pub const LEGACY_VERSION: u8 = 0x00;

/// Version tag written when none is requested.
pub const CURRENT_VERSION: u8 = 0x80;

/// Returns the version tag used by [`encode`](crate::encode).
pub fn current_version() -> u8 {
    CURRENT_VERSION
}

/// Decoding rules selected by a version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// Positional records, names resolved through the registry.
    Legacy,
    /// Self-describing records with embedded field names.
    Current,
}

impl Generation {
    /// Generation governing a footprint written with `version`.
    pub fn of(version: u8) -> Self {
        if version == LEGACY_VERSION {
            Generation::Legacy
        } else {
            Generation::Current
        }
    }

    /// Whether records carry their field names on the wire.
    pub fn embeds_field_names(self) -> bool {
        matches!(self, Generation::Current)
    }
}

/// Reads the version tag of an encoded footprint without decoding it.
pub fn peek_version(bytes: &[u8]) -> Result<u8> {
    bytes
        .first()
        .copied()
        .ok_or_else(|| FootprintError::malformed(0, "empty input has no version tag"))
}
