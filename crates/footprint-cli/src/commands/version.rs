//! Version command implementation.

use footprint_codec::{current_version, LEGACY_VERSION};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("current {:#04x}", current_version());
    println!("legacy  {:#04x}", LEGACY_VERSION);
    Ok(())
}
