//! Encode command implementation.

use footprint_codec::{current_version, encode_with_version, from_json, LEGACY_VERSION};
use tracing::debug;

use crate::input::{read_json, CliError};
use crate::output::format_footprint;

pub fn run(
    input: Option<String>,
    legacy: bool,
    version: Option<u8>,
    base64: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = read_json(input)?;
    let value = from_json(&document).map_err(CliError::from)?;

    let version = match (legacy, version) {
        (true, _) => LEGACY_VERSION,
        (false, Some(tag)) => tag,
        (false, None) => current_version(),
    };
    debug!(version, kind = value.kind(), "encoding document");

    let footprint = encode_with_version(&value, version).map_err(CliError::from)?;
    println!("{}", format_footprint(&footprint, base64));
    Ok(())
}
