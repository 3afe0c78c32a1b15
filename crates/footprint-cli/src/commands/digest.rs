//! Digest command implementation.

use footprint_codec::{encode, encode_with_version, from_json, LEGACY_VERSION};

use crate::input::{read_json, CliError};

pub fn run(input: Option<String>, legacy: bool) -> Result<(), Box<dyn std::error::Error>> {
    let document = read_json(input)?;
    let value = from_json(&document).map_err(CliError::from)?;

    let footprint = if legacy {
        encode_with_version(&value, LEGACY_VERSION)
    } else {
        encode(&value)
    }
    .map_err(CliError::from)?;

    println!("{}", serde_json::to_string(&footprint.digest())?);
    Ok(())
}
