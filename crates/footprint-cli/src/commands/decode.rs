//! Decode command implementation.

use footprint_codec::{decode_with_options, to_json, DecodeMode, DecodeOptions, Registry};
use tracing::debug;

use crate::input::{parse_footprint, parse_record_layout, read_input, CliError};
use crate::output::format_json;

pub fn run(
    input: Option<String>,
    base64: bool,
    opaque: Vec<String>,
    records: Vec<String>,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = parse_footprint(&read_input(input)?, base64)?;

    let mut registry = Registry::new();
    for name in opaque {
        registry.register_opaque(name);
    }
    for layout in records {
        let (name, fields) = parse_record_layout(&layout)?;
        registry.register_record(name, fields.as_slice());
    }
    let options = DecodeOptions {
        mode: if strict {
            DecodeMode::Strict
        } else {
            DecodeMode::Permissive
        },
        ..DecodeOptions::default()
    };
    debug!(len = bytes.len(), registered = registry.len(), "decoding footprint");

    let value = decode_with_options(&bytes, &registry, &options).map_err(CliError::from)?;
    println!("{}", format_json(&to_json(&value)));
    Ok(())
}
