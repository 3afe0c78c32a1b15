//! Reading command input from files or stdin.

use std::io::{self, Read};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Errors raised while reading or parsing command input.
#[derive(Error, Debug)]
pub enum CliError {
    /// Input file or stdin could not be read.
    #[error("failed to read {source_name}: {source}")]
    Io {
        /// File path or `stdin`.
        source_name: String,
        /// Underlying error.
        source: io::Error,
    },
    /// Input was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Footprint text was not valid hex.
    #[error("invalid hex footprint: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Footprint text was not valid base64url.
    #[error("invalid base64url footprint: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A command-line argument could not be parsed.
    #[error("invalid argument: {0}")]
    Argument(String),
    /// The codec rejected the value or bytes.
    #[error(transparent)]
    Footprint(#[from] footprint_codec::FootprintError),
}

/// Reads the whole input from `path`, or stdin when absent.
pub fn read_input(path: Option<String>) -> Result<String, CliError> {
    match path {
        Some(path) => std::fs::read_to_string(&path).map_err(|source| CliError::Io {
            source_name: path,
            source,
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| CliError::Io {
                    source_name: "stdin".to_string(),
                    source,
                })?;
            Ok(buffer)
        }
    }
}

/// Reads and parses a JSON document.
pub fn read_json(path: Option<String>) -> Result<serde_json::Value, CliError> {
    Ok(serde_json::from_str(&read_input(path)?)?)
}

/// Parses footprint text; surrounding whitespace is ignored.
pub fn parse_footprint(text: &str, base64: bool) -> Result<Vec<u8>, CliError> {
    let text = text.trim();
    if base64 {
        Ok(URL_SAFE_NO_PAD.decode(text)?)
    } else {
        Ok(hex::decode(text)?)
    }
}

/// Parses a `NAME=field,field` record layout.
pub fn parse_record_layout(layout: &str) -> Result<(String, Vec<String>), CliError> {
    let (name, fields) = layout
        .split_once('=')
        .ok_or_else(|| CliError::Argument(format!("record layout '{}' lacks '='", layout)))?;
    let fields = fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    Ok((name.trim().to_string(), fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_trailing_newline() {
        assert_eq!(parse_footprint("8001\n", false).unwrap(), vec![0x80, 0x01]);
    }

    #[test]
    fn parses_base64url() {
        assert_eq!(parse_footprint("gAE", true).unwrap(), vec![0x80, 0x01]);
    }

    #[test]
    fn parses_record_layouts() {
        let (name, fields) = parse_record_layout("Point=x, y").unwrap();
        assert_eq!(name, "Point");
        assert_eq!(fields, vec!["x", "y"]);
        assert_eq!(parse_record_layout("Unit=").unwrap().1.len(), 0);
        assert!(parse_record_layout("Point").is_err());
    }

    #[test]
    fn rejects_odd_hex() {
        assert!(matches!(
            parse_footprint("801", false).unwrap_err(),
            CliError::Hex(_)
        ));
    }
}
