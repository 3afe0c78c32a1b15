//! Output formatting utilities.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use footprint_codec::Footprint;
use serde_json::Value;

/// Formats a document as pretty JSON.
pub fn format_json(document: &Value) -> String {
    serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string())
}

/// Renders footprint bytes as hex, or base64url without padding.
pub fn format_footprint(footprint: &Footprint, base64: bool) -> String {
    if base64 {
        URL_SAFE_NO_PAD.encode(footprint.as_bytes())
    } else {
        footprint.to_hex()
    }
}
