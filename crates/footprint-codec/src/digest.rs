//! Content digests of footprints.
//!
//! Digests are computed as `sha256(domain_separator || footprint_bytes)` and
//! rendered as base64url without padding.

use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::footprint::Footprint;
use crate::validation::ValidationError;

/// Domain separator for footprint digests: `b"footprint:digest:v1\0"`.
const FOOTPRINT_DOMAIN_SEPARATOR: &[u8] = b"footprint:digest:v1\0";

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256.
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

fn b64_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{43,44}$").expect("invalid regex"))
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, ValidationError> {
        let b64 = b64.into();
        if !b64_pattern().is_match(&b64) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: b64,
            });
        }
        Ok(Digest { alg, b64 })
    }

    /// Computes the digest of an encoded footprint.
    pub fn of_footprint(footprint: &Footprint) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(FOOTPRINT_DOMAIN_SEPARATOR);
        hasher.update(footprint.as_bytes());
        let hash_bytes = hasher.finalize();
        Digest {
            alg: DigestAlg::Sha256,
            b64: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash_bytes),
        }
    }

    /// Returns `true` when this digest matches `footprint`.
    pub fn matches(&self, footprint: &Footprint) -> bool {
        self == &Digest::of_footprint(footprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode, Mapping, Value};

    #[test]
    fn digest_serializes_to_expected_json_shape() {
        let digest = Digest::of_footprint(&encode(&Value::int(5)).unwrap());
        let json = serde_json::to_value(&digest).unwrap();
        assert_eq!(json["alg"], "sha-256");
        assert_eq!(json["b64"].as_str().unwrap().len(), 43);
    }

    #[test]
    fn equal_values_share_a_digest() {
        let ab = Mapping::from_pairs(vec![
            (Value::text("a"), Value::int(1)),
            (Value::text("b"), Value::int(2)),
        ]);
        let ba = Mapping::from_pairs(vec![
            (Value::text("b"), Value::int(2)),
            (Value::text("a"), Value::int(1)),
        ]);
        let d1 = encode(&Value::Map(ab)).unwrap().digest();
        let d2 = encode(&Value::Map(ba)).unwrap().digest();
        assert_eq!(d1, d2);
        assert!(Digest::new(d1.alg, d1.b64.clone()).is_ok());
    }

    #[test]
    fn digest_distinguishes_versions() {
        let legacy = crate::encode_with_version(&Value::int(5), 0).unwrap();
        let current = encode(&Value::int(5)).unwrap();
        assert!(!legacy.digest().matches(&current));
    }

    #[test]
    fn rejects_malformed_b64() {
        assert!(Digest::new(DigestAlg::Sha256, "not a digest").is_err());
    }
}
