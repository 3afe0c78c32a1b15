use thiserror::Error;

/// Errors that can occur while producing or reading footprints.
#[derive(Error, Debug)]
pub enum FootprintError {
    /// A native value has no value-model mapping.
    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType {
        /// Rust type name of the rejected value.
        type_name: &'static str,
        /// Why the type is rejected.
        reason: String,
    },
    /// Input bytes were truncated, corrupt, or carry an unknown tag.
    #[error("malformed footprint at offset {offset}: {reason}")]
    Malformed {
        /// Byte offset where decoding failed.
        offset: usize,
        /// Reason for invalidity.
        reason: String,
    },
    /// A record or extension name is absent from the supplied registry.
    #[error("unknown class '{name}': not present in the registry")]
    UnknownClass {
        /// Record type name or extension class name.
        name: String,
    },
    /// A registered constructor or factory rejected its input.
    #[error("failed to reconstruct '{name}': {reason}")]
    Reconstruct {
        /// Registered name.
        name: String,
        /// Reason reported by the constructor.
        reason: String,
    },
    /// A value did not have the variant a native conversion expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected variant or native type.
        expected: &'static str,
        /// Variant actually found.
        found: &'static str,
    },
    /// A length exceeds what the wire format can carry.
    #[error("{what} length {len} exceeds the 32-bit length field")]
    TooLarge {
        /// What was being encoded.
        what: &'static str,
        /// Offending length.
        len: usize,
    },
    /// Numeric array metadata is inconsistent with its bytes.
    #[error("invalid numeric array: {0}")]
    InvalidArray(String),
}

impl FootprintError {
    /// Returns `true` when retrying with an augmented registry can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FootprintError::UnknownClass { .. })
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        FootprintError::Malformed {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FootprintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unknown_class_is_recoverable() {
        let unknown = FootprintError::UnknownClass { name: "T".into() };
        assert!(unknown.is_recoverable());
        assert!(!FootprintError::malformed(3, "truncated").is_recoverable());
    }

    #[test]
    fn malformed_message_carries_offset() {
        let err = FootprintError::malformed(17, "unknown type tag 0xff");
        assert_eq!(
            err.to_string(),
            "malformed footprint at offset 17: unknown type tag 0xff"
        );
    }
}
