//! Deterministic binary footprints of structured values.
//!
//! A footprint is a compact byte string that fully describes a value: equal
//! values always produce byte-identical footprints, so footprints double as
//! hash keys and content addresses. Decoding rebuilds an equal value.
//!
//! The first byte of every footprint is a version tag. Tag `0` is the legacy
//! generation, in which records are positional and need a registered
//! constructor; any other tag is the current, self-describing generation.
//!
//! ```rust
//! use footprint_codec::{decode, encode, Mapping, Value};
//!
//! let forward = Mapping::from_pairs(vec![
//!     (Value::text("a"), Value::int(1)),
//!     (Value::text("b"), Value::int(2)),
//! ]);
//! let backward = Mapping::from_pairs(vec![
//!     (Value::text("b"), Value::int(2)),
//!     (Value::text("a"), Value::int(1)),
//! ]);
//! let footprint = encode(&Value::Map(forward))?;
//! assert_eq!(footprint, encode(&Value::Map(backward.clone()))?);
//! assert_eq!(decode(&footprint)?, Value::Map(backward));
//! # Ok::<(), footprint_codec::FootprintError>(())
//! ```
//!
#![deny(missing_docs)]

/// Dense numeric buffers and their element types.
pub mod array;
/// Wire form of arbitrary-precision integers.
pub mod bigint;
/// Footprint decoding and decode options.
pub mod decoder;
/// Native type to value-model conversions.
pub mod dispatch;
/// SHA-256 content digests of footprints.
pub mod digest;
/// Footprint encoding.
pub mod encoder;
/// Error types.
pub mod errors;
/// The encoded footprint wrapper.
pub mod footprint;
/// JSON rendering and parsing of values.
pub mod json;
/// Canonical mapping order.
pub mod ordering;
/// Reconstruction registry and extension traits.
pub mod registry;
/// Name validation helpers.
pub mod validation;
/// The value model.
pub mod value;
/// Version tags and wire generations.
pub mod version;
/// Type tags and low-level byte layout.
pub mod wire;

pub use array::{DType, NumericArray, NumericBuffer};
pub use num_bigint::{BigInt, ParseBigIntError};
pub use decoder::{
    decode, decode_with, decode_with_options, from_footprint, DecodeMode, DecodeOptions,
    DEFAULT_MAX_DEPTH,
};
pub use digest::{Digest, DigestAlg};
pub use dispatch::{array_from_value, array_to_value, FromValue, ToValue};
pub use encoder::{encode, encode_with_version, to_footprint, to_footprint_with_version};
pub use errors::{FootprintError, Result};
pub use footprint::Footprint;
pub use json::{from_json, to_json};
pub use ordering::{canonical_order, key_bytes, OrderedPair};
pub use registry::{
    Extension, OpaqueExtension, Reconstructor, RecordConstructor, Registry, RestoreState,
    StateFactory,
};
pub use validation::ValidationError;
pub use value::{Complex, ExtensionValue, Mapping, Record, Value};
pub use version::{current_version, peek_version, Generation, CURRENT_VERSION, LEGACY_VERSION};
pub use wire::{TypeTag, CANONICAL_NAN_BITS};
