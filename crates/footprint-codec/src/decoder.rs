//! Reconstructs values from footprints.
//!
//! Decoding is all-or-nothing: the first inconsistency aborts the call and
//! nothing partially built escapes. Containers are tracked on an explicit
//! frame stack bounded by [`DecodeOptions::max_depth`], so adversarial
//! nesting cannot exhaust the native stack.

use bytes::Bytes;
use num_bigint::BigInt;
use tracing::debug;

use crate::array::{expected_len, DType, NumericArray};
use crate::bigint::from_sign_magnitude;
use crate::dispatch::FromValue;
use crate::errors::{FootprintError, Result};
use crate::ordering::{is_strictly_ascending, key_bytes};
use crate::registry::Registry;
use crate::value::{Complex, Mapping, Record, Value};
use crate::version::{peek_version, Generation};
use crate::wire::{Cursor, TypeTag, CANONICAL_NAN_BITS};

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// How tolerant the decoder is of non-canonical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Reject anything the encoder would not have produced: unsorted or
    /// duplicate map keys, non-minimal integers, negative zero, and NaN
    /// payloads other than the canonical one.
    Strict,
    /// Accept any well-formed input; re-encoding normalizes it.
    #[default]
    Permissive,
}

/// Options for decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Tolerance for non-canonical input (default: permissive).
    pub mode: DecodeMode,
    /// Maximum container nesting (default: 512).
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            mode: DecodeMode::Permissive,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Strict options with the default depth bound.
    pub fn strict() -> Self {
        Self {
            mode: DecodeMode::Strict,
            ..Self::default()
        }
    }
}

/// Decodes `bytes` with an empty registry.
///
/// Legacy records and every extension object fail with
/// [`FootprintError::UnknownClass`]; use [`decode_with`] to supply a registry.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    decode_with(bytes, &Registry::new())
}

/// Decodes `bytes`, resolving names through `registry`.
pub fn decode_with(bytes: &[u8], registry: &Registry) -> Result<Value> {
    decode_with_options(bytes, registry, &DecodeOptions::default())
}

/// Decodes `bytes` with explicit options.
///
/// # Errors
///
/// - [`FootprintError::Malformed`] for empty, truncated or corrupt input,
///   unknown tags, trailing bytes, nesting beyond `max_depth`, and (in strict
///   mode) non-canonical encodings
/// - [`FootprintError::UnknownClass`] when a legacy record or any extension
///   names a class absent from `registry`
/// - [`FootprintError::Reconstruct`] when a registered constructor rejects
///   its input
pub fn decode_with_options(
    bytes: &[u8],
    registry: &Registry,
    options: &DecodeOptions,
) -> Result<Value> {
    let version = peek_version(bytes)?;
    let decoder = Decoder {
        generation: Generation::of(version),
        registry,
        options,
    };
    let mut cursor = Cursor::new(&bytes[1..]);
    match decoder.run(&mut cursor) {
        Ok(value) => {
            debug!(version, len = bytes.len(), kind = value.kind(), "decoded footprint");
            Ok(value)
        }
        Err(err) => {
            debug!(version, len = bytes.len(), error = %err, "decode failed");
            Err(shift_offset(err))
        }
    }
}

/// Decodes `bytes` and converts the result into a native value.
pub fn from_footprint<T: FromValue>(bytes: &[u8], registry: &Registry) -> Result<T> {
    T::from_value(decode_with(bytes, registry)?)
}

/// Offsets inside the body are reported relative to the whole footprint.
fn shift_offset(err: FootprintError) -> FootprintError {
    match err {
        FootprintError::Malformed { offset, reason } => FootprintError::Malformed {
            offset: offset + 1,
            reason,
        },
        other => other,
    }
}

enum Frame {
    Seq {
        tuple: bool,
        items: Vec<Value>,
        remaining: usize,
    },
    Map {
        offset: usize,
        pairs: Vec<(Value, Value)>,
        key: Option<Value>,
        remaining: usize,
    },
    Record {
        type_name: String,
        field_names: Option<Vec<String>>,
        values: Vec<Value>,
        remaining: usize,
        offset: usize,
    },
    Extension {
        class_name: String,
        state: Option<Value>,
    },
}

impl Frame {
    /// Adds a finished child; returns `true` once the frame is complete.
    fn push(&mut self, value: Value) -> bool {
        match self {
            Frame::Seq {
                items, remaining, ..
            } => {
                items.push(value);
                *remaining -= 1;
                *remaining == 0
            }
            Frame::Map {
                pairs,
                key,
                remaining,
                ..
            } => match key.take() {
                None => {
                    *key = Some(value);
                    false
                }
                Some(k) => {
                    pairs.push((k, value));
                    *remaining -= 1;
                    *remaining == 0
                }
            },
            Frame::Record {
                values, remaining, ..
            } => {
                values.push(value);
                *remaining -= 1;
                *remaining == 0
            }
            Frame::Extension { state, .. } => {
                *state = Some(value);
                true
            }
        }
    }
}

struct Decoder<'r> {
    generation: Generation,
    registry: &'r Registry,
    options: &'r DecodeOptions,
}

impl Decoder<'_> {
    fn strict(&self) -> bool {
        self.options.mode == DecodeMode::Strict
    }

    fn run(&self, cursor: &mut Cursor<'_>) -> Result<Value> {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let mut done = self.read_item(cursor, &mut stack)?;

            while let Some(value) = done.take() {
                let complete = match stack.last_mut() {
                    None => {
                        if cursor.remaining() > 0 {
                            return Err(FootprintError::malformed(
                                cursor.position(),
                                format!("{} trailing bytes after value", cursor.remaining()),
                            ));
                        }
                        return Ok(value);
                    }
                    Some(frame) => frame.push(value),
                };
                if complete {
                    if let Some(frame) = stack.pop() {
                        done = Some(self.finish(frame)?);
                    }
                }
            }
        }
    }

    /// Reads one tagged item. Atoms and empty containers come back finished;
    /// non-empty containers push a frame and return `None`.
    fn read_item(&self, cursor: &mut Cursor<'_>, stack: &mut Vec<Frame>) -> Result<Option<Value>> {
        let offset = cursor.position();
        let tag_byte = cursor.u8("type tag")?;
        let tag = TypeTag::from_byte(tag_byte).ok_or_else(|| {
            FootprintError::malformed(offset, format!("unknown type tag 0x{:02x}", tag_byte))
        })?;

        let value = match tag {
            TypeTag::Null => Value::Null,
            TypeTag::Bool => match cursor.u8("bool")? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(FootprintError::malformed(
                        offset + 1,
                        format!("invalid bool byte 0x{:02x}", other),
                    ))
                }
            },
            TypeTag::Int => Value::Int(self.read_int(cursor)?),
            TypeTag::Float => Value::Float(self.read_float(cursor)?),
            TypeTag::Complex => {
                let re = self.read_float(cursor)?;
                let im = self.read_float(cursor)?;
                Value::Complex(Complex::new(re, im))
            }
            TypeTag::Bytes => Value::Bytes(Bytes::copy_from_slice(cursor.bytes("bytes")?)),
            TypeTag::Text => Value::Text(cursor.str("text")?.to_string()),
            TypeTag::List | TypeTag::Tuple => {
                let tuple = tag == TypeTag::Tuple;
                let count = cursor.length("sequence length")?;
                if count == 0 {
                    return Ok(Some(if tuple {
                        Value::Tuple(Vec::new())
                    } else {
                        Value::List(Vec::new())
                    }));
                }
                let items = Vec::with_capacity(count.min(cursor.remaining()));
                self.push_frame(
                    stack,
                    offset,
                    Frame::Seq {
                        tuple,
                        items,
                        remaining: count,
                    },
                )?;
                return Ok(None);
            }
            TypeTag::Map => {
                let count = cursor.length("map length")?;
                if count == 0 {
                    return Ok(Some(Value::Map(Mapping::new())));
                }
                let pairs = Vec::with_capacity(count.min(cursor.remaining()));
                self.push_frame(
                    stack,
                    offset,
                    Frame::Map {
                        offset,
                        pairs,
                        key: None,
                        remaining: count,
                    },
                )?;
                return Ok(None);
            }
            TypeTag::Record => {
                let type_name = cursor.str("record name")?.to_string();
                let count = cursor.length("record length")?;
                let field_names = if self.generation.embeds_field_names() {
                    let mut names = Vec::with_capacity(count.min(cursor.remaining()));
                    for _ in 0..count {
                        names.push(cursor.str("field name")?.to_string());
                    }
                    Some(names)
                } else {
                    // Fail before reading the fields when nothing can build them.
                    self.registry.record_constructor(&type_name)?;
                    None
                };
                let frame = Frame::Record {
                    type_name,
                    field_names,
                    values: Vec::with_capacity(count.min(cursor.remaining())),
                    remaining: count,
                    offset,
                };
                if count == 0 {
                    return self.finish(frame).map(Some);
                }
                self.push_frame(stack, offset, frame)?;
                return Ok(None);
            }
            TypeTag::Extension => {
                let class_name = cursor.str("class name")?.to_string();
                self.registry.state_factory(&class_name)?;
                self.push_frame(
                    stack,
                    offset,
                    Frame::Extension {
                        class_name,
                        state: None,
                    },
                )?;
                return Ok(None);
            }
            TypeTag::Array => Value::Array(self.read_array(cursor)?),
        };
        Ok(Some(value))
    }

    fn push_frame(&self, stack: &mut Vec<Frame>, offset: usize, frame: Frame) -> Result<()> {
        if stack.len() >= self.options.max_depth {
            return Err(FootprintError::malformed(
                offset,
                format!("nesting deeper than {} levels", self.options.max_depth),
            ));
        }
        stack.push(frame);
        Ok(())
    }

    fn finish(&self, frame: Frame) -> Result<Value> {
        match frame {
            Frame::Seq { tuple, items, .. } => Ok(if tuple {
                Value::Tuple(items)
            } else {
                Value::List(items)
            }),
            Frame::Map { offset, pairs, .. } => {
                if self.strict() {
                    let keys = pairs
                        .iter()
                        .map(|(key, _)| key_bytes(key))
                        .collect::<Result<Vec<_>>>()?;
                    if !is_strictly_ascending(&keys) {
                        return Err(FootprintError::malformed(
                            offset,
                            "map keys are not in canonical order",
                        ));
                    }
                }
                Ok(Value::Map(Mapping::from_pairs(pairs)))
            }
            Frame::Record {
                type_name,
                field_names,
                values,
                offset,
                ..
            } => match field_names {
                Some(names) => {
                    let fields = names.into_iter().zip(values).collect();
                    Record::new(type_name, fields)
                        .map(Value::Record)
                        .map_err(|e| FootprintError::malformed(offset, e.to_string()))
                }
                None => {
                    let constructor = self.registry.record_constructor(&type_name)?;
                    constructor(values).map(Value::Record)
                }
            },
            Frame::Extension { class_name, state } => {
                let state = state.unwrap_or(Value::Null);
                let factory = self.registry.state_factory(&class_name)?;
                factory(state).map(Value::Extension)
            }
        }
    }

    fn read_int(&self, cursor: &mut Cursor<'_>) -> Result<BigInt> {
        let offset = cursor.position();
        let negative = match cursor.u8("int sign")? {
            0 => false,
            1 => true,
            other => {
                return Err(FootprintError::malformed(
                    offset,
                    format!("invalid int sign byte 0x{:02x}", other),
                ))
            }
        };
        let magnitude = cursor.bytes("int magnitude")?;
        if self.strict() {
            if magnitude.first() == Some(&0) {
                return Err(FootprintError::malformed(
                    offset,
                    "int magnitude has leading zero bytes",
                ));
            }
            if negative && magnitude.is_empty() {
                return Err(FootprintError::malformed(offset, "negative zero int"));
            }
        }
        Ok(from_sign_magnitude(negative, magnitude))
    }

    fn read_float(&self, cursor: &mut Cursor<'_>) -> Result<f64> {
        let offset = cursor.position();
        let bits = cursor.u64("float")?;
        let value = f64::from_bits(bits);
        if self.strict() && value.is_nan() && bits != CANONICAL_NAN_BITS {
            return Err(FootprintError::malformed(
                offset,
                format!("non-canonical NaN payload 0x{:016x}", bits),
            ));
        }
        Ok(value)
    }

    fn read_array(&self, cursor: &mut Cursor<'_>) -> Result<NumericArray> {
        let offset = cursor.position();
        let dtype_byte = cursor.u8("array dtype")?;
        let dtype = DType::from_byte(dtype_byte).ok_or_else(|| {
            FootprintError::malformed(offset, format!("unknown dtype tag 0x{:02x}", dtype_byte))
        })?;
        let ndim = cursor.length("array rank")?;
        let mut shape = Vec::with_capacity(ndim.min(cursor.remaining() / 8));
        for _ in 0..ndim {
            shape.push(cursor.u64("array dimension")?);
        }
        let data_offset = cursor.position();
        let data = cursor.bytes("array data")?;
        if expected_len(dtype, &shape) != Some(data.len()) {
            return Err(FootprintError::malformed(
                data_offset,
                format!(
                    "{} data bytes do not match shape {:?} of {}",
                    data.len(),
                    shape,
                    dtype.label()
                ),
            ));
        }
        NumericArray::new(dtype, shape, Bytes::copy_from_slice(data))
            .map_err(|e| FootprintError::malformed(offset, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, encode_with_version};
    use crate::version::LEGACY_VERSION;

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(
            decode(&[]).unwrap_err(),
            FootprintError::Malformed { offset: 0, .. }
        ));
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let err = decode(&[0x80, 0xEE]).unwrap_err();
        match err {
            FootprintError::Malformed { offset, reason } => {
                assert_eq!(offset, 1);
                assert!(reason.contains("0xee"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_truncation_is_malformed() {
        let value = Value::List(vec![
            Value::int(12345678),
            Value::text("hallo Welt"),
            Value::Tuple(vec![Value::Float(3.141), Value::Null]),
        ]);
        let footprint = encode(&value).unwrap();
        for cut in 0..footprint.len() {
            let err = decode(&footprint[..cut]).unwrap_err();
            assert!(
                matches!(err, FootprintError::Malformed { .. }),
                "prefix of {cut} bytes gave {err}"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = encode(&Value::Null).unwrap().to_vec();
        bytes.push(0x01);
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            FootprintError::Malformed { offset: 2, .. }
        ));
    }

    #[test]
    fn invalid_bool_byte_is_malformed() {
        assert!(decode(&[0x80, 0x02, 0x02]).is_err());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut bytes = vec![0x80];
        for _ in 0..10 {
            bytes.push(TypeTag::List.to_byte());
            bytes.extend_from_slice(&1u32.to_le_bytes());
        }
        bytes.push(TypeTag::Null.to_byte());
        let options = DecodeOptions {
            max_depth: 5,
            ..DecodeOptions::default()
        };
        let err = decode_with_options(&bytes, &Registry::new(), &options).unwrap_err();
        assert!(err.to_string().contains("nesting"));
        assert!(decode(&bytes).is_ok());
    }

    #[test]
    fn huge_declared_count_does_not_allocate() {
        let mut bytes = vec![0x80, TypeTag::List.to_byte()];
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            FootprintError::Malformed { .. }
        ));
    }

    #[test]
    fn strict_rejects_unsorted_map() {
        // {"b": 1, "a": 2} written in insertion order.
        let mut bytes = vec![0x80, TypeTag::Map.to_byte()];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        for (key, value) in [("b", 1u8), ("a", 2u8)] {
            bytes.push(TypeTag::Text.to_byte());
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(key.as_bytes());
            bytes.extend_from_slice(&[TypeTag::Int.to_byte(), 0, 1, 0, 0, 0, value]);
        }
        assert!(decode_with_options(&bytes, &Registry::new(), &DecodeOptions::strict()).is_err());

        // Permissive decoding accepts it and re-encoding canonicalizes.
        let value = decode(&bytes).unwrap();
        let reencoded = encode(&value).unwrap();
        assert_ne!(reencoded.as_bytes(), &bytes[..]);
        assert!(decode_with_options(&reencoded, &Registry::new(), &DecodeOptions::strict()).is_ok());
    }

    #[test]
    fn strict_rejects_non_minimal_int() {
        let bytes = [0x80, TypeTag::Int.to_byte(), 0, 2, 0, 0, 0, 0, 5];
        assert!(decode_with_options(&bytes, &Registry::new(), &DecodeOptions::strict()).is_err());
        assert_eq!(decode(&bytes).unwrap(), Value::int(5));

        let negative_zero = [0x80, TypeTag::Int.to_byte(), 1, 0, 0, 0, 0];
        assert!(
            decode_with_options(&negative_zero, &Registry::new(), &DecodeOptions::strict())
                .is_err()
        );
        assert_eq!(decode(&negative_zero).unwrap(), Value::int(0));
    }

    #[test]
    fn strict_rejects_non_canonical_nan() {
        let mut bytes = vec![0x80, TypeTag::Float.to_byte()];
        bytes.extend_from_slice(&0x7ff8_0000_0000_0001u64.to_le_bytes());
        assert!(decode_with_options(&bytes, &Registry::new(), &DecodeOptions::strict()).is_err());
        assert!(matches!(decode(&bytes).unwrap(), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn array_byte_length_must_match_shape() {
        let array = NumericArray::from_f64(vec![2], &[1.0, 2.0]).unwrap();
        let mut bytes = encode(&Value::Array(array)).unwrap().to_vec();
        // Overwrite the first dimension (after version, tag, dtype, rank).
        bytes[7..15].copy_from_slice(&3u64.to_le_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            FootprintError::Malformed { .. }
        ));
    }

    #[test]
    fn legacy_record_needs_registry_before_fields_are_read() {
        let record = Record::from_positional("nt", &["x"], vec![Value::int(1)]).unwrap();
        let footprint = encode_with_version(&Value::Record(record), LEGACY_VERSION).unwrap();
        let err = decode(&footprint).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_containers_round_trip() {
        for value in [
            Value::List(vec![]),
            Value::Tuple(vec![]),
            Value::Map(Mapping::new()),
            Value::Record(Record::new("empty", vec![]).unwrap()),
        ] {
            let footprint = encode(&value).unwrap();
            assert_eq!(decode(&footprint).unwrap(), value);
        }
    }
}
