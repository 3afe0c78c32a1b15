//! Serializes values into footprints.

use tracing::{debug, trace};

use crate::bigint::to_sign_magnitude;
use crate::dispatch::ToValue;
use crate::errors::Result;
use crate::footprint::Footprint;
use crate::ordering::canonical_indices;
use crate::value::Value;
use crate::version::{Generation, CURRENT_VERSION};
use crate::wire::{canonical_float_bits, write_len, write_str, TypeTag};

/// Encodes `value` with the current version tag.
///
/// # Example
///
/// ```rust
/// use footprint_codec::{current_version, decode, encode, Value};
///
/// let footprint = encode(&Value::int(5))?;
/// assert_eq!(footprint.version(), current_version());
/// assert_eq!(decode(&footprint)?, Value::int(5));
/// # Ok::<(), footprint_codec::FootprintError>(())
/// ```
pub fn encode(value: &Value) -> Result<Footprint> {
    encode_with_version(value, CURRENT_VERSION)
}

/// Encodes `value` under the generation selected by `version`.
///
/// The tag is written verbatim as the first byte; `0` selects the legacy
/// generation and any other tag the current one.
pub fn encode_with_version(value: &Value, version: u8) -> Result<Footprint> {
    let generation = Generation::of(version);
    let mut out = vec![version];
    write_body(value, generation, &mut out)?;
    debug!(version, len = out.len(), kind = value.kind(), "encoded footprint");
    Ok(Footprint::from_encoded(out))
}

/// Converts a native value through the dispatcher and encodes it.
///
/// # Errors
///
/// Returns [`FootprintError::UnsupportedType`](crate::FootprintError::UnsupportedType)
/// when `value`, or anything nested in it, has no value-model mapping.
pub fn to_footprint<T: ToValue + ?Sized>(value: &T) -> Result<Footprint> {
    encode(&value.to_value()?)
}

/// Like [`to_footprint`] with an explicit version tag.
pub fn to_footprint_with_version<T: ToValue + ?Sized>(value: &T, version: u8) -> Result<Footprint> {
    encode_with_version(&value.to_value()?, version)
}

enum Task<'a> {
    Value(&'a Value, Generation),
    /// A value produced while encoding, such as captured extension state.
    Owned(Value, Generation),
    Raw(Vec<u8>),
    /// Routes writes into a fresh buffer for one map key.
    BeginKey,
    /// Closes the innermost key buffer.
    EndKey,
    /// Every key of a map is encoded; sort the pairs and emit them.
    FinishMap(Pairs<'a>, Generation),
}

enum Pairs<'a> {
    Borrowed(&'a [(Value, Value)]),
    Owned(Vec<(Value, Value)>),
}

impl Pairs<'_> {
    fn len(&self) -> usize {
        match self {
            Pairs::Borrowed(pairs) => pairs.len(),
            Pairs::Owned(pairs) => pairs.len(),
        }
    }
}

/// Appends the encoding of `root` (without version byte) to `out`.
///
/// Everything is expanded on an explicit work stack in pre-order: nested
/// containers, captured extension state and the key encodings a map is
/// sorted by. The native call depth stays flat however deeply values nest.
pub(crate) fn write_body(root: &Value, generation: Generation, out: &mut Vec<u8>) -> Result<()> {
    let mut stack = vec![Task::Value(root, generation)];
    // Open key buffers, innermost last.
    let mut scratch: Vec<Vec<u8>> = Vec::new();
    // Finished key encodings waiting for their map's `FinishMap`.
    let mut keys: Vec<Vec<u8>> = Vec::new();

    while let Some(task) = stack.pop() {
        match task {
            Task::Raw(bytes) => sink(&mut scratch, out).extend_from_slice(&bytes),
            Task::BeginKey => scratch.push(Vec::new()),
            Task::EndKey => keys.extend(scratch.pop()),
            Task::Value(value, generation) => {
                write_head(value, generation, sink(&mut scratch, out))?;
                match value {
                    Value::List(items) | Value::Tuple(items) => {
                        stack.extend(items.iter().rev().map(|v| Task::Value(v, generation)));
                    }
                    Value::Record(record) => stack.extend(
                        record
                            .fields()
                            .iter()
                            .rev()
                            .map(|(_, v)| Task::Value(v, generation)),
                    ),
                    Value::Map(map) => {
                        let pairs = map.as_pairs();
                        stack.push(Task::FinishMap(Pairs::Borrowed(pairs), generation));
                        for (key, _) in pairs.iter().rev() {
                            stack.push(Task::EndKey);
                            stack.push(Task::Value(key, Generation::Current));
                            stack.push(Task::BeginKey);
                        }
                    }
                    Value::Extension(ext) => {
                        trace!(class = ext.class_name(), "encoding captured state");
                        stack.push(Task::Owned(ext.capture_state(), generation));
                    }
                    _ => {}
                }
            }
            Task::Owned(value, generation) => {
                write_head(&value, generation, sink(&mut scratch, out))?;
                match value {
                    Value::List(items) | Value::Tuple(items) => {
                        stack.extend(items.into_iter().rev().map(|v| Task::Owned(v, generation)));
                    }
                    Value::Record(record) => stack.extend(
                        record
                            .into_values()
                            .into_iter()
                            .rev()
                            .map(|v| Task::Owned(v, generation)),
                    ),
                    Value::Map(map) => {
                        let pairs = map.into_pairs();
                        let key_tasks: Vec<_> = pairs
                            .iter()
                            .map(|(key, _)| Task::Owned(key.clone(), Generation::Current))
                            .collect();
                        stack.push(Task::FinishMap(Pairs::Owned(pairs), generation));
                        for key in key_tasks.into_iter().rev() {
                            stack.push(Task::EndKey);
                            stack.push(key);
                            stack.push(Task::BeginKey);
                        }
                    }
                    Value::Extension(ext) => {
                        trace!(class = ext.class_name(), "encoding captured state");
                        stack.push(Task::Owned(ext.capture_state(), generation));
                    }
                    _ => {}
                }
            }
            Task::FinishMap(pairs, generation) => {
                let mut key_bytes = keys.split_off(keys.len().saturating_sub(pairs.len()));
                let order = canonical_indices(&key_bytes);
                let buf = sink(&mut scratch, out);
                buf.push(TypeTag::Map.to_byte());
                write_len(buf, "map", order.len())?;

                match pairs {
                    Pairs::Borrowed(pairs) => {
                        for idx in order.into_iter().rev() {
                            let (key, value) = &pairs[idx];
                            stack.push(Task::Value(value, generation));
                            stack.push(match generation {
                                Generation::Current => {
                                    Task::Raw(std::mem::take(&mut key_bytes[idx]))
                                }
                                Generation::Legacy => Task::Value(key, generation),
                            });
                        }
                    }
                    Pairs::Owned(pairs) => {
                        let mut slots: Vec<Option<(Value, Value)>> =
                            pairs.into_iter().map(Some).collect();
                        for idx in order.into_iter().rev() {
                            let Some((key, value)) = slots[idx].take() else {
                                continue;
                            };
                            stack.push(Task::Owned(value, generation));
                            stack.push(match generation {
                                Generation::Current => {
                                    Task::Raw(std::mem::take(&mut key_bytes[idx]))
                                }
                                Generation::Legacy => Task::Owned(key, generation),
                            });
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn sink<'s>(scratch: &'s mut [Vec<u8>], out: &'s mut Vec<u8>) -> &'s mut Vec<u8> {
    match scratch.last_mut() {
        Some(buf) => buf,
        None => out,
    }
}

/// Writes a scalar completely, or the header of a container. Map headers
/// wait for `FinishMap`, once duplicate keys are known.
fn write_head(value: &Value, generation: Generation, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Null => out.push(TypeTag::Null.to_byte()),
        Value::Bool(b) => {
            out.push(TypeTag::Bool.to_byte());
            out.push(u8::from(*b));
        }
        Value::Int(i) => {
            out.push(TypeTag::Int.to_byte());
            let (negative, magnitude) = to_sign_magnitude(i);
            out.push(u8::from(negative));
            write_len(out, "int magnitude", magnitude.len())?;
            out.extend_from_slice(&magnitude);
        }
        Value::Float(f) => {
            out.push(TypeTag::Float.to_byte());
            out.extend_from_slice(&canonical_float_bits(*f).to_le_bytes());
        }
        Value::Complex(c) => {
            out.push(TypeTag::Complex.to_byte());
            out.extend_from_slice(&canonical_float_bits(c.re).to_le_bytes());
            out.extend_from_slice(&canonical_float_bits(c.im).to_le_bytes());
        }
        Value::Bytes(b) => {
            out.push(TypeTag::Bytes.to_byte());
            write_len(out, "bytes", b.len())?;
            out.extend_from_slice(b);
        }
        Value::Text(s) => {
            out.push(TypeTag::Text.to_byte());
            write_str(out, "text", s)?;
        }
        Value::List(items) => {
            out.push(TypeTag::List.to_byte());
            write_len(out, "sequence", items.len())?;
        }
        Value::Tuple(items) => {
            out.push(TypeTag::Tuple.to_byte());
            write_len(out, "sequence", items.len())?;
        }
        Value::Map(_) => {}
        Value::Record(record) => {
            out.push(TypeTag::Record.to_byte());
            write_str(out, "record name", record.type_name())?;
            write_len(out, "record", record.fields().len())?;
            if generation.embeds_field_names() {
                for name in record.field_names() {
                    write_str(out, "field name", name)?;
                }
            }
        }
        Value::Extension(ext) => {
            out.push(TypeTag::Extension.to_byte());
            write_str(out, "class name", ext.class_name())?;
        }
        Value::Array(array) => {
            out.push(TypeTag::Array.to_byte());
            out.push(array.dtype().to_byte());
            write_len(out, "array shape", array.shape().len())?;
            for dim in array.shape() {
                out.extend_from_slice(&dim.to_le_bytes());
            }
            write_len(out, "array data", array.data().len())?;
            out.extend_from_slice(array.data());
        }
    }
    Ok(())
}
