//! The value model: every shape a footprint can carry.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::array::NumericArray;
use crate::ordering::{canonical_order, key_bytes};
use crate::registry::Extension;
use crate::validation::{validate_field_name, validate_type_name, ValidationError};

/// Tagged value encodable as a footprint.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean, tagged apart from integers.
    Bool(bool),
    /// Arbitrary-precision integer.
    Int(BigInt),
    /// IEEE-754 binary64.
    Float(f64),
    /// Complex number of two binary64 parts.
    Complex(Complex),
    /// Immutable byte string.
    Bytes(Bytes),
    /// Unicode text.
    Text(String),
    /// Ordered, resizable sequence.
    List(Vec<Value>),
    /// Ordered, fixed sequence.
    Tuple(Vec<Value>),
    /// Associative container.
    Map(Mapping),
    /// Named fixed-field value.
    Record(Record),
    /// User object captured through its state.
    Extension(ExtensionValue),
    /// Dense numeric buffer.
    Array(NumericArray),
}

impl Value {
    /// Short variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Extension(_) => "extension",
            Value::Array(_) => "array",
        }
    }

    /// Builds a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Builds an integer value.
    pub fn int(v: impl Into<BigInt>) -> Self {
        Value::Int(v.into())
    }

    /// Builds a bytes value.
    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Value::Bytes(b.into())
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload as `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => i.to_i64(),
            _ => None,
        }
    }

    /// Returns the elements of a list or tuple.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map payload, if any.
    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the record payload, if any.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

/// Complex number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex {
    /// Creates a complex number.
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// Key/value container whose footprint ignores insertion order.
///
/// Keys are matched by their current-generation encoding, not by `==`: `0.0`
/// and `-0.0` are distinct keys while every NaN is the same key. Pairs are
/// kept as supplied by [`Mapping::from_pairs`]; keys with the same encoding
/// collapse at encode time, the pair supplied last winning.
/// [`Mapping::insert`] applies the same rule eagerly.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps pairs without deduplicating them.
    pub fn from_pairs(entries: Vec<(Value, Value)>) -> Self {
        Self { entries }
    }

    /// Inserts a pair, replacing and returning the value of a key with the
    /// same encoding.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a key; with duplicate keys the last one supplied wins.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    /// Index of the last pair whose key encodes like `key`. Keys that cannot
    /// be encoded match nothing.
    fn position(&self, key: &Value) -> Option<usize> {
        let wanted = key_bytes(key).ok()?;
        self.entries
            .iter()
            .rposition(|(k, _)| key_bytes(k).is_ok_and(|bytes| bytes == wanted))
    }

    /// Pairs as supplied.
    pub fn as_pairs(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// Number of pairs as supplied.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no pairs are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates pairs in supplied order.
    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    /// Consumes the mapping into its pairs.
    pub fn into_pairs(self) -> Vec<(Value, Value)> {
        self.entries
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        let (Ok(left), Ok(right)) = (canonical_order(self), canonical_order(other)) else {
            return false;
        };
        left.len() == right.len()
            && left
                .iter()
                .zip(right.iter())
                .all(|(l, r)| l.key_bytes == r.key_bytes && l.value == r.value)
    }
}

impl FromIterator<(Value, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Named tuple-like value with ordered, named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates a record, validating the type name and field names.
    pub fn new(
        type_name: impl Into<String>,
        fields: Vec<(String, Value)>,
    ) -> Result<Self, ValidationError> {
        let type_name = type_name.into();
        validate_type_name(&type_name)?;
        for (idx, (name, _)) in fields.iter().enumerate() {
            validate_field_name(name)?;
            if fields[..idx].iter().any(|(other, _)| other == name) {
                return Err(ValidationError::Duplicate {
                    field: "record field",
                    value: name.clone(),
                });
            }
        }
        Ok(Self { type_name, fields })
    }

    /// Zips field names with positional values.
    pub fn from_positional<S: AsRef<str>>(
        type_name: impl Into<String>,
        field_names: &[S],
        values: Vec<Value>,
    ) -> Result<Self, ValidationError> {
        if field_names.len() != values.len() {
            return Err(ValidationError::OutOfBounds {
                field: "record arity",
                value: format!("{} values for {} fields", values.len(), field_names.len()),
            });
        }
        let fields = field_names
            .iter()
            .map(|n| n.as_ref().to_string())
            .zip(values)
            .collect();
        Self::new(type_name, fields)
    }

    /// Record type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Ordered `(name, value)` fields.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Consumes the record into its positional values.
    pub fn into_values(self) -> Vec<Value> {
        self.fields.into_iter().map(|(_, v)| v).collect()
    }
}

/// Shared handle to a user object that participates through state capture.
#[derive(Clone)]
pub struct ExtensionValue(Arc<dyn Extension>);

impl ExtensionValue {
    /// Wraps an extension object.
    pub fn new<T: Extension + 'static>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Wraps an already shared extension object.
    pub fn from_arc(object: Arc<dyn Extension>) -> Self {
        Self(object)
    }

    /// Class name the object is registered under.
    pub fn class_name(&self) -> &str {
        self.0.class_name()
    }

    /// Captured state of the object.
    pub fn capture_state(&self) -> Value {
        self.0.capture_state()
    }

    /// Borrows the concrete object when it is a `T`.
    pub fn downcast_ref<T: Extension + 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// The shared object.
    pub fn inner(&self) -> &Arc<dyn Extension> {
        &self.0
    }
}

impl PartialEq for ExtensionValue {
    fn eq(&self, other: &Self) -> bool {
        self.class_name() == other.class_name() && self.capture_state() == other.capture_state()
    }
}

impl fmt::Debug for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionValue")
            .field("class_name", &self.class_name())
            .field("object", &self.0)
            .finish()
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v.into())
            }
        }
    )*};
}

value_from!(
    bool => Bool,
    i64 => Int,
    BigInt => Int,
    f64 => Float,
    Complex => Complex,
    Bytes => Bytes,
    String => Text,
    &str => Text,
    Mapping => Map,
    Record => Record,
    ExtensionValue => Extension,
    NumericArray => Array,
);
