//! Conversions between native Rust values and the value model.
//!
//! [`ToValue`] decides, per type, which [`Value`] variant a native value
//! becomes; [`FromValue`] is the inverse used by
//! [`from_footprint`](crate::from_footprint). Types with no faithful,
//! immutable representation implement [`ToValue`] by returning
//! [`FootprintError::UnsupportedType`] so the rejection surfaces before a
//! single byte is written.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use bytes::{Bytes, BytesMut};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::array::{NumericArray, NumericBuffer};
use crate::errors::{FootprintError, Result};
use crate::value::{Complex, ExtensionValue, Mapping, Record, Value};

/// Native value with a value-model representation.
pub trait ToValue {
    /// Converts `self`, failing when it (or anything it contains) has no
    /// faithful representation.
    fn to_value(&self) -> Result<Value>;
}

/// Native value that can be rebuilt from a decoded [`Value`].
pub trait FromValue: Sized {
    /// Converts `value`, failing when its variant does not fit `Self`.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: &'static str, found: &Value) -> Result<T> {
    Err(FootprintError::TypeMismatch {
        expected,
        found: found.kind(),
    })
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value> {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Result<Value> {
        (**self).to_value()
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl ToValue for () {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Null)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(()),
            other => mismatch("null", &other),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! int_conversions {
    ($via:ident: $($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Result<Value> {
                Ok(Value::Int(BigInt::from(*self)))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int(i) => i
                        .$via()
                        .and_then(|n| <$t>::try_from(n).ok())
                        .ok_or(FootprintError::TypeMismatch {
                            expected: stringify!($t),
                            found: "int (out of range)",
                        }),
                    other => mismatch(stringify!($t), &other),
                }
            }
        }
    )*};
}

int_conversions!(to_i128: i8, i16, i32, i64, i128, isize);
int_conversions!(to_u128: u8, u16, u32, u64, u128, usize);

impl ToValue for BigInt {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Int(self.clone()))
    }
}

impl FromValue for BigInt {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(i),
            other => mismatch("int", &other),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(*self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            other => mismatch("float", &other),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for Complex {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Complex(*self))
    }
}

impl FromValue for Complex {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Complex(c) => Ok(c),
            other => mismatch("complex", &other),
        }
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => mismatch("text", &other),
        }
    }
}

impl ToValue for Bytes {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => mismatch("bytes", &other),
        }
    }
}

/// Mutable buffers can change after their footprint was taken.
impl ToValue for BytesMut {
    fn to_value(&self) -> Result<Value> {
        Err(FootprintError::UnsupportedType {
            type_name: "bytes::BytesMut",
            reason: "mutable byte buffers have no stable footprint; freeze into Bytes first"
                .to_string(),
        })
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Result<Value> {
        self.iter()
            .map(ToValue::to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Result<Value> {
        self.as_slice().to_value()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("list", &other),
        }
    }
}

macro_rules! tuple_conversions {
    ($len:expr => $($idx:tt $name:ident),+) => {
        impl<$($name: ToValue),+> ToValue for ($($name,)+) {
            fn to_value(&self) -> Result<Value> {
                Ok(Value::Tuple(vec![$(self.$idx.to_value()?),+]))
            }
        }

        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self> {
                let items = match value {
                    Value::Tuple(items) if items.len() == $len => items,
                    Value::Tuple(_) => {
                        return Err(FootprintError::TypeMismatch {
                            expected: concat!("tuple of ", stringify!($len)),
                            found: "tuple of another arity",
                        })
                    }
                    other => return mismatch("tuple", &other),
                };
                let mut iter = items.into_iter();
                Ok(($(
                    $name::from_value(iter.next().ok_or(FootprintError::TypeMismatch {
                        expected: concat!("tuple of ", stringify!($len)),
                        found: "shorter tuple",
                    })?)?,
                )+))
            }
        }
    };
}

tuple_conversions!(1 => 0 A);
tuple_conversions!(2 => 0 A, 1 B);
tuple_conversions!(3 => 0 A, 1 B, 2 C);
tuple_conversions!(4 => 0 A, 1 B, 2 C, 3 D);
tuple_conversions!(5 => 0 A, 1 B, 2 C, 3 D, 4 E);
tuple_conversions!(6 => 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
tuple_conversions!(7 => 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
tuple_conversions!(8 => 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);

fn pairs_to_value<'a, K, V, I>(pairs: I) -> Result<Value>
where
    K: ToValue + 'a,
    V: ToValue + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    pairs
        .map(|(k, v)| Ok((k.to_value()?, v.to_value()?)))
        .collect::<Result<Vec<_>>>()
        .map(|pairs| Value::Map(Mapping::from_pairs(pairs)))
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Result<Value> {
        pairs_to_value(self.iter())
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .into_pairs()
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => mismatch("map", &other),
        }
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Result<Value> {
        pairs_to_value(self.iter())
    }
}

impl<K, V, S> FromValue for HashMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .into_pairs()
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => mismatch("map", &other),
        }
    }
}

macro_rules! variant_conversions {
    ($($t:ty => $variant:ident, $expected:literal);* $(;)?) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Result<Value> {
                Ok(Value::$variant(self.clone()))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => mismatch($expected, &other),
                }
            }
        }
    )*};
}

variant_conversions!(
    Mapping => Map, "map";
    Record => Record, "record";
    ExtensionValue => Extension, "extension";
    NumericArray => Array, "array";
);

/// Describes an array-library buffer as a [`Value::Array`].
pub fn array_to_value<A: NumericBuffer>(buffer: &A) -> Value {
    Value::Array(buffer.describe())
}

/// Rebuilds an array-library buffer from a decoded [`Value::Array`].
pub fn array_from_value<A: NumericBuffer>(value: Value) -> Result<A> {
    match value {
        Value::Array(array) => A::construct(array),
        other => mismatch("array", &other),
    }
}
