//! Dense numeric buffers treated as opaque `(dtype, shape, bytes)` triples.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{FootprintError, Result};
use crate::value::Complex;

/// Element type of a numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DType {
    /// One byte per element, 0 or 1.
    Bool = 0x01,
    /// Signed 8-bit integer.
    I8 = 0x02,
    /// Signed 16-bit integer.
    I16 = 0x03,
    /// Signed 32-bit integer.
    I32 = 0x04,
    /// Signed 64-bit integer.
    I64 = 0x05,
    /// Unsigned 8-bit integer.
    U8 = 0x06,
    /// Unsigned 16-bit integer.
    U16 = 0x07,
    /// Unsigned 32-bit integer.
    U32 = 0x08,
    /// Unsigned 64-bit integer.
    U64 = 0x09,
    /// IEEE-754 binary32.
    F32 = 0x0A,
    /// IEEE-754 binary64.
    F64 = 0x0B,
    /// Complex of two binary32.
    C64 = 0x0C,
    /// Complex of two binary64.
    C128 = 0x0D,
}

impl DType {
    /// Wire tag for this dtype.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parses a wire tag.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => DType::Bool,
            0x02 => DType::I8,
            0x03 => DType::I16,
            0x04 => DType::I32,
            0x05 => DType::I64,
            0x06 => DType::U8,
            0x07 => DType::U16,
            0x08 => DType::U32,
            0x09 => DType::U64,
            0x0A => DType::F32,
            0x0B => DType::F64,
            0x0C => DType::C64,
            0x0D => DType::C128,
            _ => return None,
        })
    }

    /// Size of one element in bytes.
    pub fn itemsize(self) -> usize {
        match self {
            DType::Bool | DType::I8 | DType::U8 => 1,
            DType::I16 | DType::U16 => 2,
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 | DType::C64 => 8,
            DType::C128 => 16,
        }
    }

    /// Array-protocol label, e.g. `<f8`.
    pub fn label(self) -> &'static str {
        match self {
            DType::Bool => "|b1",
            DType::I8 => "|i1",
            DType::I16 => "<i2",
            DType::I32 => "<i4",
            DType::I64 => "<i8",
            DType::U8 => "|u1",
            DType::U16 => "<u2",
            DType::U32 => "<u4",
            DType::U64 => "<u8",
            DType::F32 => "<f4",
            DType::F64 => "<f8",
            DType::C64 => "<c8",
            DType::C128 => "<c16",
        }
    }

    /// Parses an array-protocol label produced by [`DType::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        [
            DType::Bool,
            DType::I8,
            DType::I16,
            DType::I32,
            DType::I64,
            DType::U8,
            DType::U16,
            DType::U32,
            DType::U64,
            DType::F32,
            DType::F64,
            DType::C64,
            DType::C128,
        ]
        .into_iter()
        .find(|d| d.label() == label)
    }
}

/// Row-major numeric buffer with little-endian elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericArray {
    dtype: DType,
    shape: Vec<u64>,
    data: Bytes,
}

impl NumericArray {
    /// Builds an array, checking that `data` holds exactly `product(shape)` elements.
    pub fn new(dtype: DType, shape: Vec<u64>, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        let expected = expected_len(dtype, &shape).ok_or_else(|| {
            FootprintError::InvalidArray(format!("shape {:?} overflows the address space", shape))
        })?;
        if expected != data.len() {
            return Err(FootprintError::InvalidArray(format!(
                "{} bytes for shape {:?} of {}, expected {}",
                data.len(),
                shape,
                dtype.label(),
                expected
            )));
        }
        Ok(Self { dtype, shape, data })
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimension sizes.
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Raw element bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.itemsize()
    }

    /// Returns `true` when the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Builds an `f64` array.
    pub fn from_f64(shape: Vec<u64>, values: &[f64]) -> Result<Self> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(DType::F64, shape, data)
    }

    /// Builds an `i64` array.
    pub fn from_i64(shape: Vec<u64>, values: &[i64]) -> Result<Self> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(DType::I64, shape, data)
    }

    /// Builds a `complex128` array.
    pub fn from_complex(shape: Vec<u64>, values: &[Complex]) -> Result<Self> {
        let data: Vec<u8> = values
            .iter()
            .flat_map(|c| c.re.to_le_bytes().into_iter().chain(c.im.to_le_bytes()))
            .collect();
        Self::new(DType::C128, shape, data)
    }

    /// Reads elements of an `f64` array.
    pub fn to_f64(&self) -> Result<Vec<f64>> {
        self.expect_dtype(DType::F64)?;
        Ok(self
            .data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(to_array(c)))
            .collect())
    }

    /// Reads elements of an `i64` array.
    pub fn to_i64(&self) -> Result<Vec<i64>> {
        self.expect_dtype(DType::I64)?;
        Ok(self
            .data
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(to_array(c)))
            .collect())
    }

    /// Reads elements of a `complex128` array.
    pub fn to_complex(&self) -> Result<Vec<Complex>> {
        self.expect_dtype(DType::C128)?;
        Ok(self
            .data
            .chunks_exact(16)
            .map(|c| Complex {
                re: f64::from_le_bytes(to_array(&c[..8])),
                im: f64::from_le_bytes(to_array(&c[8..])),
            })
            .collect())
    }

    fn expect_dtype(&self, dtype: DType) -> Result<()> {
        if self.dtype != dtype {
            return Err(FootprintError::InvalidArray(format!(
                "array holds {}, not {}",
                self.dtype.label(),
                dtype.label()
            )));
        }
        Ok(())
    }
}

/// Byte length implied by `dtype` and `shape`, `None` on overflow. Any zero
/// dimension makes the array empty whatever the others are.
pub(crate) fn expected_len(dtype: DType, shape: &[u64]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape
        .iter()
        .try_fold(dtype.itemsize() as u64, |acc, dim| acc.checked_mul(*dim))
        .and_then(|n| usize::try_from(n).ok())
}

fn to_array(chunk: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    buf
}

/// Collaborator interface for array libraries.
///
/// Implementors describe themselves as a [`NumericArray`] for encoding and
/// are rebuilt from one on decode.
pub trait NumericBuffer: Sized {
    /// Captures element type, shape and row-major bytes.
    fn describe(&self) -> NumericArray;

    /// Rebuilds the buffer from a decoded description.
    fn construct(array: NumericArray) -> Result<Self>;
}

impl NumericBuffer for NumericArray {
    fn describe(&self) -> NumericArray {
        self.clone()
    }

    fn construct(array: NumericArray) -> Result<Self> {
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_byte_length_mismatch() {
        let err = NumericArray::new(DType::F64, vec![2, 2], vec![0u8; 24]).unwrap_err();
        assert!(matches!(err, FootprintError::InvalidArray(_)));
    }

    #[test]
    fn zero_dimensional_array_holds_one_element() {
        let scalar = NumericArray::from_f64(vec![], &[2.5]).unwrap();
        assert_eq!(scalar.len(), 1);
        assert_eq!(scalar.to_f64().unwrap(), vec![2.5]);
    }

    #[test]
    fn zero_dimension_wins_over_overflowing_ones() {
        let empty = NumericArray::new(DType::F64, vec![u64::MAX, 0], Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(expected_len(DType::F64, &[0, u64::MAX, u64::MAX]), Some(0));
        assert_eq!(expected_len(DType::F64, &[u64::MAX, 2]), None);

        let value = crate::Value::Array(empty);
        let decoded = crate::decode(&crate::encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn complex_elements_round_trip() {
        let values = [Complex { re: 0.0, im: 2.0 }, Complex { re: 0.0, im: 3.0 }];
        let array = NumericArray::from_complex(vec![2], &values).unwrap();
        assert_eq!(array.dtype().itemsize(), 16);
        assert_eq!(array.to_complex().unwrap(), values.to_vec());
        assert!(array.to_f64().is_err());
    }

    #[test]
    fn dtype_tags_and_labels_are_bijective() {
        for byte in 0x01..=0x0D {
            let dtype = DType::from_byte(byte).unwrap();
            assert_eq!(dtype.to_byte(), byte);
            assert_eq!(DType::from_label(dtype.label()), Some(dtype));
        }
        assert_eq!(DType::from_byte(0x00), None);
        assert_eq!(DType::from_byte(0x0E), None);
    }
}
