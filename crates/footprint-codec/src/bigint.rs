//! Wire form of arbitrary-precision integers.
//!
//! On the wire an integer is a sign byte plus a minimal big-endian magnitude.
//! Zero is the empty magnitude with a non-negative sign, so equal integers
//! always share one encoding.

use num_bigint::{BigInt, Sign};

/// Splits `value` into its sign and minimal big-endian magnitude.
pub fn to_sign_magnitude(value: &BigInt) -> (bool, Vec<u8>) {
    match value.to_bytes_be() {
        (Sign::NoSign, _) => (false, Vec::new()),
        (Sign::Minus, magnitude) => (true, magnitude),
        (Sign::Plus, magnitude) => (false, magnitude),
    }
}

/// Rebuilds an integer from a sign and big-endian magnitude. Leading zeros
/// and negative zero normalize away.
pub fn from_sign_magnitude(negative: bool, magnitude: &[u8]) -> BigInt {
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    BigInt::from_bytes_be(sign, magnitude)
}
