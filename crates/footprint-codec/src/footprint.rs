use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

use crate::digest::Digest;

/// Immutable encoded value: the version byte followed by the value body.
///
/// Footprints compare, order and hash by their bytes, so they can be used
/// directly as map keys or cache keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Footprint(Bytes);

impl Footprint {
    /// Wraps encoder output; `bytes` always starts with the version tag.
    pub(crate) fn from_encoded(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }

    /// Version tag the footprint was written with.
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    /// Encoded bytes, version tag included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Shares the underlying buffer.
    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// SHA-256 content digest of the footprint.
    pub fn digest(&self) -> Digest {
        Digest::of_footprint(self)
    }
}

impl Deref for Footprint {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Footprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Footprint> for Bytes {
    fn from(footprint: Footprint) -> Self {
        footprint.0
    }
}

impl fmt::Debug for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Footprint({})", self.to_hex())
    }
}

impl fmt::Display for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
