//! Canonical emission order for mappings.
//!
//! Each key is encoded on its own with current-generation rules and no
//! version byte; pairs are then sorted by those bytes. Keys whose encodings
//! coincide are duplicates and collapse to the pair supplied last.

use crate::encoder::write_body;
use crate::errors::Result;
use crate::value::{Mapping, Value};
use crate::version::Generation;

/// A mapping pair together with the bytes it is ordered by.
#[derive(Debug)]
pub struct OrderedPair<'a> {
    /// Current-generation encoding of the key.
    pub key_bytes: Vec<u8>,
    /// The key.
    pub key: &'a Value,
    /// The value.
    pub value: &'a Value,
}

/// Returns the pairs of `map` in canonical order, duplicates removed.
pub fn canonical_order(map: &Mapping) -> Result<Vec<OrderedPair<'_>>> {
    let pairs = map.as_pairs();
    let mut key_bytes = pairs
        .iter()
        .map(|(key, _)| key_bytes(key))
        .collect::<Result<Vec<_>>>()?;
    Ok(canonical_indices(&key_bytes)
        .into_iter()
        .map(|idx| OrderedPair {
            key_bytes: std::mem::take(&mut key_bytes[idx]),
            key: &pairs[idx].0,
            value: &pairs[idx].1,
        })
        .collect())
}

/// Current-generation encoding of `key`, the bytes mappings match and sort
/// keys by.
pub fn key_bytes(key: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_body(key, Generation::Current, &mut out)?;
    Ok(out)
}

/// Indices of the surviving pairs in emission order: sorted by key bytes,
/// and among equal keys only the one supplied last.
pub(crate) fn canonical_indices(key_bytes: &[Vec<u8>]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..key_bytes.len()).collect();
    // Stable: among equal keys, supplied order survives the sort.
    indices.sort_by(|a, b| key_bytes[*a].cmp(&key_bytes[*b]));

    let mut ordered: Vec<usize> = Vec::with_capacity(indices.len());
    for idx in indices {
        match ordered.last_mut() {
            Some(last) if key_bytes[*last] == key_bytes[idx] => *last = idx,
            _ => ordered.push(idx),
        }
    }
    ordered
}

/// Returns `true` when `keys` are strictly ascending (sorted, no duplicates).
pub(crate) fn is_strictly_ascending(keys: &[Vec<u8>]) -> bool {
    keys.windows(2).all(|w| w[0] < w[1])
}
