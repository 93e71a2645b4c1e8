//! The hashing-layer contract (spec §4.A): map a key and its attributes to
//! a primary hash (key only, used for intra-region shard routing and the
//! storage layer's hash-table bucket) and one secondary hash per subspace
//! the space defines (used to pick the region within that subspace).

use crate::encoding::{hash_string, ordered_encode_double, ordered_encode_int64};
use crate::interleave::{interleave_bits, shares};
use hyperdex_datatype::{decode_float, decode_int64, DataType};

/// The per-attribute `enc(v)` the spec's hashing section describes.
/// Aggregate (list/set/map) attributes carry no scalar order and hash to
/// zero, mirroring the original `_hash`'s treatment of non-scalar types.
pub fn attribute_enc(kind: DataType, bytes: &[u8]) -> u64 {
    match kind {
        DataType::String | DataType::MacaroonSecret => hash_string(bytes),
        DataType::Int64 => decode_int64(bytes).map(ordered_encode_int64).unwrap_or(0),
        DataType::Float => decode_float(bytes).map(ordered_encode_double).unwrap_or(0),
        _ => 0,
    }
}

/// The primary hash is just `enc()` of the key by itself: it both doubles
/// as subspace 0's tiling coordinate (subspace 0 is defined by the key
/// attribute alone) and drives shard selection within whatever region a
/// key's subspace-0 coordinate lands in.
pub fn primary_hash(key_kind: DataType, key: &[u8]) -> u64 {
    attribute_enc(key_kind, key)
}

/// The secondary hash for one subspace: the bit-interleave of `enc()` for
/// every attribute the subspace's mask selects, by index into
/// `attr_kinds`/`attr_values`.
pub fn secondary_hash(attr_kinds: &[DataType], attr_values: &[&[u8]], mask: &[usize]) -> u64 {
    let encoded: Vec<u64> = mask
        .iter()
        .map(|&i| attribute_enc(attr_kinds[i], attr_values[i]))
        .collect();
    let shares = shares(encoded.len());
    interleave_bits(&encoded, &shares)
}

/// The full coordinate of a key/value pair: its primary hash plus one
/// secondary hash per subspace `subspace_masks` describes. Pure function of
/// its arguments, as the contract requires — no I/O, no schema lookup.
pub struct Coordinate {
    pub primary_hash: u64,
    pub secondary_hashes: Vec<u64>,
}

pub fn coordinate(
    key_kind: DataType,
    key: &[u8],
    attr_kinds: &[DataType],
    attr_values: &[&[u8]],
    subspace_masks: &[&[usize]],
) -> Coordinate {
    Coordinate {
        primary_hash: primary_hash(key_kind, key),
        secondary_hashes: subspace_masks
            .iter()
            .map(|mask| secondary_hash(attr_kinds, attr_values, mask))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_datatype::{encode_elements, encode_float, encode_int64};

    #[test]
    fn aggregate_attributes_hash_to_zero() {
        let list = encode_elements(&[b"x".to_vec()]);
        assert_eq!(attribute_enc(DataType::ListString, &list), 0);
    }

    #[test]
    fn single_attribute_subspace_is_just_enc() {
        let kinds = [DataType::Int64];
        let value = encode_int64(42);
        let values: Vec<&[u8]> = vec![&value];
        let h = secondary_hash(&kinds, &values, &[0]);
        assert_eq!(h, attribute_enc(DataType::Int64, &value));
    }

    #[test]
    fn coordinate_is_a_pure_function_of_its_inputs() {
        let key = encode_int64(7);
        let a1 = encode_float(1.5);
        let kinds = [DataType::Float];
        let values: Vec<&[u8]> = vec![&a1];
        let masks: Vec<&[usize]> = vec![&[0]];

        let c1 = coordinate(DataType::Int64, &key, &kinds, &values, &masks);
        let c2 = coordinate(DataType::Int64, &key, &kinds, &values, &masks);
        assert_eq!(c1.primary_hash, c2.primary_hash);
        assert_eq!(c1.secondary_hashes, c2.secondary_hashes);
    }

    #[test]
    fn primary_hash_distinguishes_distinct_keys() {
        let k1 = encode_int64(1);
        let k2 = encode_int64(2);
        assert_ne!(
            primary_hash(DataType::Int64, &k1),
            primary_hash(DataType::Int64, &k2)
        );
    }

    #[test]
    fn multi_attribute_secondary_hash_reacts_to_every_attribute() {
        let kinds = [DataType::Int64, DataType::Int64];
        let a = encode_int64(1);
        let b = encode_int64(2);
        let values_ab: Vec<&[u8]> = vec![&a, &b];
        let values_aa: Vec<&[u8]> = vec![&a, &a];
        let mask: &[usize] = &[0, 1];
        assert_ne!(
            secondary_hash(&kinds, &values_ab, mask),
            secondary_hash(&kinds, &values_aa, mask)
        );
    }
}
