//! Wire encoding for list/set/map attributes: a length-prefixed sequence of
//! elements (or key/value pairs), mirroring the shard's own convention of
//! "32-bit size, bytes" framing for attribute values (spec §3).
//!
//! Sets and maps additionally preserve sorted order on their underlying
//! representation (spec §4.B): `validate_set`/`validate_map` reject a
//! buffer whose elements are not strictly increasing, and every mutation
//! helper here re-establishes that invariant rather than assuming it.

use crate::compare::compare;
use crate::kind::DataType;

pub fn encode_elements(elems: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(elems.len() as u32).to_le_bytes());
    for e in elems {
        out.extend_from_slice(&(e.len() as u32).to_le_bytes());
        out.extend_from_slice(e);
    }
    out
}

pub fn decode_elements(bytes: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut cursor = bytes;
    let count = take_u32(&mut cursor)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let len = take_u32(&mut cursor)? as usize;
        if cursor.len() < len {
            return None;
        }
        out.push(cursor[..len].to_vec());
        cursor = &cursor[len..];
    }
    if cursor.is_empty() {
        Some(out)
    } else {
        None
    }
}

pub fn encode_pairs(pairs: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
    for (k, v) in pairs {
        out.extend_from_slice(&(k.len() as u32).to_le_bytes());
        out.extend_from_slice(k);
        out.extend_from_slice(&(v.len() as u32).to_le_bytes());
        out.extend_from_slice(v);
    }
    out
}

pub fn decode_pairs(bytes: &[u8]) -> Option<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut cursor = bytes;
    let count = take_u32(&mut cursor)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let klen = take_u32(&mut cursor)? as usize;
        if cursor.len() < klen {
            return None;
        }
        let k = cursor[..klen].to_vec();
        cursor = &cursor[klen..];
        let vlen = take_u32(&mut cursor)? as usize;
        if cursor.len() < vlen {
            return None;
        }
        let v = cursor[..vlen].to_vec();
        cursor = &cursor[vlen..];
        out.push((k, v));
    }
    if cursor.is_empty() {
        Some(out)
    } else {
        None
    }
}

fn take_u32(cursor: &mut &[u8]) -> Option<u32> {
    if cursor.len() < 4 {
        return None;
    }
    let (head, tail) = cursor.split_at(4);
    *cursor = tail;
    Some(u32::from_le_bytes(head.try_into().ok()?))
}

pub fn validate_list(bytes: &[u8], elem_kind: DataType) -> bool {
    match decode_elements(bytes) {
        Some(elems) => elems.iter().all(|e| crate::validate::validate(elem_kind, e)),
        None => false,
    }
}

pub fn validate_set(bytes: &[u8], elem_kind: DataType) -> bool {
    match decode_elements(bytes) {
        Some(elems) => {
            elems.iter().all(|e| crate::validate::validate(elem_kind, e))
                && is_strictly_sorted(&elems, elem_kind)
        }
        None => false,
    }
}

pub fn validate_map(bytes: &[u8], key_kind: DataType, val_kind: DataType) -> bool {
    match decode_pairs(bytes) {
        Some(pairs) => {
            pairs.iter().all(|(k, v)| {
                crate::validate::validate(key_kind, k) && crate::validate::validate(val_kind, v)
            }) && is_strictly_sorted_keys(&pairs, key_kind)
        }
        None => false,
    }
}

fn is_strictly_sorted(elems: &[Vec<u8>], kind: DataType) -> bool {
    elems.windows(2).all(|w| compare(kind, &w[0], &w[1]) == std::cmp::Ordering::Less)
}

fn is_strictly_sorted_keys(pairs: &[(Vec<u8>, Vec<u8>)], kind: DataType) -> bool {
    pairs.windows(2).all(|w| compare(kind, &w[0].0, &w[1].0) == std::cmp::Ordering::Less)
}

pub fn compare_list(lhs: &[u8], rhs: &[u8], elem_kind: DataType) -> std::cmp::Ordering {
    let l = decode_elements(lhs).unwrap_or_default();
    let r = decode_elements(rhs).unwrap_or_default();
    for (a, b) in l.iter().zip(r.iter()) {
        let ord = compare(elem_kind, a, b);
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    l.len().cmp(&r.len())
}

pub fn compare_map(lhs: &[u8], rhs: &[u8], key_kind: DataType, val_kind: DataType) -> std::cmp::Ordering {
    let l = decode_pairs(lhs).unwrap_or_default();
    let r = decode_pairs(rhs).unwrap_or_default();
    for (a, b) in l.iter().zip(r.iter()) {
        let ord = compare(key_kind, &a.0, &b.0);
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
        let ord = compare(val_kind, &a.1, &b.1);
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    l.len().cmp(&r.len())
}

fn sorted_insert(elems: &mut Vec<Vec<u8>>, elem: Vec<u8>, kind: DataType) {
    match elems.binary_search_by(|probe| compare(kind, probe, &elem)) {
        Ok(_) => {} // already present; SET_ADD is idempotent
        Err(idx) => elems.insert(idx, elem),
    }
}

fn sorted_remove(elems: &mut Vec<Vec<u8>>, elem: &[u8], kind: DataType) {
    if let Ok(idx) = elems.binary_search_by(|probe| compare(kind, probe, elem)) {
        elems.remove(idx);
    }
}

pub fn set_add(old: &[u8], elem: Vec<u8>, kind: DataType) -> Option<Vec<u8>> {
    let mut elems = decode_elements(old)?;
    sorted_insert(&mut elems, elem, kind);
    Some(encode_elements(&elems))
}

pub fn set_remove(old: &[u8], elem: &[u8], kind: DataType) -> Option<Vec<u8>> {
    let mut elems = decode_elements(old)?;
    sorted_remove(&mut elems, elem, kind);
    Some(encode_elements(&elems))
}

/// `arg` must itself be a sorted-set serialization (spec §4.B).
pub fn set_union(old: &[u8], arg: &[u8], kind: DataType) -> Option<Vec<u8>> {
    let mut elems = decode_elements(old)?;
    for e in decode_elements(arg)? {
        sorted_insert(&mut elems, e, kind);
    }
    Some(encode_elements(&elems))
}

pub fn set_intersect(old: &[u8], arg: &[u8], kind: DataType) -> Option<Vec<u8>> {
    let elems = decode_elements(old)?;
    let other = decode_elements(arg)?;
    let kept: Vec<Vec<u8>> = elems
        .into_iter()
        .filter(|e| other.binary_search_by(|probe| compare(kind, probe, e)).is_ok())
        .collect();
    Some(encode_elements(&kept))
}

pub fn map_add(old: &[u8], key: Vec<u8>, val: Vec<u8>, key_kind: DataType) -> Option<Vec<u8>> {
    let mut pairs = decode_pairs(old)?;
    match pairs.binary_search_by(|probe| compare(key_kind, &probe.0, &key)) {
        Ok(idx) => pairs[idx].1 = val,
        Err(idx) => pairs.insert(idx, (key, val)),
    }
    Some(encode_pairs(&pairs))
}

pub fn map_remove(old: &[u8], key: &[u8], key_kind: DataType) -> Option<Vec<u8>> {
    let mut pairs = decode_pairs(old)?;
    if let Ok(idx) = pairs.binary_search_by(|probe| compare(key_kind, &probe.0, key)) {
        pairs.remove(idx);
    }
    Some(encode_pairs(&pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataType;

    #[test]
    fn element_round_trip() {
        let elems = vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()];
        let encoded = encode_elements(&elems);
        assert_eq!(decode_elements(&encoded).unwrap(), elems);
    }

    #[test]
    fn set_add_keeps_sorted_and_unique() {
        let empty = encode_elements(&[]);
        let s = set_add(&empty, b"b".to_vec(), DataType::String).unwrap();
        let s = set_add(&s, b"a".to_vec(), DataType::String).unwrap();
        let s = set_add(&s, b"a".to_vec(), DataType::String).unwrap();
        assert_eq!(decode_elements(&s).unwrap(), vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn set_intersect_and_union() {
        let a = encode_elements(&[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        let b = encode_elements(&[b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
        let inter = set_intersect(&a, &b, DataType::String).unwrap();
        assert_eq!(decode_elements(&inter).unwrap(), vec![b"b".to_vec(), b"c".to_vec()]);
        let union = set_union(&a, &b, DataType::String).unwrap();
        assert_eq!(
            decode_elements(&union).unwrap(),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
        );
    }

    #[test]
    fn map_add_replaces_existing_key() {
        let empty = encode_pairs(&[]);
        let m = map_add(&empty, b"k".to_vec(), b"v1".to_vec(), DataType::String).unwrap();
        let m = map_add(&m, b"k".to_vec(), b"v2".to_vec(), DataType::String).unwrap();
        assert_eq!(decode_pairs(&m).unwrap(), vec![(b"k".to_vec(), b"v2".to_vec())]);
    }

    #[test]
    fn validate_set_rejects_unsorted_or_duplicate() {
        let sorted = encode_elements(&[b"a".to_vec(), b"b".to_vec()]);
        assert!(validate_set(&sorted, DataType::String));
        let unsorted = encode_elements(&[b"b".to_vec(), b"a".to_vec()]);
        assert!(!validate_set(&unsorted, DataType::String));
        let dup = encode_elements(&[b"a".to_vec(), b"a".to_vec()]);
        assert!(!validate_set(&dup, DataType::String));
    }
}
