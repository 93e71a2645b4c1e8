//! The append-only data-segment record format (spec §4.C): a version, the
//! routing hashes, the key, and the attribute value vector, each
//! length-prefixed. Grounded on `disk.cc`'s `put`/`get` bodies, which lay
//! out records the same way (`version`, `key_size`+key, `num_values`, then
//! `size`+bytes per value).
//!
//! **(SUPPLEMENT)** `disk.cc`'s record carries no hash fields because its
//! `disk` class computes a key's hash itself on every call. This crate
//! keeps hashing out of the storage layer entirely (spec §4.C's contract
//! is bytes-and-offsets, not hashing), so `put` takes the caller's already
//! computed `key_hash`/`search_hash` and persists them in the record. That
//! lets compaction and transfer re-derive both from a snapshot alone,
//! without hyperdex-store depending on hyperdex-hash.

use hyperdex_error::StoreError;
use hyperdex_ids::Version;

const FIXED_PREFIX: usize = 8 + 8 + 4 + 4; // version, key_hash, search_hash, key_size

pub fn encoded_len(key: &[u8], values: &[Vec<u8>]) -> usize {
    FIXED_PREFIX + key.len() + 2 + values.iter().map(|v| 4 + v.len()).sum::<usize>()
}

pub fn encode(version: Version, key_hash: u64, search_hash: u32, key: &[u8], values: &[Vec<u8>], out: &mut [u8]) {
    let mut w = 0;
    out[w..w + 8].copy_from_slice(&version.0.to_be_bytes());
    w += 8;
    out[w..w + 8].copy_from_slice(&key_hash.to_be_bytes());
    w += 8;
    out[w..w + 4].copy_from_slice(&search_hash.to_be_bytes());
    w += 4;
    out[w..w + 4].copy_from_slice(&(key.len() as u32).to_be_bytes());
    w += 4;
    out[w..w + key.len()].copy_from_slice(key);
    w += key.len();
    out[w..w + 2].copy_from_slice(&(values.len() as u16).to_be_bytes());
    w += 2;
    for value in values {
        out[w..w + 4].copy_from_slice(&(value.len() as u32).to_be_bytes());
        w += 4;
        out[w..w + value.len()].copy_from_slice(value);
        w += value.len();
    }
}

/// A record's key length, read without touching the rest of the bytes —
/// used by bucket lookup to compare a candidate key without parsing the
/// whole record.
pub fn peek_key_len(bytes: &[u8]) -> Result<u32, StoreError> {
    if bytes.len() < FIXED_PREFIX {
        return Err(StoreError::NotFound);
    }
    Ok(u32::from_be_bytes(bytes[20..24].try_into().unwrap()))
}

pub fn peek_key(bytes: &[u8], key_len: u32) -> &[u8] {
    &bytes[FIXED_PREFIX..FIXED_PREFIX + key_len as usize]
}

pub struct Decoded {
    pub version: Version,
    pub key_hash: u64,
    pub search_hash: u32,
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
    pub len: usize,
}

pub fn decode(bytes: &[u8]) -> Result<Decoded, StoreError> {
    if bytes.len() < FIXED_PREFIX + 2 {
        return Err(StoreError::NotFound);
    }
    let version = Version(u64::from_be_bytes(bytes[0..8].try_into().unwrap()));
    let key_hash = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
    let search_hash = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let key_len = u32::from_be_bytes(bytes[20..24].try_into().unwrap()) as usize;
    let mut r = FIXED_PREFIX;
    if bytes.len() < r + key_len + 2 {
        return Err(StoreError::NotFound);
    }
    let key = bytes[r..r + key_len].to_vec();
    r += key_len;
    let num_values = u16::from_be_bytes(bytes[r..r + 2].try_into().unwrap()) as usize;
    r += 2;
    let mut values = Vec::with_capacity(num_values);
    for _ in 0..num_values {
        if bytes.len() < r + 4 {
            return Err(StoreError::NotFound);
        }
        let value_len = u32::from_be_bytes(bytes[r..r + 4].try_into().unwrap()) as usize;
        r += 4;
        if bytes.len() < r + value_len {
            return Err(StoreError::NotFound);
        }
        values.push(bytes[r..r + value_len].to_vec());
        r += value_len;
    }
    Ok(Decoded { version, key_hash, search_hash, key, values, len: r })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_record() {
        let key = b"widget-1".to_vec();
        let values = vec![b"red".to_vec(), b"".to_vec(), b"12345".to_vec()];
        let len = encoded_len(&key, &values);
        let mut buf = vec![0u8; len];
        encode(Version(7), 0xdead_beef_0000_0001, 99, &key, &values, &mut buf);
        let decoded = decode(&buf).unwrap();
        assert_eq!(decoded.version, Version(7));
        assert_eq!(decoded.key_hash, 0xdead_beef_0000_0001);
        assert_eq!(decoded.search_hash, 99);
        assert_eq!(decoded.key, key);
        assert_eq!(decoded.values, values);
        assert_eq!(decoded.len, len);
    }

    #[test]
    fn peek_key_matches_decoded_key() {
        let key = b"a-longer-key".to_vec();
        let values = vec![b"v".to_vec()];
        let len = encoded_len(&key, &values);
        let mut buf = vec![0u8; len];
        encode(Version(1), 7, 1, &key, &values, &mut buf);
        let key_len = peek_key_len(&buf).unwrap();
        assert_eq!(peek_key(&buf, key_len), key.as_slice());
    }
}
