//! Scalar encodings. Integers and floats are stored little-endian in their
//! 8-byte IEEE-754/two's-complement form, matching the original's
//! `e::pack64le`/`e::unpackdoublele` value representation; this is distinct
//! from the big-endian order-preserving encoding `hyperdex-hash` computes
//! purely for hashing/range comparison.

pub fn validate_int64(bytes: &[u8]) -> bool {
    bytes.len() == 8
}

pub fn validate_float(bytes: &[u8]) -> bool {
    bytes.len() == 8
}

pub fn validate_string(_bytes: &[u8]) -> bool {
    true
}

pub fn decode_int64(bytes: &[u8]) -> Option<i64> {
    Some(i64::from_le_bytes(bytes.try_into().ok()?))
}

pub fn encode_int64(v: i64) -> Vec<u8> {
    v.to_le_bytes().to_vec()
}

pub fn decode_float(bytes: &[u8]) -> Option<f64> {
    Some(f64::from_le_bytes(bytes.try_into().ok()?))
}

pub fn encode_float(v: f64) -> Vec<u8> {
    v.to_le_bytes().to_vec()
}

pub fn compare_string(lhs: &[u8], rhs: &[u8]) -> std::cmp::Ordering {
    lhs.cmp(rhs)
}

pub fn compare_int64(lhs: &[u8], rhs: &[u8]) -> std::cmp::Ordering {
    let l = decode_int64(lhs).unwrap_or(0);
    let r = decode_int64(rhs).unwrap_or(0);
    l.cmp(&r)
}

/// Floats compare with IEEE total ordering via `f64::total_cmp`, which (like
/// the original's `ordered_encode_double`) places NaN deterministically
/// rather than making it incomparable.
pub fn compare_float(lhs: &[u8], rhs: &[u8]) -> std::cmp::Ordering {
    let l = decode_float(lhs).unwrap_or(0.0);
    let r = decode_float(rhs).unwrap_or(0.0);
    l.total_cmp(&r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_round_trips() {
        for v in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(decode_int64(&encode_int64(v)), Some(v));
        }
    }

    #[test]
    fn float_round_trips() {
        for v in [f64::MIN, -1.5, 0.0, 1.5, f64::MAX] {
            assert_eq!(decode_float(&encode_float(v)), Some(v));
        }
    }

    #[test]
    fn compare_int64_matches_native_order() {
        assert_eq!(compare_int64(&encode_int64(1), &encode_int64(2)), std::cmp::Ordering::Less);
        assert_eq!(compare_int64(&encode_int64(-5), &encode_int64(-5)), std::cmp::Ordering::Equal);
    }
}
