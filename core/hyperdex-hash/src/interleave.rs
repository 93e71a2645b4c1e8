//! Bit-interleaving of a subspace's per-attribute encodings into a single
//! 64-bit secondary-hash coordinate (spec §4.A). Bit 0 of each attribute
//! lands in consecutive low-order output positions, bit 1 next, and so on,
//! so the coordinate's high-order bits — the ones `RegionId`'s prefix mask
//! tests — are built from each attribute's high-order, most-significant
//! bits.

/// Splits 64 bits as evenly as possible across `k` attributes: the first
/// `64 % k` of them get one extra bit. For `k <= 6` this divides evenly or
/// nearly so; for `k > 6` it's the approximation the spec calls for.
pub fn shares(k: usize) -> Vec<u8> {
    assert!(k > 0, "a subspace must select at least one attribute");
    assert!(k <= 64, "cannot interleave more than 64 attributes");
    let base = (64 / k) as u8;
    let remainder = 64 % k;
    (0..k)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Interleaves `values[j]`'s lowest `shares[j]` bits, round-robin from bit
/// 0 up. `values.len() == shares.len()` and `shares.iter().sum() == 64`.
pub fn interleave_bits(values: &[u64], shares: &[u8]) -> u64 {
    assert_eq!(values.len(), shares.len());
    debug_assert_eq!(shares.iter().map(|&s| s as u32).sum::<u32>(), 64);

    let truncated: Vec<u64> = values
        .iter()
        .zip(shares)
        .map(|(&v, &s)| if s == 64 { v } else { v >> (64 - s as u32) })
        .collect();

    let max_share = shares.iter().copied().max().unwrap_or(0);
    let mut out: u64 = 0;
    let mut pos: u32 = 0;
    for round in 0..max_share {
        for (j, &s) in shares.iter().enumerate() {
            if round < s {
                let bit = (truncated[j] >> round) & 1;
                out |= bit << pos;
                pos += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_sum_to_64() {
        for k in 1..=20 {
            let s = shares(k);
            assert_eq!(s.len(), k);
            assert_eq!(s.iter().map(|&x| x as u32).sum::<u32>(), 64);
        }
    }

    #[test]
    fn shares_are_as_even_as_possible() {
        let s = shares(3);
        let max = *s.iter().max().unwrap();
        let min = *s.iter().min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn single_attribute_interleave_is_identity() {
        let s = shares(1);
        assert_eq!(interleave_bits(&[0x0123_4567_89ab_cdef], &s), 0x0123_4567_89ab_cdef);
    }

    #[test]
    fn interleave_is_deterministic_and_distinguishes_inputs() {
        let s = shares(2);
        let a = interleave_bits(&[1, 0], &s);
        let b = interleave_bits(&[0, 1], &s);
        assert_ne!(a, b);
        assert_eq!(interleave_bits(&[1, 0], &s), a);
    }

    #[test]
    fn high_output_bits_track_high_input_bits() {
        // With two attributes sharing 32 bits each, an attribute's top bit
        // set should push the combined coordinate into the top half.
        let s = shares(2);
        let high_a = interleave_bits(&[1u64 << 63, 0], &s);
        let high_b = interleave_bits(&[0, 0], &s);
        assert!(high_a > high_b);
    }
}
