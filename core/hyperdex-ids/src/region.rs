use crate::{require, IdDecodeError, SpaceId, SubspaceId, WireId};
use bytes::{Buf, BufMut};
use std::fmt;

/// `(subspace_id, prefix_length <= 64, 64-bit hash prefix)` — a region is a
/// prefix of the interleaved-hash point space within a subspace (spec §3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct RegionId {
    pub subspace: SubspaceId,
    pub prefix_len: u8,
    pub prefix: u64,
}

impl RegionId {
    pub fn new(subspace: SubspaceId, prefix_len: u8, prefix: u64) -> Self {
        assert!(prefix_len <= 64, "prefix_len must be <= 64 bits");
        let mask = Self::mask_for(prefix_len);
        RegionId { subspace, prefix_len, prefix: prefix & mask }
    }

    pub const fn space(&self) -> SpaceId {
        self.subspace.space
    }

    /// Mask with the top `prefix_len` bits set, matching the convention used
    /// by `point & prefix_mask == region.prefix` (spec §4.A).
    pub fn mask_for(prefix_len: u8) -> u64 {
        if prefix_len == 0 {
            0
        } else if prefix_len >= 64 {
            u64::MAX
        } else {
            u64::MAX << (64 - prefix_len)
        }
    }

    pub fn prefix_mask(&self) -> u64 {
        Self::mask_for(self.prefix_len)
    }

    /// Does `point` lie within this region's slice of the hyperspace?
    pub fn contains(&self, point: u64) -> bool {
        point & self.prefix_mask() == self.prefix
    }

    /// Split this region's prefix into two children one bit deeper, covering
    /// the same span with no gap or overlap (used when a region's chain is
    /// retiled, mirroring `hyperdisk`'s coordinate-splitting tests).
    pub fn split(&self) -> (RegionId, RegionId) {
        assert!(self.prefix_len < 64, "cannot split a full-width region");
        let child_len = self.prefix_len + 1;
        let bit = 1u64 << (64 - child_len);
        (
            RegionId::new(self.subspace, child_len, self.prefix),
            RegionId::new(self.subspace, child_len, self.prefix | bit),
        )
    }
}

impl WireId for RegionId {
    const WIRE_SIZE: usize = SubspaceId::WIRE_SIZE + 1 + 8;

    fn encode(&self, buf: &mut impl BufMut) {
        self.subspace.encode(buf);
        buf.put_u8(self.prefix_len);
        buf.put_u64(self.prefix);
    }

    fn decode(buf: &mut impl Buf) -> Result<Self, IdDecodeError> {
        let subspace = SubspaceId::decode(buf)?;
        require(buf, 9)?;
        let prefix_len = buf.get_u8();
        let prefix = buf.get_u64();
        Ok(RegionId { subspace, prefix_len, prefix })
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/region:{:x}/{}", self.subspace, self.prefix, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpaceId;

    fn ss() -> SubspaceId {
        SubspaceId::new(SpaceId::new(1), 0)
    }

    #[test]
    fn round_trips_through_wire_bytes() {
        let id = RegionId::new(ss(), 4, 0xF000_0000_0000_0000);
        let bytes = id.to_bytes();
        assert_eq!(RegionId::from_slice(&bytes).unwrap(), id);
    }

    #[test]
    fn zero_prefix_len_covers_entire_space() {
        let id = RegionId::new(ss(), 0, 0xffff_ffff_ffff_ffff);
        assert_eq!(id.prefix, 0);
        assert!(id.contains(0));
        assert!(id.contains(u64::MAX));
    }

    #[test]
    fn split_children_tile_the_parent_exactly() {
        let parent = RegionId::new(ss(), 2, 0b01 << 62);
        let (lo, hi) = parent.split();
        assert_eq!(lo.prefix_len, 3);
        assert_eq!(hi.prefix_len, 3);
        assert_ne!(lo.prefix, hi.prefix);
        // Every point the parent covers is covered by exactly one child.
        for point in [parent.prefix, parent.prefix | (1u64 << 61), u64::MAX] {
            if parent.contains(point) {
                assert!(lo.contains(point) ^ hi.contains(point));
            }
        }
    }

    #[test]
    fn mask_for_matches_prefix_len() {
        assert_eq!(RegionId::mask_for(0), 0);
        assert_eq!(RegionId::mask_for(64), u64::MAX);
        assert_eq!(RegionId::mask_for(1), 1u64 << 63);
    }
}
