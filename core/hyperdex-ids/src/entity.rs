use crate::{require, IdDecodeError, RegionId, WireId};
use bytes::{Buf, BufMut};
use std::fmt;

/// A virtual server: one replica of a region, addressed by `(region,
/// replica-index)` (spec §3, the glossary's "Virtual server / entity").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct VirtualServerId {
    pub region: RegionId,
    pub index: u8,
}

impl VirtualServerId {
    pub const fn new(region: RegionId, index: u8) -> Self {
        VirtualServerId { region, index }
    }

    /// The head of this region's chain is always replica index 0.
    pub fn is_head(&self) -> bool {
        self.index == 0
    }

    /// True if this entity is the point leader for its key: the head of
    /// subspace 0 (spec §3, §4.G `is_point_leader`).
    pub fn is_point_leader(&self) -> bool {
        self.region.subspace.is_key_subspace() && self.is_head()
    }
}

impl WireId for VirtualServerId {
    const WIRE_SIZE: usize = RegionId::WIRE_SIZE + 1;

    fn encode(&self, buf: &mut impl BufMut) {
        self.region.encode(buf);
        buf.put_u8(self.index);
    }

    fn decode(buf: &mut impl Buf) -> Result<Self, IdDecodeError> {
        let region = RegionId::decode(buf)?;
        require(buf, 1)?;
        Ok(VirtualServerId { region, index: buf.get_u8() })
    }
}

impl fmt::Display for VirtualServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/replica:{}", self.region, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SpaceId, SubspaceId};

    fn region() -> RegionId {
        RegionId::new(SubspaceId::new(SpaceId::new(9), 1), 2, 1 << 62)
    }

    #[test]
    fn round_trips_through_wire_bytes() {
        let id = VirtualServerId::new(region(), 2);
        let bytes = id.to_bytes();
        assert_eq!(VirtualServerId::from_slice(&bytes).unwrap(), id);
    }

    #[test]
    fn point_leader_is_head_of_key_subspace_only() {
        let key_head = VirtualServerId::new(
            RegionId::new(SubspaceId::key_subspace(SpaceId::new(1)), 0, 0),
            0,
        );
        assert!(key_head.is_point_leader());

        let key_tail = VirtualServerId::new(key_head.region, 1);
        assert!(!key_tail.is_point_leader());

        let other_subspace_head = VirtualServerId::new(region(), 0);
        assert!(!other_subspace_head.is_point_leader());
    }
}
