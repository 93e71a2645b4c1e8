use crate::{require, IdDecodeError, SpaceId, WireId};
use bytes::{Buf, BufMut};
use std::fmt;

/// `(space_id, subspace number)`. Subspace 0 always holds exactly the key
/// dimension (spec §3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SubspaceId {
    pub space: SpaceId,
    pub subspace: u16,
}

impl SubspaceId {
    pub const fn new(space: SpaceId, subspace: u16) -> Self {
        SubspaceId { space, subspace }
    }

    /// The key-only subspace, always present for every space.
    pub const fn key_subspace(space: SpaceId) -> Self {
        SubspaceId { space, subspace: 0 }
    }

    pub fn is_key_subspace(&self) -> bool {
        self.subspace == 0
    }
}

impl WireId for SubspaceId {
    const WIRE_SIZE: usize = SpaceId::WIRE_SIZE + 2;

    fn encode(&self, buf: &mut impl BufMut) {
        self.space.encode(buf);
        buf.put_u16(self.subspace);
    }

    fn decode(buf: &mut impl Buf) -> Result<Self, IdDecodeError> {
        let space = SpaceId::decode(buf)?;
        require(buf, 2)?;
        Ok(SubspaceId { space, subspace: buf.get_u16() })
    }
}

impl fmt::Display for SubspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/subspace:{}", self.space, self.subspace)
    }
}
