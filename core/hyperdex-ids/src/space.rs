use crate::{require, IdDecodeError, WireId};
use bytes::{Buf, BufMut};
use std::fmt;

/// A 32-bit space identifier (spec §3: "a `space_id` is a 32-bit integer").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SpaceId(pub u32);

impl SpaceId {
    pub const fn new(id: u32) -> Self {
        SpaceId(id)
    }
}

impl WireId for SpaceId {
    const WIRE_SIZE: usize = 4;

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.0);
    }

    fn decode(buf: &mut impl Buf) -> Result<Self, IdDecodeError> {
        require(buf, Self::WIRE_SIZE)?;
        Ok(SpaceId(buf.get_u32()))
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "space:{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_bytes() {
        let id = SpaceId::new(0xdead_beef);
        let bytes = id.to_bytes();
        assert_eq!(bytes.len(), SpaceId::WIRE_SIZE);
        assert_eq!(SpaceId::from_slice(&bytes).unwrap(), id);
    }

    #[test]
    fn rejects_truncated_buffer() {
        let bytes = [0u8; 3];
        assert_eq!(SpaceId::from_slice(&bytes), Err(IdDecodeError::Truncated));
    }
}
