//! Identifiers for hyperspace coordinates: spaces, subspaces, regions, and
//! the virtual servers ("entities") that replicate a region.
//!
//! Every identifier here round-trips through the big-endian wire encoding
//! fixed by the message envelope (spec §6): `u32 space | u16 subspace | u8
//! prefix | u64 mask | u8 number`. Encoding is layered: a `RegionId` encodes
//! as its `SubspaceId` followed by its own fields, and a `VirtualServerId`
//! encodes as its `RegionId` followed by a replica index.

mod entity;
mod region;
mod space;
mod subspace;
mod version;

pub use entity::VirtualServerId;
pub use region::RegionId;
pub use space::SpaceId;
pub use subspace::SubspaceId;
pub use version::Version;

use bytes::{Buf, BufMut};

/// Errors decoding an identifier from a wire buffer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdDecodeError {
    #[error("buffer too short to decode identifier")]
    Truncated,
}

/// Shared encode/decode contract for the identifier types in this crate.
///
/// Implementors must only ever grow `buf` by `Self::WIRE_SIZE` bytes on
/// encode and consume exactly that many on decode, so that identifiers
/// compose by concatenation the way the wire envelope expects.
pub trait WireId: Sized {
    const WIRE_SIZE: usize;

    fn encode(&self, buf: &mut impl BufMut);

    fn decode(buf: &mut impl Buf) -> Result<Self, IdDecodeError>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIRE_SIZE);
        self.encode(&mut out);
        out
    }

    fn from_slice(mut bytes: &[u8]) -> Result<Self, IdDecodeError> {
        Self::decode(&mut bytes)
    }
}

pub(crate) fn require(buf: &impl Buf, n: usize) -> Result<(), IdDecodeError> {
    if buf.remaining() < n {
        Err(IdDecodeError::Truncated)
    } else {
        Ok(())
    }
}
