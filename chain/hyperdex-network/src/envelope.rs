//! The message envelope and its wire framing (spec §6, §4.F): a 4-byte
//! big-endian length followed by `u8 msg_type, u16 from_version, u16
//! to_version, entity from, entity to, payload`. Grounded on the exact
//! byte layout spec.md gives; the length-prefix framing style itself is
//! grounded on `dekaf/src/api_client.rs`'s `tokio_util::codec::LengthDelimitedCodec`
//! usage (big-endian, 4-byte length field) — reproduced here over
//! `std::io::Read`/`Write` directly rather than through `tokio_util`,
//! since spec §9 is explicit that the core stays synchronous (parallel OS
//! threads, no coroutines/async).

use bytes::{Buf, BufMut};
use hyperdex_ids::{IdDecodeError, VirtualServerId, WireId};
use std::io::{self, Read, Write};
use thiserror::Error;

use crate::message::{MessageType, MessageTypeError};

pub const MAX_FRAME_LEN: u32 = 1 << 26; // 64 MiB

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error framing a message: {0}")]
    Io(#[from] io::Error),
    #[error("frame length {0} exceeds the maximum of {MAX_FRAME_LEN}")]
    TooLarge(u32),
    #[error("malformed envelope: {0}")]
    Truncated(#[from] IdDecodeError),
    #[error(transparent)]
    UnknownMessageType(#[from] MessageTypeError),
}

/// A decoded envelope: routing header plus an undecoded payload, which the
/// caller parses according to `msg_type` (spec §4.F: the transport layer
/// only checks version and destination, never payload shape).
#[derive(Clone, Debug)]
pub struct Envelope {
    pub msg_type: MessageType,
    pub version_from: u16,
    pub version_to: u16,
    pub from: VirtualServerId,
    pub to: VirtualServerId,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(
        msg_type: MessageType,
        version_from: u16,
        version_to: u16,
        from: VirtualServerId,
        to: VirtualServerId,
        payload: Vec<u8>,
    ) -> Self {
        Envelope { msg_type, version_from, version_to, from, to, payload }
    }

    fn encoded_body_len(&self) -> usize {
        1 + 2 + 2 + VirtualServerId::WIRE_SIZE * 2 + self.payload.len()
    }

    pub fn encode_frame(&self) -> Vec<u8> {
        let body_len = self.encoded_body_len();
        let mut out = Vec::with_capacity(4 + body_len);
        out.put_u32(body_len as u32);
        out.put_u8(self.msg_type.tag());
        out.put_u16(self.version_from);
        out.put_u16(self.version_to);
        self.from.encode(&mut out);
        self.to.encode(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn write_frame(&self, w: &mut impl Write) -> Result<(), FrameError> {
        w.write_all(&self.encode_frame())?;
        Ok(())
    }

    /// Reads one length-prefixed frame and decodes its envelope header,
    /// leaving the payload undecoded.
    pub fn read_frame(r: &mut impl Read) -> Result<Envelope, FrameError> {
        let mut len_bytes = [0u8; 4];
        r.read_exact(&mut len_bytes)?;
        let body_len = u32::from_be_bytes(len_bytes);
        if body_len > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(body_len));
        }
        let mut body = vec![0u8; body_len as usize];
        r.read_exact(&mut body)?;
        Self::decode_body(&body)
    }

    fn decode_body(body: &[u8]) -> Result<Envelope, FrameError> {
        let mut buf = body;
        if buf.remaining() < 5 {
            return Err(IdDecodeError::Truncated.into());
        }
        let msg_type = MessageType::from_tag(buf.get_u8())?;
        let version_from = buf.get_u16();
        let version_to = buf.get_u16();
        let from = VirtualServerId::decode(&mut buf)?;
        let to = VirtualServerId::decode(&mut buf)?;
        let payload = buf.to_vec();
        Ok(Envelope { msg_type, version_from, version_to, from, to, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_ids::{RegionId, SpaceId, SubspaceId};

    fn entity(index: u8) -> VirtualServerId {
        VirtualServerId::new(RegionId::new(SubspaceId::key_subspace(SpaceId::new(1)), 4, 0xF000_0000_0000_0000), index)
    }

    #[test]
    fn round_trips_through_a_frame() {
        let envelope = Envelope::new(MessageType::ChainPut, 3, 3, entity(0), entity(1), b"payload".to_vec());
        let mut cursor = io::Cursor::new(envelope.encode_frame());
        let decoded = Envelope::read_frame(&mut cursor).unwrap();
        assert_eq!(decoded.msg_type, MessageType::ChainPut);
        assert_eq!(decoded.version_from, 3);
        assert_eq!(decoded.from, entity(0));
        assert_eq!(decoded.to, entity(1));
        assert_eq!(decoded.payload, b"payload".to_vec());
    }

    #[test]
    fn oversized_frame_is_rejected_before_allocating() {
        let mut bytes = Vec::new();
        bytes.put_u32(MAX_FRAME_LEN + 1);
        let mut cursor = io::Cursor::new(bytes);
        assert!(matches!(Envelope::read_frame(&mut cursor), Err(FrameError::TooLarge(_))));
    }
}
