//! Payload encodings for each message type's fields (spec §6). The
//! envelope only frames `msg_type`/version/entity; everything after that
//! is opaque to the transport layer and decoded here according to
//! `msg_type`, matching spec §4.F's note that the transport "never"
//! inspects payload shape.

use bytes::{Buf, BufMut};
use hyperdex_error::StatusCode;
use hyperdex_ids::{RegionId, Version, WireId};
use thiserror::Error;

use crate::message::{status_from_tag, status_tag};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload truncated while decoding {0}")]
    Truncated(&'static str),
    #[error("unrecognized status code tag {0}")]
    UnknownStatus(u8),
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.put_u32(bytes.len() as u32);
    out.extend_from_slice(bytes);
}

fn get_bytes(buf: &mut &[u8], what: &'static str) -> Result<Vec<u8>, PayloadError> {
    if buf.remaining() < 4 {
        return Err(PayloadError::Truncated(what));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(PayloadError::Truncated(what));
    }
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}

fn put_values(out: &mut Vec<u8>, values: &[Vec<u8>]) {
    out.put_u16(values.len() as u16);
    for value in values {
        put_bytes(out, value);
    }
}

fn get_values(buf: &mut &[u8]) -> Result<Vec<Vec<u8>>, PayloadError> {
    if buf.remaining() < 2 {
        return Err(PayloadError::Truncated("values"));
    }
    let count = buf.get_u16() as usize;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(get_bytes(buf, "value")?);
    }
    Ok(values)
}

/// `REQ_GET(nonce, key)`
pub struct ReqGet {
    pub nonce: u64,
    pub key: Vec<u8>,
}

impl ReqGet {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        put_bytes(&mut out, &self.key);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 8 {
            return Err(PayloadError::Truncated("ReqGet.nonce"));
        }
        let nonce = buf.get_u64();
        let key = get_bytes(&mut buf, "ReqGet.key")?;
        Ok(ReqGet { nonce, key })
    }
}

/// `RESP_GET(nonce, status, value)`
pub struct RespGet {
    pub nonce: u64,
    pub status: StatusCode,
    pub values: Vec<Vec<u8>>,
}

impl RespGet {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        out.put_u8(status_tag(self.status));
        put_values(&mut out, &self.values);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 9 {
            return Err(PayloadError::Truncated("RespGet"));
        }
        let nonce = buf.get_u64();
        let status_tag = buf.get_u8();
        let status = status_from_tag(status_tag).ok_or(PayloadError::UnknownStatus(status_tag))?;
        let values = get_values(&mut buf)?;
        Ok(RespGet { nonce, status, values })
    }
}

/// `REQ_PUT(nonce, key, value)`
pub struct ReqPut {
    pub nonce: u64,
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

impl ReqPut {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        put_bytes(&mut out, &self.key);
        put_values(&mut out, &self.values);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 8 {
            return Err(PayloadError::Truncated("ReqPut.nonce"));
        }
        let nonce = buf.get_u64();
        let key = get_bytes(&mut buf, "ReqPut.key")?;
        let values = get_values(&mut buf)?;
        Ok(ReqPut { nonce, key, values })
    }
}

/// `REQ_DEL(nonce, key)`
pub struct ReqDel {
    pub nonce: u64,
    pub key: Vec<u8>,
}

impl ReqDel {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        put_bytes(&mut out, &self.key);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 8 {
            return Err(PayloadError::Truncated("ReqDel.nonce"));
        }
        let nonce = buf.get_u64();
        let key = get_bytes(&mut buf, "ReqDel.key")?;
        Ok(ReqDel { nonce, key })
    }
}

/// The common `RESP_*(nonce, status)` used for PUT/DEL acknowledgements.
pub struct RespStatus {
    pub nonce: u64,
    pub status: StatusCode,
}

impl RespStatus {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        out.put_u8(status_tag(self.status));
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 9 {
            return Err(PayloadError::Truncated("RespStatus"));
        }
        let nonce = buf.get_u64();
        let status_tag = buf.get_u8();
        let status = status_from_tag(status_tag).ok_or(PayloadError::UnknownStatus(status_tag))?;
        Ok(RespStatus { nonce, status })
    }
}

/// `RESP_SEARCH_ITEM(nonce, seq, key, value)`
pub struct RespSearchItem {
    pub nonce: u64,
    pub seq: u64,
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

impl RespSearchItem {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        out.put_u64(self.seq);
        put_bytes(&mut out, &self.key);
        put_values(&mut out, &self.values);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 16 {
            return Err(PayloadError::Truncated("RespSearchItem"));
        }
        let nonce = buf.get_u64();
        let seq = buf.get_u64();
        let key = get_bytes(&mut buf, "RespSearchItem.key")?;
        let values = get_values(&mut buf)?;
        Ok(RespSearchItem { nonce, seq, key, values })
    }
}

/// `CHAIN_PUT(version, fresh, key, value)`
pub struct ChainPut {
    pub version: Version,
    pub fresh: bool,
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

impl ChainPut {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.version.0);
        out.put_u8(self.fresh as u8);
        put_bytes(&mut out, &self.key);
        put_values(&mut out, &self.values);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 9 {
            return Err(PayloadError::Truncated("ChainPut"));
        }
        let version = Version(buf.get_u64());
        let fresh = buf.get_u8() != 0;
        let key = get_bytes(&mut buf, "ChainPut.key")?;
        let values = get_values(&mut buf)?;
        Ok(ChainPut { version, fresh, key, values })
    }
}

/// `CHAIN_DEL(version, key)`
pub struct ChainDel {
    pub version: Version,
    pub key: Vec<u8>,
}

impl ChainDel {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.version.0);
        put_bytes(&mut out, &self.key);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 8 {
            return Err(PayloadError::Truncated("ChainDel"));
        }
        let version = Version(buf.get_u64());
        let key = get_bytes(&mut buf, "ChainDel.key")?;
        Ok(ChainDel { version, key })
    }
}

/// `CHAIN_SUBSPACE(version, key, value, from_region, to_region)`
pub struct ChainSubspace {
    pub version: Version,
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
    pub from_region: RegionId,
    pub to_region: RegionId,
}

impl ChainSubspace {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.version.0);
        put_bytes(&mut out, &self.key);
        put_values(&mut out, &self.values);
        self.from_region.encode(&mut out);
        self.to_region.encode(&mut out);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 8 {
            return Err(PayloadError::Truncated("ChainSubspace"));
        }
        let version = Version(buf.get_u64());
        let key = get_bytes(&mut buf, "ChainSubspace.key")?;
        let values = get_values(&mut buf)?;
        let from_region = RegionId::decode(&mut buf).map_err(|_| PayloadError::Truncated("ChainSubspace.from_region"))?;
        let to_region = RegionId::decode(&mut buf).map_err(|_| PayloadError::Truncated("ChainSubspace.to_region"))?;
        Ok(ChainSubspace { version, key, values, from_region, to_region })
    }
}

/// `CHAIN_PENDING(version, key)` / `CHAIN_ACK(version, key)` share a shape.
pub struct ChainVersionedKey {
    pub version: Version,
    pub key: Vec<u8>,
}

impl ChainVersionedKey {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.version.0);
        put_bytes(&mut out, &self.key);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 8 {
            return Err(PayloadError::Truncated("ChainVersionedKey"));
        }
        let version = Version(buf.get_u64());
        let key = get_bytes(&mut buf, "ChainVersionedKey.key")?;
        Ok(ChainVersionedKey { version, key })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum XferOp {
    Put = 0,
    Del = 1,
}

impl XferOp {
    fn from_tag(tag: u8) -> Result<XferOp, PayloadError> {
        match tag {
            0 => Ok(XferOp::Put),
            1 => Ok(XferOp::Del),
            _ => Err(PayloadError::Truncated("XferOp")),
        }
    }
}

/// `XFER_DATA(seq, op, version, key, value)`
pub struct XferData {
    pub seq: u64,
    pub op: XferOp,
    pub version: Version,
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

impl XferData {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.seq);
        out.put_u8(self.op as u8);
        out.put_u64(self.version.0);
        put_bytes(&mut out, &self.key);
        put_values(&mut out, &self.values);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, PayloadError> {
        if buf.remaining() < 17 {
            return Err(PayloadError::Truncated("XferData"));
        }
        let seq = buf.get_u64();
        let op = XferOp::from_tag(buf.get_u8())?;
        let version = Version(buf.get_u64());
        let key = get_bytes(&mut buf, "XferData.key")?;
        let values = get_values(&mut buf)?;
        Ok(XferData { seq, op, version, key, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn req_put_round_trips() {
        let msg = ReqPut { nonce: 7, key: b"k".to_vec(), values: vec![b"v1".to_vec(), b"v2".to_vec()] };
        let decoded = ReqPut::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.nonce, 7);
        assert_eq!(decoded.key, b"k".to_vec());
        assert_eq!(decoded.values, vec![b"v1".to_vec(), b"v2".to_vec()]);
    }

    #[test]
    fn resp_get_round_trips_status_and_values() {
        let msg = RespGet { nonce: 1, status: StatusCode::NotFound, values: vec![] };
        let decoded = RespGet::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.status, StatusCode::NotFound);
        assert!(decoded.values.is_empty());
    }

    #[test]
    fn chain_put_round_trips_fresh_flag() {
        let msg = ChainPut { version: Version(9), fresh: true, key: b"k".to_vec(), values: vec![b"v".to_vec()] };
        let decoded = ChainPut::decode(&msg.encode()).unwrap();
        assert!(decoded.fresh);
        assert_eq!(decoded.version, Version(9));
    }

    #[test]
    fn xfer_data_round_trips() {
        let msg = XferData { seq: 3, op: XferOp::Del, version: Version(1), key: b"k".to_vec(), values: vec![] };
        let decoded = XferData::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.seq, 3);
        assert_eq!(decoded.op, XferOp::Del);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert!(ReqGet::decode(&[0u8; 3]).is_err());
    }
}
