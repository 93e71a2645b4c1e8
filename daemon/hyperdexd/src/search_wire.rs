//! Wire encoding for the REQ_SEARCH_* family (spec §4.I, §6). Kept local
//! to the daemon rather than folded into `hyperdex-network`: unlike every
//! other message in that crate's payload catalog, a search predicate's
//! shape depends on `hyperdex-search::Predicate`, which sits one layer
//! above `hyperdex-network` in the dependency graph, so the encoding for
//! it has to live here instead.

use bytes::{Buf, BufMut};
use hyperdex_search::{Clause, ClauseOp, Predicate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchWireError {
    #[error("search payload truncated while decoding {0}")]
    Truncated(&'static str),
    #[error("search space name is not valid utf-8")]
    BadSpaceName,
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.put_u32(bytes.len() as u32);
    out.extend_from_slice(bytes);
}

fn get_bytes(buf: &mut &[u8], what: &'static str) -> Result<Vec<u8>, SearchWireError> {
    if buf.remaining() < 4 {
        return Err(SearchWireError::Truncated(what));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(SearchWireError::Truncated(what));
    }
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}

fn put_optional_bound(out: &mut Vec<u8>, bound: &Option<(Vec<u8>, bool)>) {
    match bound {
        Some((value, inclusive)) => {
            out.put_u8(1);
            out.put_u8(*inclusive as u8);
            put_bytes(out, value);
        }
        None => out.put_u8(0),
    }
}

fn get_optional_bound(buf: &mut &[u8], what: &'static str) -> Result<Option<(Vec<u8>, bool)>, SearchWireError> {
    if buf.remaining() < 1 {
        return Err(SearchWireError::Truncated(what));
    }
    if buf.get_u8() == 0 {
        return Ok(None);
    }
    if buf.remaining() < 1 {
        return Err(SearchWireError::Truncated(what));
    }
    let inclusive = buf.get_u8() != 0;
    let value = get_bytes(buf, what)?;
    Ok(Some((value, inclusive)))
}

fn put_predicate(out: &mut Vec<u8>, predicate: &Predicate) {
    out.put_u16(predicate.clauses.len() as u16);
    for clause in &predicate.clauses {
        out.put_u16(clause.attr_index as u16);
        match &clause.op {
            ClauseOp::Equals(value) => {
                out.put_u8(0);
                put_bytes(out, value);
            }
            ClauseOp::Range { lower, upper } => {
                out.put_u8(1);
                put_optional_bound(out, lower);
                put_optional_bound(out, upper);
            }
        }
    }
}

fn get_predicate(buf: &mut &[u8]) -> Result<Predicate, SearchWireError> {
    if buf.remaining() < 2 {
        return Err(SearchWireError::Truncated("Predicate.clause_count"));
    }
    let count = buf.get_u16() as usize;
    let mut clauses = Vec::with_capacity(count);
    for _ in 0..count {
        if buf.remaining() < 3 {
            return Err(SearchWireError::Truncated("Clause"));
        }
        let attr_index = buf.get_u16() as usize;
        let tag = buf.get_u8();
        let op = match tag {
            0 => ClauseOp::Equals(get_bytes(buf, "Clause.equals")?),
            1 => {
                let lower = get_optional_bound(buf, "Clause.range.lower")?;
                let upper = get_optional_bound(buf, "Clause.range.upper")?;
                ClauseOp::Range { lower, upper }
            }
            _ => return Err(SearchWireError::Truncated("Clause.op")),
        };
        clauses.push(Clause { attr_index, op });
    }
    Ok(Predicate { clauses })
}

/// `REQ_SEARCH_START(nonce, space, predicate)`
pub struct ReqSearchStart {
    pub nonce: u64,
    pub space: String,
    pub predicate: Predicate,
}

impl ReqSearchStart {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        put_bytes(&mut out, self.space.as_bytes());
        put_predicate(&mut out, &self.predicate);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, SearchWireError> {
        if buf.remaining() < 8 {
            return Err(SearchWireError::Truncated("ReqSearchStart.nonce"));
        }
        let nonce = buf.get_u64();
        let space = String::from_utf8(get_bytes(&mut buf, "ReqSearchStart.space")?)
            .map_err(|_| SearchWireError::BadSpaceName)?;
        let predicate = get_predicate(&mut buf)?;
        Ok(ReqSearchStart { nonce, space, predicate })
    }
}

/// `REQ_SEARCH_NEXT(nonce)`
pub struct ReqSearchNext {
    pub nonce: u64,
}

impl ReqSearchNext {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, SearchWireError> {
        if buf.remaining() < 8 {
            return Err(SearchWireError::Truncated("ReqSearchNext.nonce"));
        }
        Ok(ReqSearchNext { nonce: buf.get_u64() })
    }
}

/// `REQ_SEARCH_STOP(nonce)`
pub struct ReqSearchStop {
    pub nonce: u64,
}

impl ReqSearchStop {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u64(self.nonce);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, SearchWireError> {
        if buf.remaining() < 8 {
            return Err(SearchWireError::Truncated("ReqSearchStop.nonce"));
        }
        Ok(ReqSearchStop { nonce: buf.get_u64() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_search_start_with_mixed_clauses_round_trips() {
        let predicate = Predicate {
            clauses: vec![
                Clause { attr_index: 1, op: ClauseOp::Equals(vec![1, 2, 3]) },
                Clause { attr_index: 2, op: ClauseOp::Range { lower: Some((vec![0], true)), upper: None } },
            ],
        };
        let msg = ReqSearchStart { nonce: 5, space: "people".to_string(), predicate: predicate.clone() };
        let decoded = ReqSearchStart::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.nonce, 5);
        assert_eq!(decoded.space, "people");
        assert_eq!(decoded.predicate, predicate);
    }

    #[test]
    fn search_next_and_stop_round_trip_their_nonce() {
        assert_eq!(ReqSearchNext::decode(&ReqSearchNext { nonce: 9 }.encode()).unwrap().nonce, 9);
        assert_eq!(ReqSearchStop::decode(&ReqSearchStop { nonce: 9 }.encode()).unwrap().nonce, 9);
    }
}
