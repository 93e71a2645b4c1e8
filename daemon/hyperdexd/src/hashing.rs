//! Computes the routing hashes the daemon passes into
//! `hyperdex-store`/`hyperdex-replication` at the one place they're
//! needed: the storage and replication layers themselves stay free of
//! `hyperdex-hash` (see `hyperdex-replication::apply`'s module doc), so
//! whichever layer calls them in does the hashing.

use hyperdex_config::{Space, Subspace};

/// The primary hash of a key: both subspace 0's tiling coordinate and the
/// `key_hash` every `hyperdex-store` operation takes.
pub fn key_hash(space: &Space, key: &[u8]) -> u64 {
    hyperdex_hash::primary_hash(space.key_attr().kind, key)
}

/// The secondary hash of a record under `subspace`'s mask, truncated to
/// the 32 bits `hyperdex-store`'s search index records per entry.
pub fn search_hash(space: &Space, subspace: &Subspace, key: &[u8], values: &[Vec<u8>]) -> u32 {
    let kinds = space.attr_kinds();
    let mut refs: Vec<&[u8]> = Vec::with_capacity(kinds.len());
    refs.push(key);
    refs.extend(values.iter().map(|v| v.as_slice()));
    let mask = subspace.attr_indices();
    hyperdex_hash::secondary_hash(&kinds, &refs, &mask) as u32
}

/// The exact secondary-hash point under `subspace`'s mask, used to find
/// the region a write or a fully-pinned search predicate lands in.
pub fn secondary_point(space: &Space, subspace: &Subspace, key: &[u8], values: &[Vec<u8>]) -> u64 {
    let kinds = space.attr_kinds();
    let mut refs: Vec<&[u8]> = Vec::with_capacity(kinds.len());
    refs.push(key);
    refs.extend(values.iter().map(|v| v.as_slice()));
    let mask = subspace.attr_indices();
    hyperdex_hash::secondary_hash(&kinds, &refs, &mask)
}
