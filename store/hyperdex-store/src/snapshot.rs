//! A point-in-time iterator over a shard's live records, used by search
//! (residual-predicate filtering) and by transfer/compaction (ordered
//! copy). Walking the search index rather than the hash table means the
//! iteration order is insertion order, which `disk.cc`'s own snapshot
//! consumers (the search executor) rely on for stable pagination.

use crate::shard::Shard;
use hyperdex_ids::Version;

pub struct Snapshot<'a> {
    shard: &'a Shard,
    next_entry: u32,
    limit: u32,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(shard: &'a Shard, limit: u32) -> Self {
        Snapshot { shard, next_entry: 0, limit }
    }
}

/// One live record as seen by a snapshot: key, its routing hashes as
/// originally supplied to `Shard::put`, its version, and its values.
pub struct SnapshotEntry {
    pub key: Vec<u8>,
    pub key_hash: u64,
    pub search_hash: u32,
    pub version: Version,
    pub values: Vec<Vec<u8>>,
}

impl<'a> Iterator for Snapshot<'a> {
    type Item = SnapshotEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_entry < self.limit {
            let entry = self.next_entry;
            self.next_entry += 1;
            let (offset, live) = self.shard.search_entry_at(entry)?;
            if !live {
                continue;
            }
            if let Ok(record) = self.shard.decode_at(offset) {
                return Some(SnapshotEntry {
                    key: record.key,
                    key_hash: record.key_hash,
                    search_hash: record.search_hash,
                    version: record.version,
                    values: record.values,
                });
            }
        }
        None
    }
}
