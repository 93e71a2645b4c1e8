//! A region replica (spec §4.D): the shard set backing one virtual
//! server's slice of the hyperspace, fronted by an in-memory append-only
//! mutation log that is authoritative for any key not yet flushed to a
//! shard. Grounded on `disk.h`'s own synchronization note ("a `region`
//! batches writes in memory and flushes them to `disk`s in the
//! background") and on the shard-splitting behavior implied by
//! `HASH_TABLE_ENTRIES`/`DATA_SEGMENT_SIZE` being fixed per shard: a
//! region that outgrows its shards must either split or compact rather
//! than grow one shard without bound.

use crate::layout::ShardConfig;
use crate::shard::Shard;
use hyperdex_error::StoreError;
use hyperdex_ids::Version;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct RegionReplicaConfig {
    pub initial_shard: ShardConfig,
    /// Number of bits of the primary hash (beyond whatever prefix this
    /// region already occupies in its subspace) used to route a key to
    /// one of this region's shards. `0` means a single shard.
    pub shard_bits: u32,
}

#[derive(Clone)]
enum LogOp {
    Put { search_hash: u32, version: Version, values: Vec<Vec<u8>> },
    Del,
}

#[derive(Clone)]
struct LogEntry {
    key: Vec<u8>,
    key_hash: u64,
    op: LogOp,
}

/// Fans a region's keys out across `2^shard_bits` fixed-size shards and
/// buffers recent writes in memory ahead of them.
pub struct RegionReplica {
    dir: PathBuf,
    config: RegionReplicaConfig,
    shards: Vec<RwLock<Arc<Shard>>>,
    log: RwLock<VecDeque<LogEntry>>,
    generation: AtomicU64,
}

impl RegionReplica {
    pub fn create(dir: &Path, config: RegionReplicaConfig) -> Result<RegionReplica, StoreError> {
        std::fs::create_dir_all(dir).map_err(|_| StoreError::HashFull)?;
        let shard_count = 1usize << config.shard_bits;
        let mut shards = Vec::with_capacity(shard_count);
        for index in 0..shard_count {
            let path = dir.join(format!("shard-{index}-0.hdx"));
            shards.push(RwLock::new(Arc::new(Shard::create(&path, config.initial_shard)?)));
        }
        Ok(RegionReplica { dir: dir.to_path_buf(), config, shards, log: RwLock::new(VecDeque::new()), generation: AtomicU64::new(0) })
    }

    fn shard_index(&self, primary_hash: u64) -> usize {
        if self.config.shard_bits == 0 {
            return 0;
        }
        (primary_hash >> (64 - self.config.shard_bits)) as usize
    }

    pub fn get(&self, key: &[u8], key_hash: u64) -> Result<(Version, Vec<Vec<u8>>), StoreError> {
        {
            let log = self.log.read();
            for entry in log.iter().rev() {
                if entry.key == key {
                    return match &entry.op {
                        LogOp::Put { version, values, .. } => Ok((*version, values.clone())),
                        LogOp::Del => Err(StoreError::NotFound),
                    };
                }
            }
        }
        let shard = self.shards[self.shard_index(key_hash)].read().clone();
        shard.get(key, key_hash)
    }

    /// Appends a put to the in-memory log; visible to `get` immediately,
    /// durable once `flush` writes it through to a shard.
    pub fn put(&self, key: &[u8], key_hash: u64, search_hash: u32, version: Version, values: Vec<Vec<u8>>) {
        self.log.write().push_back(LogEntry { key: key.to_vec(), key_hash, op: LogOp::Put { search_hash, version, values } });
    }

    pub fn del(&self, key: &[u8], key_hash: u64) {
        self.log.write().push_back(LogEntry { key: key.to_vec(), key_hash, op: LogOp::Del });
    }

    /// Drains the mutation log into the underlying shards in order,
    /// compacting a shard in place if it fills up mid-drain. Returns the
    /// number of log entries applied.
    pub fn flush(&self) -> Result<usize, StoreError> {
        let mut applied = 0;
        loop {
            let entry = match self.log.read().front() {
                Some(entry) => entry.clone(),
                None => break,
            };
            let shard_idx = self.shard_index(entry.key_hash);
            let shard = self.shards[shard_idx].read().clone();
            let result = match &entry.op {
                LogOp::Put { search_hash, version, values } => shard.put(&entry.key, entry.key_hash, *search_hash, *version, values),
                LogOp::Del => match shard.del(&entry.key, entry.key_hash) {
                    Err(StoreError::NotFound) => Ok(()),
                    other => other,
                },
            };
            match result {
                Ok(()) => {
                    self.log.write().pop_front();
                    applied += 1;
                }
                Err(StoreError::DataFull) | Err(StoreError::HashFull) | Err(StoreError::SearchFull) => {
                    self.compact(shard_idx)?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(applied)
    }

    /// Replaces shard `shard_idx` with a fresh, larger shard holding the
    /// same live records, doubling its geometry the way a region that has
    /// outgrown its allotment makes room without needing a reconfigure
    /// (spec §4.D: splitting across hosts is the coordinator's purview,
    /// but growing a shard file in place is a purely local decision).
    fn compact(&self, shard_idx: usize) -> Result<(), StoreError> {
        let old = self.shards[shard_idx].read().clone();
        let old_config = old.config();
        let new_config = ShardConfig {
            hash_table_entries: old_config.hash_table_entries.saturating_mul(2),
            search_index_entries: old_config.search_index_entries.saturating_mul(2),
            data_segment_size: old_config.data_segment_size.saturating_mul(2),
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self.dir.join(format!("shard-{shard_idx}-{generation}.hdx"));
        let fresh = Shard::create(&path, new_config)?;
        for entry in old.snapshot() {
            fresh.put(&entry.key, entry.key_hash, entry.search_hash, entry.version, &entry.values)?;
        }
        fresh.flush()?;
        *self.shards[shard_idx].write() = Arc::new(fresh);
        Ok(())
    }

    /// A point-in-time view across every shard plus whatever the log has
    /// not yet flushed, for search and transfer. Log entries shadow shard
    /// entries for the same key, matching `get`'s precedence.
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Version, Vec<Vec<u8>>)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for entry in self.log.read().iter().rev() {
            if !seen.insert(entry.key.clone()) {
                continue;
            }
            if let LogOp::Put { version, values, .. } = &entry.op {
                out.push((entry.key.clone(), *version, values.clone()));
            }
        }
        for shard_slot in &self.shards {
            let shard = shard_slot.read().clone();
            for entry in shard.snapshot() {
                if seen.insert(entry.key.clone()) {
                    out.push((entry.key, entry.version, entry.values));
                }
            }
        }
        out
    }

    pub fn flush_len(&self) -> usize {
        self.log.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn hash(key: &[u8]) -> u64 {
        let mut h = 1469598103934665603u64;
        for &b in key {
            h ^= b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        h
    }

    fn config() -> RegionReplicaConfig {
        RegionReplicaConfig {
            initial_shard: ShardConfig { hash_table_entries: 8, search_index_entries: 32, data_segment_size: 4096 },
            shard_bits: 2,
        }
    }

    #[test]
    fn unflushed_put_is_visible_through_the_log() {
        let dir = tempdir().unwrap();
        let region = RegionReplica::create(dir.path(), config()).unwrap();
        let key = b"k1";
        region.put(key, hash(key), 1, Version(1), vec![b"v1".to_vec()]);
        let (version, values) = region.get(key, hash(key)).unwrap();
        assert_eq!(version, Version(1));
        assert_eq!(values, vec![b"v1".to_vec()]);
    }

    #[test]
    fn flush_moves_the_log_into_a_shard() {
        let dir = tempdir().unwrap();
        let region = RegionReplica::create(dir.path(), config()).unwrap();
        let key = b"k1";
        region.put(key, hash(key), 1, Version(1), vec![b"v1".to_vec()]);
        assert_eq!(region.flush().unwrap(), 1);
        assert_eq!(region.flush_len(), 0);
        let (version, values) = region.get(key, hash(key)).unwrap();
        assert_eq!(version, Version(1));
        assert_eq!(values, vec![b"v1".to_vec()]);
    }

    #[test]
    fn log_del_shadows_a_flushed_put() {
        let dir = tempdir().unwrap();
        let region = RegionReplica::create(dir.path(), config()).unwrap();
        let key = b"k1";
        region.put(key, hash(key), 1, Version(1), vec![b"v1".to_vec()]);
        region.flush().unwrap();
        region.del(key, hash(key));
        assert_matches::assert_matches!(region.get(key, hash(key)), Err(StoreError::NotFound));
    }

    #[test]
    fn compaction_kicks_in_when_a_shard_fills_and_preserves_data() {
        let dir = tempdir().unwrap();
        let tiny = RegionReplicaConfig {
            initial_shard: ShardConfig { hash_table_entries: 4, search_index_entries: 8, data_segment_size: 64 },
            shard_bits: 0,
        };
        let region = RegionReplica::create(dir.path(), tiny).unwrap();
        for i in 0..10u8 {
            let key = vec![i];
            region.put(&key, hash(&key), 1, Version(1), vec![vec![i; 8]]);
        }
        region.flush().unwrap();
        for i in 0..10u8 {
            let key = vec![i];
            let (_, values) = region.get(&key, hash(&key)).unwrap();
            assert_eq!(values, vec![vec![i; 8]]);
        }
    }

    #[test]
    fn snapshot_prefers_log_entries_over_flushed_ones() {
        let dir = tempdir().unwrap();
        let region = RegionReplica::create(dir.path(), config()).unwrap();
        let key = b"k1";
        region.put(key, hash(key), 1, Version(1), vec![b"old".to_vec()]);
        region.flush().unwrap();
        region.put(key, hash(key), 1, Version(2), vec![b"new".to_vec()]);
        let snap = region.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].1, Version(2));
        assert_eq!(snap[0].2, vec![b"new".to_vec()]);
    }
}
