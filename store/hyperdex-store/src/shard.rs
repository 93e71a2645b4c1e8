//! A single storage shard (spec §4.C): a memory-mapped file holding a
//! linear-probed hash table over the data segment's records, plus a search
//! index that lets a full scan skip superseded records. Grounded on
//! `src/hyperdex/disk.h`/`disk.cc`: `find_bucket_for_key`'s probe sequence,
//! `put`/`get`/`del`'s record handling, and `invalidate_search_index`'s
//! linear scan, each reproduced with the same three-segment file shape.
//!
//! Concurrency follows spec §5's "publication point" model: a single
//! writer (serialized by `write_lock`) appends a new record to the data
//! segment and then makes it visible with one release store to the
//! bucket's offset word; readers load that word with acquire ordering, so
//! a reader that observes a new offset is guaranteed to see the fully
//! written record behind it. This mirrors `disk.cc`'s own use of a shared,
//! unsynchronized `char*` base pointer across threads — the memory map is
//! genuinely aliased, so the atomics here are the correctness boundary,
//! not merely an optimization.

use crate::layout::{Header, ShardConfig, DELETED, EMPTY, LIVE, TOMBSTONE};
use crate::record;
use crate::snapshot::Snapshot;
use hyperdex_error::StoreError;
use hyperdex_ids::Version;
use memmap2::MmapMut;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

pub struct Shard {
    mmap: Mutex<MmapMut>,
    base: *mut u8,
    config: ShardConfig,
    write_lock: Mutex<()>,
    data_cursor: AtomicU64,
    search_cursor: AtomicU32,
}

// SAFETY: `base` aliases the bytes owned by `mmap`, which outlives every
// derived reference for the lifetime of the `Shard`. All access through
// `base` goes through the `Atomic*` types below, or is guarded by
// `write_lock` for the data segment's append-only writes.
unsafe impl Send for Shard {}
unsafe impl Sync for Shard {}

enum Lookup {
    Existing { entry: u32, offset: u32 },
    Vacant { entry: u32 },
    Full,
}

impl Shard {
    pub fn create(path: &Path, config: ShardConfig) -> Result<Shard, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|_| StoreError::HashFull)?;
        file.set_len(config.total_file_size()).map_err(|_| StoreError::HashFull)?;
        let mut mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|_| StoreError::HashFull)?;
        Header::new(config).write_to(&mut mmap[..Header::SIZE]);
        let base = mmap.as_mut_ptr();
        let data_cursor = config.data_segment_offset() as u64;
        Ok(Shard {
            mmap: Mutex::new(mmap),
            base,
            config,
            write_lock: Mutex::new(()),
            data_cursor: AtomicU64::new(data_cursor),
            search_cursor: AtomicU32::new(0),
        })
    }

    pub fn open(path: &Path) -> Result<Shard, StoreError> {
        let file = OpenOptions::new().read(true).write(true).open(path).map_err(|_| StoreError::HashFull)?;
        let mut mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|_| StoreError::HashFull)?;
        let header = Header::read_from(&mmap).ok_or(StoreError::HashFull)?;
        let config = header.config;
        let base = mmap.as_mut_ptr();
        let shard = Shard {
            mmap: Mutex::new(mmap),
            base,
            config,
            write_lock: Mutex::new(()),
            data_cursor: AtomicU64::new(config.data_segment_offset() as u64),
            search_cursor: AtomicU32::new(0),
        };
        shard.rebuild_cursors();
        Ok(shard)
    }

    /// Re-derives the data and search cursors by scanning the search index
    /// for the highest recorded offset, since those cursors are not
    /// persisted in the header: a reopened shard only needs to know where
    /// to resume appending, and a scan is cheap relative to disk I/O.
    fn rebuild_cursors(&self) {
        let mut max_data_end = self.config.data_segment_offset() as u64;
        let mut used_search_entries = 0u32;
        for entry in 0..self.config.search_index_entries {
            let offset = self.search_offset_word(entry).load(Ordering::Relaxed);
            let hash = self.search_hash_word(entry).load(Ordering::Relaxed);
            if offset == 0 && hash == 0 {
                break;
            }
            used_search_entries = entry + 1;
            if let Ok(record) = self.read_record_at(offset) {
                max_data_end = max_data_end.max(offset as u64 + record.len as u64);
            }
        }
        self.data_cursor.store(max_data_end, Ordering::Relaxed);
        self.search_cursor.store(used_search_entries, Ordering::Relaxed);
    }

    pub fn config(&self) -> ShardConfig {
        self.config
    }

    // --- raw segment access -------------------------------------------------

    unsafe fn atomic_u32_at(&self, byte_offset: usize) -> &AtomicU32 {
        &*(self.base.add(byte_offset) as *const AtomicU32)
    }

    fn hash_word(&self, entry: u32) -> &AtomicU32 {
        unsafe { self.atomic_u32_at(self.config.hash_table_offset() + entry as usize * 8) }
    }

    fn offset_word(&self, entry: u32) -> &AtomicU32 {
        unsafe { self.atomic_u32_at(self.config.hash_table_offset() + entry as usize * 8 + 4) }
    }

    fn search_hash_word(&self, entry: u32) -> &AtomicU32 {
        unsafe { self.atomic_u32_at(self.config.search_index_offset() + entry as usize * 12) }
    }

    fn search_offset_word(&self, entry: u32) -> &AtomicU32 {
        unsafe { self.atomic_u32_at(self.config.search_index_offset() + entry as usize * 12 + 4) }
    }

    fn search_invalidator_word(&self, entry: u32) -> &AtomicU32 {
        unsafe { self.atomic_u32_at(self.config.search_index_offset() + entry as usize * 12 + 8) }
    }

    fn data_bytes(&self, offset: u32, len: usize) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.base.add(offset as usize), len) }
    }

    fn data_write(&self, offset: u32, bytes: &[u8]) {
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.base.add(offset as usize), bytes.len()) }
    }

    fn read_record_at(&self, offset: u32) -> Result<record::Decoded, StoreError> {
        let remaining = self.config.total_file_size() as usize - offset as usize;
        record::decode(self.data_bytes(offset, remaining))
    }

    // --- bucket lookup -------------------------------------------------------

    fn lookup(&self, key: &[u8], key_hash: u64) -> Lookup {
        let entries = self.config.hash_table_entries;
        let bucket = (key_hash % entries as u64) as u32;
        let short_hash = (key_hash & 0xffff_ffff) as u32;
        let mut vacant: Option<u32> = None;
        for probe in 0..entries {
            let entry = (bucket + probe) % entries;
            let offset = self.offset_word(entry).load(Ordering::Acquire);
            if offset == EMPTY {
                return Lookup::Vacant { entry: vacant.unwrap_or(entry) };
            }
            if offset == TOMBSTONE {
                if vacant.is_none() {
                    vacant = Some(entry);
                }
                continue;
            }
            if self.hash_word(entry).load(Ordering::Relaxed) == short_hash {
                let remaining = self.config.total_file_size() as usize - offset as usize;
                let candidate = self.data_bytes(offset, remaining.min(24 + key.len()));
                if let Ok(key_len) = record::peek_key_len(candidate) {
                    if key_len as usize == key.len() && record::peek_key(candidate, key_len) == key {
                        return Lookup::Existing { entry, offset };
                    }
                }
            }
        }
        match vacant {
            Some(entry) => Lookup::Vacant { entry },
            None => Lookup::Full,
        }
    }

    // --- public operations ---------------------------------------------------

    pub fn get(&self, key: &[u8], key_hash: u64) -> Result<(Version, Vec<Vec<u8>>), StoreError> {
        match self.lookup(key, key_hash) {
            Lookup::Existing { offset, .. } => {
                let record = self.read_record_at(offset)?;
                Ok((record.version, record.values))
            }
            _ => Err(StoreError::NotFound),
        }
    }

    /// Appends `values` as the record for `key` at `version`, publishing it
    /// atomically into the hash table. `search_hash` is the subspace
    /// secondary-hash contribution the caller (the hashing layer) computed
    /// for this record; this crate stores and invalidates it but never
    /// computes it, keeping the storage layer free of hashing-layer
    /// knowledge.
    pub fn put(
        &self,
        key: &[u8],
        key_hash: u64,
        search_hash: u32,
        version: Version,
        values: &[Vec<u8>],
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        let record_len = record::encoded_len(key, values);
        let cursor = self.data_cursor.load(Ordering::Relaxed);
        let data_end = self.config.data_segment_offset() as u64 + self.config.data_segment_size as u64;
        if cursor + record_len as u64 > data_end || cursor + (record_len as u64) > u32::MAX as u64 {
            return Err(StoreError::DataFull);
        }
        let search_entry = self.search_cursor.load(Ordering::Relaxed);
        if search_entry >= self.config.search_index_entries {
            return Err(StoreError::SearchFull);
        }

        let (entry, old_offset) = match self.lookup(key, key_hash) {
            Lookup::Full => return Err(StoreError::HashFull),
            Lookup::Existing { entry, offset } => (entry, Some(offset)),
            Lookup::Vacant { entry } => (entry, None),
        };

        let new_offset = cursor as u32;
        let mut record_bytes = vec![0u8; record_len];
        record::encode(version, key_hash, search_hash, key, values, &mut record_bytes);
        self.data_write(new_offset, &record_bytes);

        if let Some(old_offset) = old_offset {
            self.invalidate_search_index(old_offset, new_offset);
        }

        self.search_hash_word(search_entry).store(search_hash, Ordering::Relaxed);
        self.search_offset_word(search_entry).store(new_offset, Ordering::Relaxed);
        self.search_invalidator_word(search_entry).store(LIVE, Ordering::Relaxed);

        let short_hash = (key_hash & 0xffff_ffff) as u32;
        self.hash_word(entry).store(short_hash, Ordering::Relaxed);
        self.offset_word(entry).store(new_offset, Ordering::Release);

        self.data_cursor.store(cursor + record_len as u64, Ordering::Relaxed);
        self.search_cursor.store(search_entry + 1, Ordering::Relaxed);
        Ok(())
    }

    pub fn del(&self, key: &[u8], key_hash: u64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        match self.lookup(key, key_hash) {
            Lookup::Existing { entry, offset } => {
                self.invalidate_search_index(offset, DELETED);
                self.offset_word(entry).store(TOMBSTONE, Ordering::Release);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    /// Marks every live search-index entry currently pointing at
    /// `old_offset` as superseded, the way `disk.cc`'s
    /// `invalidate_search_index` walks the populated prefix of the index
    /// looking for entries naming the record being replaced or deleted.
    fn invalidate_search_index(&self, old_offset: u32, invalidated_by: u32) {
        let used = self.search_cursor.load(Ordering::Relaxed);
        for entry in 0..used {
            if self.search_invalidator_word(entry).load(Ordering::Relaxed) == LIVE
                && self.search_offset_word(entry).load(Ordering::Relaxed) == old_offset
            {
                self.search_invalidator_word(entry).store(invalidated_by, Ordering::Relaxed);
            }
        }
    }

    /// Flushes outstanding mmap writes to disk (spec §4.C: durability is
    /// per-flush, not per-operation).
    pub fn flush(&self) -> Result<(), StoreError> {
        self.mmap.lock().flush().map_err(|_| StoreError::DataFull)
    }

    /// A point-in-time iterator over this shard's live records, used both
    /// to answer a search predicate and to drive transfer/compaction.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(self, self.search_cursor.load(Ordering::Acquire))
    }

    pub(crate) fn search_entry_at(&self, entry: u32) -> Option<(u32, bool)> {
        if entry >= self.config.search_index_entries {
            return None;
        }
        let offset = self.search_offset_word(entry).load(Ordering::Acquire);
        let live = self.search_invalidator_word(entry).load(Ordering::Acquire) == LIVE;
        Some((offset, live))
    }

    pub(crate) fn decode_at(&self, offset: u32) -> Result<record::Decoded, StoreError> {
        self.read_record_at(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_config() -> ShardConfig {
        ShardConfig { hash_table_entries: 8, search_index_entries: 32, data_segment_size: 4096 }
    }

    fn hash(key: &[u8]) -> u64 {
        let mut h = 1469598103934665603u64;
        for &b in key {
            h ^= b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        h
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let shard = Shard::create(&dir.path().join("0.shard"), small_config()).unwrap();
        let key = b"k1";
        shard.put(key, hash(key), 42, Version(1), &[b"v1".to_vec()]).unwrap();
        let (version, values) = shard.get(key, hash(key)).unwrap();
        assert_eq!(version, Version(1));
        assert_eq!(values, vec![b"v1".to_vec()]);
    }

    #[test]
    fn get_missing_key_is_not_found() {
        let dir = tempdir().unwrap();
        let shard = Shard::create(&dir.path().join("0.shard"), small_config()).unwrap();
        assert_matches::assert_matches!(shard.get(b"nope", hash(b"nope")), Err(StoreError::NotFound));
    }

    #[test]
    fn put_overwrite_invalidates_the_old_search_entry() {
        let dir = tempdir().unwrap();
        let shard = Shard::create(&dir.path().join("0.shard"), small_config()).unwrap();
        let key = b"k1";
        shard.put(key, hash(key), 1, Version(1), &[b"old".to_vec()]).unwrap();
        shard.put(key, hash(key), 2, Version(2), &[b"new".to_vec()]).unwrap();
        let live: Vec<_> = shard.snapshot().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].version, Version(2));
        assert_eq!(live[0].values, vec![b"new".to_vec()]);
    }

    #[test]
    fn del_removes_the_key_and_invalidates_its_entry() {
        let dir = tempdir().unwrap();
        let shard = Shard::create(&dir.path().join("0.shard"), small_config()).unwrap();
        let key = b"k1";
        shard.put(key, hash(key), 1, Version(1), &[b"v".to_vec()]).unwrap();
        shard.del(key, hash(key)).unwrap();
        assert_matches::assert_matches!(shard.get(key, hash(key)), Err(StoreError::NotFound));
        assert_eq!(shard.snapshot().count(), 0);
    }

    #[test]
    fn del_missing_key_is_not_found() {
        let dir = tempdir().unwrap();
        let shard = Shard::create(&dir.path().join("0.shard"), small_config()).unwrap();
        assert_matches::assert_matches!(shard.del(b"nope", hash(b"nope")), Err(StoreError::NotFound));
    }

    #[test]
    fn data_full_is_reported_without_corrupting_existing_entries() {
        let dir = tempdir().unwrap();
        let config = ShardConfig { hash_table_entries: 8, search_index_entries: 32, data_segment_size: 32 };
        let shard = Shard::create(&dir.path().join("0.shard"), config).unwrap();
        shard.put(b"a", hash(b"a"), 1, Version(1), &[b"x".to_vec()]).unwrap();
        let err = shard.put(b"b", hash(b"b"), 1, Version(1), &[vec![0u8; 64]]).unwrap_err();
        assert_matches::assert_matches!(err, StoreError::DataFull);
        assert!(shard.get(b"a", hash(b"a")).is_ok());
    }

    #[test]
    fn reopened_shard_resumes_appending_after_existing_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.shard");
        {
            let shard = Shard::create(&path, small_config()).unwrap();
            shard.put(b"k1", hash(b"k1"), 1, Version(1), &[b"v1".to_vec()]).unwrap();
            shard.flush().unwrap();
        }
        let reopened = Shard::open(&path).unwrap();
        let (version, values) = reopened.get(b"k1", hash(b"k1")).unwrap();
        assert_eq!(version, Version(1));
        assert_eq!(values, vec![b"v1".to_vec()]);
        reopened.put(b"k2", hash(b"k2"), 1, Version(1), &[b"v2".to_vec()]).unwrap();
        assert!(reopened.get(b"k2", hash(b"k2")).is_ok());
    }
}
