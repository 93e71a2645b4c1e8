/// Result codes from the storage shard (spec §4.C).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("NOTFOUND: key is absent (or tombstoned) in this shard")]
    NotFound,
    /// The data segment has no room left for another record.
    #[error("DATAFULL: shard's data segment is exhausted")]
    DataFull,
    /// The primary hash index has no free or reusable bucket for this key.
    #[error("HASHFULL: shard's primary hash index is exhausted")]
    HashFull,
    /// The secondary search index has no room for another entry.
    #[error("SEARCHFULL: shard's search index is exhausted")]
    SearchFull,
}
