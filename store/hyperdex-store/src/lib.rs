//! The storage layer (spec §4.C, §4.D): fixed-size memory-mapped shards
//! with a linear-probed hash table and an append-only data segment, and a
//! region replica that fans a region's key space out across a shard set
//! with an in-memory mutation log in front of it. Grounded on
//! `src/hyperdex/disk.h`/`disk.cc` for the shard file format and on
//! `near-store`'s split between a low-level column family and a
//! higher-level `Store` for the replica/log split.

mod layout;
mod record;
mod region;
mod shard;
mod snapshot;

pub use layout::{Header, ShardConfig};
pub use region::{RegionReplica, RegionReplicaConfig};
pub use shard::Shard;
pub use snapshot::SnapshotEntry;
