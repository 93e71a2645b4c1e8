//! Wires an `Action::ApplyToRegion` into a `RegionReplica`'s mutation log.
//! Separated from `keyholder` because the keyholder state machine itself
//! never touches storage directly (see its module doc); this is the one
//! place in the crate that does, and it stays a thin pass-through so the
//! daemon can call it right where it computes `key_hash`/`search_hash`
//! from `hyperdex-hash`.

use crate::pending::PendingOp;
use hyperdex_ids::Version;
use hyperdex_store::RegionReplica;

pub fn apply_pending_op(
    region: &RegionReplica,
    key: &[u8],
    key_hash: u64,
    search_hash: u32,
    version: Version,
    op: &PendingOp,
) {
    match op {
        PendingOp::Put(values) => region.put(key, key_hash, search_hash, version, values.clone()),
        PendingOp::Del => region.del(key, key_hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_store::{RegionReplicaConfig, ShardConfig};
    use tempfile::tempdir;

    #[test]
    fn a_put_action_lands_in_the_region_log() {
        let dir = tempdir().unwrap();
        let region = RegionReplica::create(
            dir.path(),
            RegionReplicaConfig {
                initial_shard: ShardConfig { hash_table_entries: 8, search_index_entries: 32, data_segment_size: 4096 },
                shard_bits: 0,
            },
        )
        .unwrap();
        apply_pending_op(&region, b"k", 1, 1, Version(1), &PendingOp::Put(vec![b"v".to_vec()]));
        let (version, values) = region.get(b"k", 1).unwrap();
        assert_eq!(version, Version(1));
        assert_eq!(values, vec![b"v".to_vec()]);
    }
}
