//! The transfer sink (spec §4.H steps 3–5): applies the source's ordered
//! `XFER_DATA` stream to the local region, holds any live-chain writes
//! that arrive mid-transfer, and "goes live" once `XFER_DONE` arrives
//! with no sequence gap — replaying held writes the snapshot hadn't
//! already covered and discarding the ones it had, via the `triggers`
//! set.

use crate::error::TransferError;
use hyperdex_ids::{Version, VirtualServerId};
use hyperdex_network::{XferData, XferOp};
use hyperdex_replication::PendingOp;
use hyperdex_store::RegionReplica;
use std::collections::HashSet;

/// A chain write the sink received while still mid-transfer, held until
/// `finish` decides whether it was already covered by the snapshot.
pub struct HeldWrite {
    pub from: VirtualServerId,
    pub version: Version,
    pub key: Vec<u8>,
    pub op: PendingOp,
}

/// What the caller should do once `finish` decides a held write's fate.
pub enum SinkAction {
    /// Apply this write to the region and ack its sender — the snapshot
    /// hadn't already covered it.
    Replay(HeldWrite),
    /// The sink has applied the full transfer plus every held write not
    /// already covered; the caller should splice it into the live chain
    /// and request reconciliation from the coordinator (spec §4.H step 5).
    GoLive,
}

pub struct Sink {
    triggers: HashSet<(Vec<u8>, Version)>,
    held: Vec<HeldWrite>,
    next_seq: u64,
    done: bool,
}

impl Sink {
    pub fn new() -> Self {
        Sink { triggers: HashSet::new(), held: Vec::new(), next_seq: 0, done: false }
    }

    /// Applies one `XFER_DATA` to `region`. `key_hash`/`search_hash` are
    /// supplied by the caller (computed via `hyperdex-hash`, which this
    /// crate does not depend on) for the message's key.
    pub fn apply_xfer_data(
        &mut self,
        region: &RegionReplica,
        key_hash: u64,
        search_hash: u32,
        msg: &XferData,
    ) -> Result<(), TransferError> {
        if msg.seq != self.next_seq {
            return Err(TransferError::SequenceGap { expected: self.next_seq, got: msg.seq });
        }
        self.next_seq += 1;
        self.triggers.insert((msg.key.clone(), msg.version));
        match msg.op {
            XferOp::Put => region.put(&msg.key, key_hash, search_hash, msg.version, msg.values.clone()),
            XferOp::Del => region.del(&msg.key, key_hash),
        }
        Ok(())
    }

    /// A normal chain write arrived while still mid-transfer: held rather
    /// than applied immediately (spec §4.H step 5).
    pub fn hold(&mut self, write: HeldWrite) {
        self.held.push(write);
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// `XFER_DONE` arrived. Every held write already covered by the
    /// `triggers` set is dropped (already applied via the snapshot);
    /// everything else is handed back as `SinkAction::Replay` for the
    /// caller to apply and ack, followed by `SinkAction::GoLive`.
    pub fn finish(&mut self) -> Vec<SinkAction> {
        self.done = true;
        let mut actions: Vec<SinkAction> = self
            .held
            .drain(..)
            .filter(|write| !self.triggers.contains(&(write.key.clone(), write.version)))
            .map(SinkAction::Replay)
            .collect();
        actions.push(SinkAction::GoLive);
        actions
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_ids::{RegionId, SpaceId, SubspaceId};
    use hyperdex_store::{RegionReplicaConfig, ShardConfig};
    use tempfile::tempdir;

    fn region() -> RegionId {
        RegionId::new(SubspaceId::key_subspace(SpaceId::new(1)), 0, 0)
    }

    fn entity(index: u8) -> VirtualServerId {
        VirtualServerId::new(region(), index)
    }

    fn replica() -> (tempfile::TempDir, RegionReplica) {
        let dir = tempdir().unwrap();
        let replica = RegionReplica::create(
            dir.path(),
            RegionReplicaConfig {
                initial_shard: ShardConfig { hash_table_entries: 8, search_index_entries: 32, data_segment_size: 4096 },
                shard_bits: 0,
            },
        )
        .unwrap();
        (dir, replica)
    }

    #[test]
    fn rejects_a_sequence_gap() {
        let mut sink = Sink::new();
        let (_dir, region) = replica();
        let msg = XferData { seq: 1, op: XferOp::Put, version: Version(1), key: b"k".to_vec(), values: vec![b"v".to_vec()] };
        let err = sink.apply_xfer_data(&region, 1, 1, &msg).unwrap_err();
        assert_matches::assert_matches!(err, TransferError::SequenceGap { expected: 0, got: 1 });
    }

    #[test]
    fn a_held_write_already_covered_by_the_snapshot_is_dropped() {
        let mut sink = Sink::new();
        let (_dir, region) = replica();
        let msg = XferData { seq: 0, op: XferOp::Put, version: Version(1), key: b"k".to_vec(), values: vec![b"v".to_vec()] };
        sink.apply_xfer_data(&region, 1, 1, &msg).unwrap();
        sink.hold(HeldWrite { from: entity(0), version: Version(1), key: b"k".to_vec(), op: PendingOp::Put(vec![b"v".to_vec()]) });

        let actions = sink.finish();
        assert!(actions.iter().all(|a| !matches!(a, SinkAction::Replay(_))));
        assert!(actions.iter().any(|a| matches!(a, SinkAction::GoLive)));
        assert!(sink.is_done());
    }

    #[test]
    fn a_held_write_not_covered_by_the_snapshot_is_replayed() {
        let mut sink = Sink::new();
        sink.hold(HeldWrite { from: entity(0), version: Version(2), key: b"k2".to_vec(), op: PendingOp::Del });

        let actions = sink.finish();
        assert!(actions.iter().any(|a| matches!(a, SinkAction::Replay(w) if w.key == b"k2")));
    }
}
