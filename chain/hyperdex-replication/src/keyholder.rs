//! The per-(region, key) keyholder state machine (spec §4.G, "the hard
//! part"): tracks every pending (not-yet-cluster-wide-durable) version for
//! a key at this replica, and the chain messages each transition emits.
//!
//! This module is pure: it never touches a socket or a shard directly.
//! Callers (the network dispatch loop, wired up in `hyperdexd`) translate
//! the `Action`s this state machine returns into `hyperdex-network`
//! sends and `hyperdex-store` applies. That split keeps the replication
//! logic itself unit-testable without a running transport — the same
//! reason spec §9 replaces "exceptions for control flow" with tagged
//! result enums.

use crate::pending::{ClientOpHandle, NextHop, PendingOp, PendingRecord};
use hyperdex_error::{InvariantViolation, StatusCode};
use hyperdex_ids::{Version, VirtualServerId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Everything a transition may need the caller to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    ForwardPut { to: VirtualServerId, version: Version, fresh: bool, key: Vec<u8>, values: Vec<Vec<u8>> },
    ForwardDel { to: VirtualServerId, version: Version, key: Vec<u8> },
    ForwardSubspace {
        to: VirtualServerId,
        version: Version,
        key: Vec<u8>,
        values: Vec<Vec<u8>>,
        from_region: hyperdex_ids::RegionId,
        to_region: hyperdex_ids::RegionId,
    },
    SendAck { to: VirtualServerId, version: Version, key: Vec<u8> },
    SendPending { to: VirtualServerId, version: Version, key: Vec<u8> },
    ApplyToRegion { version: Version, op: PendingOp },
    RespondClient { handle: ClientOpHandle, status: StatusCode, version: Version },
}

/// A CHAIN_ACK that arrived before every earlier pending version at this
/// replica had itself been acked — held until it can be replayed in
/// order (spec §5: "reordered delivery is handled by the deferred
/// queue").
#[derive(Debug)]
pub struct AckDeferred;

/// A CHAIN_PUT/CHAIN_DEL that arrived ahead of its immediate predecessor
/// at this replica (spec §3's `deferred_updates`/`blocked_updates`):
/// held until the gap closes rather than applied out of sequence.
struct DeferredWrite {
    op: PendingOp,
    from: VirtualServerId,
    expected_prev: VirtualServerId,
    this_old: VirtualServerId,
    this_new: VirtualServerId,
    next: NextHop,
}

pub struct Keyholder {
    pub key: Vec<u8>,
    pub version_on_disk: Version,
    pending: VecDeque<PendingRecord>,
    deferred_acks: BTreeSet<Version>,
    deferred_writes: BTreeMap<Version, DeferredWrite>,
}

impl Keyholder {
    pub fn new(key: Vec<u8>, version_on_disk: Version) -> Self {
        Keyholder { key, version_on_disk, pending: VecDeque::new(), deferred_acks: BTreeSet::new(), deferred_writes: BTreeMap::new() }
    }

    /// The version a newly arriving chain write must carry to extend this
    /// replica's history without a gap: one past the last pending record,
    /// or one past `version_on_disk` if nothing is pending.
    fn expected_next(&self) -> Version {
        self.pending.back().map(|p| p.version.next()).unwrap_or_else(|| self.version_on_disk.next())
    }

    pub fn pending_versions(&self) -> Vec<Version> {
        self.pending.iter().map(|p| p.version).collect()
    }

    /// No pending record and nothing held in `deferred_writes`: safe to
    /// drop from the table without losing state a later message would
    /// need to find.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.deferred_writes.is_empty()
    }

    fn find_mut(&mut self, version: Version) -> Option<&mut PendingRecord> {
        self.pending.iter_mut().find(|p| p.version == version)
    }

    fn earlier_all_may_ack(&self, version: Version) -> bool {
        self.pending.iter().filter(|p| p.version < version).all(|p| p.may_ack)
    }

    /// The point leader originates a write: constructs the pending record
    /// and emits the first chain hop (spec §4.G steps 4–6).
    pub fn begin_client_write(
        &mut self,
        version: Version,
        op: PendingOp,
        this_old: VirtualServerId,
        this_new: VirtualServerId,
        next: NextHop,
        client_op: ClientOpHandle,
    ) -> Result<Vec<Action>, InvariantViolation> {
        let fresh = self.version_on_disk.is_absent() && self.pending.is_empty();
        if let Some(last) = self.pending.back() {
            if version.0 != last.version.0 + 1 {
                return Err(InvariantViolation::new(format!(
                    "non-contiguous pending version: last pending {}, new {}",
                    last.version, version
                )));
            }
        } else if version.0 != self.version_on_disk.0 + 1 {
            return Err(InvariantViolation::new(format!(
                "pending version {version} does not immediately follow version_on_disk {}",
                self.version_on_disk
            )));
        }

        let is_tail = matches!(next, NextHop::None);
        if is_tail {
            // This replica is both the point leader and the chain tail
            // (a single-replica region): no CHAIN_PENDING will ever
            // arrive to retire a pending record, so commit directly
            // instead of queuing one that would sit forever.
            self.version_on_disk = version;
            return Ok(vec![
                Action::ApplyToRegion { version, op },
                Action::RespondClient { handle: client_op, status: StatusCode::Success, version },
            ]);
        }

        let record = PendingRecord {
            version,
            op: op.clone(),
            fresh,
            acked: false,
            may_ack: false,
            retransmit_count: 0,
            client_op: Some(client_op),
            prev: None,
            this_old,
            this_new,
            next,
        };
        self.pending.push_back(record);
        Ok(self.forward_actions(version, op, next))
    }

    /// A non-head replica received CHAIN_PUT/CHAIN_DEL for `version` from
    /// `from` (spec §4.G, "Receiving CHAIN_PUT/CHAIN_DEL at a non-head
    /// replica").
    pub fn receive_chain_write(
        &mut self,
        version: Version,
        op: PendingOp,
        from: VirtualServerId,
        expected_prev: VirtualServerId,
        this_old: VirtualServerId,
        this_new: VirtualServerId,
        next: NextHop,
    ) -> Result<Vec<Action>, InvariantViolation> {
        if version.0 <= self.version_on_disk.0 {
            return Ok(vec![Action::SendAck { to: from, version, key: self.key.clone() }]);
        }
        if self.pending.iter().any(|p| p.version == version) {
            // Already enqueued: idempotent replay, nothing new to do.
            return Ok(Vec::new());
        }
        if version != self.expected_next() {
            // A gap relative to the last pending (or on-disk) version:
            // hold rather than apply out of sequence, and replay it once
            // the missing predecessor closes the gap.
            self.deferred_writes.insert(version, DeferredWrite { op, from, expected_prev, this_old, this_new, next });
            return Ok(Vec::new());
        }
        if from != expected_prev {
            return Err(InvariantViolation::new(format!(
                "chain write for version {version} arrived from {from}, expected prev {expected_prev}"
            )));
        }

        let mut actions = self.accept_contiguous_write(version, op, from, this_old, this_new, next);
        actions.extend(self.replay_deferred_writes()?);
        Ok(actions)
    }

    /// Pushes a pending record for a write already known to immediately
    /// follow this replica's history, and emits its forward/apply/ack
    /// actions. Shared by the in-order path above and by
    /// `replay_deferred_writes` once a held write's gap closes.
    fn accept_contiguous_write(
        &mut self,
        version: Version,
        op: PendingOp,
        from: VirtualServerId,
        this_old: VirtualServerId,
        this_new: VirtualServerId,
        next: NextHop,
    ) -> Vec<Action> {
        let fresh = self.version_on_disk.is_absent() && self.pending.is_empty();
        let is_tail = matches!(next, NextHop::None);
        let record = PendingRecord {
            version,
            op: op.clone(),
            fresh,
            acked: is_tail,
            may_ack: is_tail,
            retransmit_count: 0,
            client_op: None,
            prev: Some(from),
            this_old,
            this_new,
            next,
        };
        self.pending.push_back(record);

        let mut actions = self.forward_actions(version, op.clone(), next);
        if is_tail {
            actions.push(Action::ApplyToRegion { version, op });
            actions.push(Action::SendAck { to: from, version, key: self.key.clone() });
        }
        actions
    }

    /// Drains `deferred_writes` in order as long as each one now
    /// immediately follows this replica's history, the same way
    /// `replay_deferred_acks` drains `deferred_acks`.
    fn replay_deferred_writes(&mut self) -> Result<Vec<Action>, InvariantViolation> {
        let mut actions = Vec::new();
        loop {
            let expected = self.expected_next();
            let Some(deferred) = self.deferred_writes.remove(&expected) else { break };
            if deferred.from != deferred.expected_prev {
                return Err(InvariantViolation::new(format!(
                    "deferred chain write for version {expected} arrived from {}, expected prev {}",
                    deferred.from, deferred.expected_prev
                )));
            }
            actions.extend(self.accept_contiguous_write(expected, deferred.op, deferred.from, deferred.this_old, deferred.this_new, deferred.next));
        }
        Ok(actions)
    }

    /// Re-sends the oldest still-pending record's forward message to its
    /// `next` hop, bumping its retransmit counter (spec §5's periodic
    /// retransmission task; `PendingRecord::retransmit_count` is the
    /// per-record bound it enforces). Returns `None` once this replica
    /// is the chain tail for that record (nothing further to forward) or
    /// the record has already been retried `max_retransmits` times.
    pub fn retransmit_head(&mut self, max_retransmits: u32) -> Option<(VirtualServerId, Action)> {
        let record = self.pending.front_mut()?;
        if record.retransmit_count >= max_retransmits {
            return None;
        }
        let (version, fresh, op, this_new) = (record.version, record.fresh, record.op.clone(), record.this_new);
        let action = match record.next {
            NextHop::Chain(to) => match op {
                PendingOp::Put(values) => Action::ForwardPut { to, version, fresh, key: self.key.clone(), values },
                PendingOp::Del => Action::ForwardDel { to, version, key: self.key.clone() },
            },
            NextHop::Subspace { to, from_region, to_region } => match op {
                PendingOp::Put(values) => Action::ForwardSubspace { to, version, key: self.key.clone(), values, from_region, to_region },
                PendingOp::Del => Action::ForwardDel { to, version, key: self.key.clone() },
            },
            NextHop::None => return None,
        };
        record.retransmit_count += 1;
        Some((this_new, action))
    }

    fn forward_actions(&self, version: Version, op: PendingOp, next: NextHop) -> Vec<Action> {
        match next {
            NextHop::None => Vec::new(),
            NextHop::Chain(to) => match op {
                PendingOp::Put(values) => {
                    let fresh = self.pending.back().map(|p| p.fresh).unwrap_or(false);
                    vec![Action::ForwardPut { to, version, fresh, key: self.key.clone(), values }]
                }
                PendingOp::Del => vec![Action::ForwardDel { to, version, key: self.key.clone() }],
            },
            NextHop::Subspace { to, from_region, to_region } => match op {
                PendingOp::Put(values) => {
                    vec![Action::ForwardSubspace { to, version, key: self.key.clone(), values, from_region, to_region }]
                }
                PendingOp::Del => vec![Action::ForwardDel { to, version, key: self.key.clone() }],
            },
        }
    }

    /// CHAIN_ACK for `version` arrived from `from_next` (spec §4.G,
    /// "Receiving CHAIN_ACK"). Returns `Err(AckDeferred)` when an earlier
    /// pending version at this replica has not yet been acked itself —
    /// the caller should hold the ack and retry it via
    /// [`Keyholder::replay_deferred_acks`] once that happens.
    pub fn receive_ack(&mut self, version: Version, is_point_leader: bool) -> Result<Vec<Action>, AckDeferred> {
        if version.0 <= self.version_on_disk.0 {
            return Ok(Vec::new()); // idempotent late retransmit
        }
        if !self.earlier_all_may_ack(version) {
            self.deferred_acks.insert(version);
            return Err(AckDeferred);
        }
        let Some(record) = self.find_mut(version) else {
            return Ok(Vec::new());
        };
        record.may_ack = true;
        record.acked = true;
        let op = record.op.clone();
        let prev = record.prev;
        let client_op = record.client_op;
        let next = record.next;

        let mut actions = vec![Action::ApplyToRegion { version, op }];
        if is_point_leader {
            if let Some(handle) = client_op {
                actions.push(Action::RespondClient { handle, status: StatusCode::Success, version });
            }
            if let NextHop::Chain(to) | NextHop::Subspace { to, .. } = next {
                actions.push(Action::SendPending { to, version, key: self.key.clone() });
            }
        } else if let Some(prev) = prev {
            actions.push(Action::SendAck { to: prev, version, key: self.key.clone() });
        }
        actions.extend(self.replay_deferred_acks(is_point_leader));
        Ok(actions)
    }

    fn replay_deferred_acks(&mut self, is_point_leader: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        loop {
            let Some(&next_version) = self.deferred_acks.iter().next() else { break };
            if !self.earlier_all_may_ack(next_version) {
                break;
            }
            self.deferred_acks.remove(&next_version);
            match self.receive_ack(next_version, is_point_leader) {
                Ok(more) => actions.extend(more),
                Err(AckDeferred) => break,
            }
        }
        actions
    }

    /// CHAIN_PENDING for `version` retires this replica's pending record
    /// and advances `version_on_disk`, forwarding the confirmation
    /// further down the chain (spec §4.G, "Emit CHAIN_PENDING forward
    /// along the chain so every replica may retire its pending record").
    pub fn receive_pending(&mut self, version: Version) -> Vec<Action> {
        if version.0 <= self.version_on_disk.0 {
            return Vec::new();
        }
        let Some(pos) = self.pending.iter().position(|p| p.version == version) else {
            return Vec::new();
        };
        let record = self.pending.remove(pos).expect("position just found");
        self.version_on_disk = version;

        match record.next {
            NextHop::Chain(to) | NextHop::Subspace { to, .. } => {
                vec![Action::SendPending { to, version, key: self.key.clone() }]
            }
            NextHop::None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdex_ids::{RegionId, SpaceId, SubspaceId};

    fn entity(index: u8) -> VirtualServerId {
        VirtualServerId::new(RegionId::new(SubspaceId::key_subspace(SpaceId::new(1)), 0, 0), index)
    }

    fn client_op() -> ClientOpHandle {
        ClientOpHandle { nonce: 1, origin: entity(0) }
    }

    #[test]
    fn a_three_replica_chain_commits_and_retires() {
        let mut head = Keyholder::new(b"k".to_vec(), Version::ABSENT);
        let mut mid = Keyholder::new(b"k".to_vec(), Version::ABSENT);
        let mut tail = Keyholder::new(b"k".to_vec(), Version::ABSENT);

        let actions = head
            .begin_client_write(
                Version(1),
                PendingOp::Put(vec![b"v".to_vec()]),
                entity(0),
                entity(0),
                NextHop::Chain(entity(1)),
                client_op(),
            )
            .unwrap();
        assert_matches::assert_matches!(actions.as_slice(), [Action::ForwardPut { .. }]);

        let actions = mid
            .receive_chain_write(
                Version(1),
                PendingOp::Put(vec![b"v".to_vec()]),
                entity(0),
                entity(0),
                entity(1),
                entity(1),
                NextHop::Chain(entity(2)),
            )
            .unwrap();
        assert_matches::assert_matches!(actions.as_slice(), [Action::ForwardPut { .. }]);

        let actions = tail
            .receive_chain_write(
                Version(1),
                PendingOp::Put(vec![b"v".to_vec()]),
                entity(1),
                entity(1),
                entity(2),
                entity(2),
                NextHop::None,
            )
            .unwrap();
        // Tail has no next: applies and acks immediately.
        assert!(actions.iter().any(|a| matches!(a, Action::ApplyToRegion { .. })));
        assert!(actions.iter().any(|a| matches!(a, Action::SendAck { .. })));

        let actions = mid.receive_ack(Version(1), false).unwrap();
        assert!(actions.iter().any(|a| matches!(a, Action::SendAck { to, .. } if *to == entity(0))));

        let actions = head.receive_ack(Version(1), true).unwrap();
        assert!(actions.iter().any(|a| matches!(a, Action::RespondClient { status: StatusCode::Success, .. })));
        assert!(actions.iter().any(|a| matches!(a, Action::SendPending { .. })));

        let actions = head.receive_pending(Version(1));
        assert_eq!(head.version_on_disk, Version(1));
        assert!(head.pending_versions().is_empty());
        assert!(actions.iter().any(|a| matches!(a, Action::SendPending { to, .. } if *to == entity(1))));

        let actions = mid.receive_pending(Version(1));
        assert_eq!(mid.version_on_disk, Version(1));
        assert!(actions.iter().any(|a| matches!(a, Action::SendPending { to, .. } if *to == entity(2))));

        tail.receive_pending(Version(1));
        assert_eq!(tail.version_on_disk, Version(1));
    }

    #[test]
    fn replaying_a_version_already_on_disk_is_a_noop_ack() {
        let mut replica = Keyholder::new(b"k".to_vec(), Version(5));
        let actions = replica
            .receive_chain_write(
                Version(3),
                PendingOp::Put(vec![b"v".to_vec()]),
                entity(0),
                entity(0),
                entity(1),
                entity(1),
                NextHop::None,
            )
            .unwrap();
        assert_matches::assert_matches!(actions.as_slice(), [Action::SendAck { version: Version(3), .. }]);
    }

    #[test]
    fn an_ack_from_an_unexpected_sender_is_an_invariant_violation() {
        let mut replica = Keyholder::new(b"k".to_vec(), Version::ABSENT);
        let err = replica
            .receive_chain_write(
                Version(1),
                PendingOp::Put(vec![b"v".to_vec()]),
                entity(9),
                entity(1),
                entity(1),
                entity(1),
                NextHop::None,
            )
            .unwrap_err();
        assert!(err.0.contains("expected prev"));
    }

    #[test]
    fn out_of_order_acks_are_deferred_until_earlier_versions_settle() {
        let mut replica = Keyholder::new(b"k".to_vec(), Version::ABSENT);
        replica
            .receive_chain_write(Version(1), PendingOp::Put(vec![b"a".to_vec()]), entity(0), entity(0), entity(1), entity(1), NextHop::Chain(entity(2)))
            .unwrap();
        replica
            .receive_chain_write(Version(2), PendingOp::Put(vec![b"b".to_vec()]), entity(0), entity(0), entity(1), entity(1), NextHop::Chain(entity(2)))
            .unwrap();

        let err = replica.receive_ack(Version(2), false).unwrap_err();
        assert_matches::assert_matches!(err, AckDeferred);

        let actions = replica.receive_ack(Version(1), false).unwrap();
        // Processing version 1's ack should also replay the deferred ack for version 2.
        let applied: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                Action::ApplyToRegion { version, .. } => Some(*version),
                _ => None,
            })
            .collect();
        assert_eq!(applied, vec![Version(1), Version(2)]);
    }

    #[test]
    fn a_chain_write_ahead_of_its_predecessor_is_deferred_until_the_gap_closes() {
        let mut replica = Keyholder::new(b"k".to_vec(), Version::ABSENT);
        // Version 2 arrives before version 1: held, not applied out of order.
        let actions = replica
            .receive_chain_write(Version(2), PendingOp::Put(vec![b"b".to_vec()]), entity(0), entity(0), entity(1), entity(1), NextHop::None)
            .unwrap();
        assert!(actions.is_empty());
        assert!(replica.pending_versions().is_empty());
        assert!(!replica.is_idle());

        let actions = replica
            .receive_chain_write(Version(1), PendingOp::Put(vec![b"a".to_vec()]), entity(0), entity(0), entity(1), entity(1), NextHop::None)
            .unwrap();
        // Accepting version 1 should also replay the deferred version 2 write.
        let applied: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                Action::ApplyToRegion { version, .. } => Some(*version),
                _ => None,
            })
            .collect();
        assert_eq!(applied, vec![Version(1), Version(2)]);
        assert_eq!(replica.pending_versions(), vec![Version(1), Version(2)]);
    }

    #[test]
    fn a_single_replica_chain_commits_a_client_write_immediately() {
        let mut solo = Keyholder::new(b"k".to_vec(), Version::ABSENT);
        let actions = solo
            .begin_client_write(Version(1), PendingOp::Put(vec![b"v".to_vec()]), entity(0), entity(0), NextHop::None, client_op())
            .unwrap();
        assert!(actions.iter().any(|a| matches!(a, Action::ApplyToRegion { version: Version(1), .. })));
        assert!(actions.iter().any(|a| matches!(a, Action::RespondClient { status: StatusCode::Success, .. })));
        assert_eq!(solo.version_on_disk, Version(1));
        assert!(solo.pending_versions().is_empty());
    }
}
