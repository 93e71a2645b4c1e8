//! The keyholder table (spec §5: "Keyholders: stripe-lock partitioned;
//! bucket count large enough that contention is per-key rather than
//! global"). No file in the example pack shows this exact pattern, so the
//! stripe count and hashing scheme follow the spec's own description
//! directly: enough stripes that two unrelated keys essentially never
//! collide on the same lock, while a single hot key is still serialized
//! through exactly one `Mutex`.

use crate::keyholder::{Action, Keyholder};
use hyperdex_ids::{RegionId, Version, VirtualServerId};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Default stripe count: a power of two comfortably larger than any single
/// host's expected concurrent hot-key count, so stripe collisions stay
/// rare without the table needing to grow at runtime.
pub const DEFAULT_STRIPES: usize = 1024;

type Bucket = Mutex<HashMap<(RegionId, Vec<u8>), Keyholder>>;

pub struct KeyholderTable {
    stripes: Vec<Bucket>,
}

impl KeyholderTable {
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }

    pub fn with_stripes(stripes: usize) -> Self {
        let stripes = stripes.max(1);
        KeyholderTable { stripes: (0..stripes).map(|_| Mutex::new(HashMap::new())).collect() }
    }

    fn stripe_for(&self, region: RegionId, key: &[u8]) -> &Bucket {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        region.hash(&mut hasher);
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.stripes.len();
        &self.stripes[index]
    }

    /// Locks the stripe owning `(region, key)` and hands back the guard
    /// plus the map key, so a caller can look up, insert, or remove the
    /// keyholder while holding the lock for the whole transition.
    pub fn lock(&self, region: RegionId, key: &[u8]) -> StripeGuard<'_> {
        let guard = self.stripe_for(region, key).lock();
        StripeGuard { guard, region, key: key.to_vec() }
    }

    /// Scans every stripe for a key whose oldest pending record is due a
    /// retransmit (spec §5's periodic retransmission task), returning the
    /// region, key, sending entity, and forward action for each. Locks
    /// one stripe at a time, so this never holds more than one bucket's
    /// worth of keys locked at once.
    pub fn retransmit_round(&self, max_retransmits: u32) -> Vec<(RegionId, Vec<u8>, VirtualServerId, Action)> {
        let mut out = Vec::new();
        for stripe in &self.stripes {
            let mut bucket = stripe.lock();
            for ((region, key), keyholder) in bucket.iter_mut() {
                if let Some((this_new, action)) = keyholder.retransmit_head(max_retransmits) {
                    out.push((*region, key.clone(), this_new, action));
                }
            }
        }
        out
    }
}

impl Default for KeyholderTable {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StripeGuard<'a> {
    guard: MutexGuard<'a, HashMap<(RegionId, Vec<u8>), Keyholder>>,
    region: RegionId,
    key: Vec<u8>,
}

impl<'a> StripeGuard<'a> {
    /// The keyholder for this key, creating one with `version_on_disk`
    /// absent if none exists yet.
    pub fn entry(&mut self) -> &mut Keyholder {
        self.guard
            .entry((self.region, self.key.clone()))
            .or_insert_with(|| Keyholder::new(self.key.clone(), Version::ABSENT))
    }

    /// The keyholder for this key, creating one at `version_on_disk` if
    /// none exists — used when a keyholder is first touched by a replay
    /// of an already-flushed shard record rather than a fresh write.
    pub fn entry_at(&mut self, version_on_disk: Version) -> &mut Keyholder {
        self.guard
            .entry((self.region, self.key.clone()))
            .or_insert_with(|| Keyholder::new(self.key.clone(), version_on_disk))
    }

    pub fn get(&self) -> Option<&Keyholder> {
        self.guard.get(&(self.region, self.key.clone()))
    }

    /// Drops the keyholder once it has no pending records left: a quiesced
    /// key shouldn't hold a table slot (and its stripe lock's hash bucket)
    /// forever.
    pub fn evict_if_idle(&mut self) {
        if let Some(kh) = self.guard.get(&(self.region, self.key.clone())) {
            if kh.is_idle() {
                self.guard.remove(&(self.region, self.key.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::{ClientOpHandle, NextHop, PendingOp};
    use hyperdex_ids::{SpaceId, SubspaceId, VirtualServerId};

    fn region() -> RegionId {
        RegionId::new(SubspaceId::key_subspace(SpaceId::new(1)), 0, 0)
    }

    fn entity(index: u8) -> VirtualServerId {
        VirtualServerId::new(region(), index)
    }

    #[test]
    fn distinct_keys_can_be_locked_independently() {
        let table = KeyholderTable::with_stripes(4);
        let mut a = table.lock(region(), b"a");
        let mut b = table.lock(region(), b"b");
        a.entry();
        b.entry();
        assert!(a.get().is_some());
        assert!(b.get().is_some());
    }

    #[test]
    fn a_keyholder_persists_across_separate_lock_calls() {
        let table = KeyholderTable::with_stripes(4);
        {
            let mut guard = table.lock(region(), b"k");
            guard
                .entry()
                .begin_client_write(
                    Version(1),
                    PendingOp::Put(vec![b"v".to_vec()]),
                    entity(0),
                    entity(0),
                    NextHop::None,
                    ClientOpHandle { nonce: 1, origin: entity(0) },
                )
                .unwrap();
        }
        let guard = table.lock(region(), b"k");
        assert_eq!(guard.get().unwrap().pending_versions(), vec![Version(1)]);
    }

    #[test]
    fn retransmit_round_resends_an_unretired_chain_write_and_counts_attempts() {
        let table = KeyholderTable::with_stripes(4);
        {
            let mut guard = table.lock(region(), b"k");
            guard
                .entry()
                .begin_client_write(
                    Version(1),
                    PendingOp::Put(vec![b"v".to_vec()]),
                    entity(0),
                    entity(0),
                    NextHop::Chain(entity(1)),
                    ClientOpHandle { nonce: 1, origin: entity(0) },
                )
                .unwrap();
        }

        let round = table.retransmit_round(3);
        assert_eq!(round.len(), 1);
        let (region_id, key, this_new, action) = &round[0];
        assert_eq!(*region_id, region());
        assert_eq!(key, b"k");
        assert_eq!(*this_new, entity(0));
        assert_matches::assert_matches!(action, Action::ForwardPut { to, version: Version(1), .. } if *to == entity(1));

        // Exhausting the retransmit budget stops further resends.
        table.retransmit_round(3);
        table.retransmit_round(3);
        assert!(table.retransmit_round(3).is_empty());
    }

    #[test]
    fn evict_if_idle_removes_a_keyholder_with_no_pending_records() {
        let table = KeyholderTable::with_stripes(4);
        {
            let mut guard = table.lock(region(), b"k");
            guard.entry();
        }
        {
            let mut guard = table.lock(region(), b"k");
            guard.evict_if_idle();
        }
        let guard = table.lock(region(), b"k");
        assert!(guard.get().is_none());
    }
}
