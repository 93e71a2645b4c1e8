//! Per-host daemon state (spec §2, §5): the configuration currently in
//! force, the region replicas this host is provisioned to serve, the
//! keyholder table driving chain replication, and the transfer/search
//! state a connection's messages thread through. Grounded on
//! `daemon.cc`/`hyperdexd.cc`'s role as the single object tying the
//! storage, replication, transfer, and search layers to one listening
//! socket.

use hyperdex_config::{ConfigVersion, Configuration};
use hyperdex_ids::RegionId;
use hyperdex_network::TcpTransport;
use hyperdex_replication::KeyholderTable;
use hyperdex_search::SearchCursor;
use hyperdex_store::{RegionReplica, RegionReplicaConfig, ShardConfig};
use hyperdex_transfer::{Sink, Source};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The shard geometry newly created region replicas start with. A real
/// deployment would read this from the configuration; nothing in spec
/// §6's `region` record carries shard sizing, so this host-local default
/// stands in, matching `ShardConfig::production`'s role as "the constant
/// a real deployment would tune, not a wire-visible value."
fn default_replica_config() -> RegionReplicaConfig {
    RegionReplicaConfig { initial_shard: ShardConfig::production(), shard_bits: 0 }
}

pub struct Daemon {
    pub host_id: u32,
    pub data_dir: PathBuf,
    pub config: RwLock<Configuration>,
    /// Held while a reconfiguration swap is in flight (spec §5's
    /// pause/unpause barrier): every dispatch thread takes a read lock
    /// before touching `config`/`regions`, so a writer here blocks new
    /// message processing until the swap completes.
    pub reconfigure_barrier: RwLock<()>,
    regions: Mutex<HashMap<RegionId, Arc<RegionReplica>>>,
    pub keyholders: KeyholderTable,
    pub transfer_sinks: Mutex<HashMap<RegionId, Sink>>,
    pub transfer_sources: Mutex<HashMap<RegionId, Source>>,
    pub searches: Mutex<HashMap<u64, SearchCursor>>,
}

impl Daemon {
    pub fn new(host_id: u32, data_dir: PathBuf, config: Configuration) -> Self {
        Daemon {
            host_id,
            data_dir,
            config: RwLock::new(config),
            reconfigure_barrier: RwLock::new(()),
            regions: Mutex::new(HashMap::new()),
            keyholders: KeyholderTable::new(),
            transfer_sinks: Mutex::new(HashMap::new()),
            transfer_sources: Mutex::new(HashMap::new()),
            searches: Mutex::new(HashMap::new()),
        }
    }

    /// The region replica backing `region`, opening or creating it under
    /// `data_dir` on first use. Every entity this host serves shares one
    /// on-disk replica per region regardless of which replica index
    /// (head/mid/tail) it plays, since that index is purely a chain
    /// routing fact, not a storage partition.
    pub fn region_replica(&self, region: RegionId) -> anyhow::Result<Arc<RegionReplica>> {
        let mut regions = self.regions.lock();
        if let Some(replica) = regions.get(&region) {
            return Ok(replica.clone());
        }
        let dir = self.data_dir.join(region_dir_name(region));
        let replica = Arc::new(RegionReplica::create(&dir, default_replica_config())?);
        regions.insert(region, replica.clone());
        Ok(replica)
    }

    /// Every region replica this host has opened so far, for the
    /// background flusher to drain periodically (spec §4.D: "a
    /// background flusher periodically drains the log into shards").
    pub fn open_regions(&self) -> Vec<(RegionId, Arc<RegionReplica>)> {
        self.regions.lock().iter().map(|(region, replica)| (*region, replica.clone())).collect()
    }

    /// Replaces the active configuration, swapping region replicas only
    /// insofar as the table above is keyed by `RegionId` and entries are
    /// created lazily — an old region no longer named by the new
    /// configuration simply stops being looked up, it is never deleted
    /// out from under an in-flight transfer.
    pub fn swap_config(&self, new_version: ConfigVersion, text: &str) -> anyhow::Result<()> {
        let _pause = self.reconfigure_barrier.write();
        let mut config = self.config.write();
        let next = Configuration::parse(new_version, text, Some(&config))?;
        *config = next;
        Ok(())
    }
}

fn region_dir_name(region: RegionId) -> String {
    format!(
        "space-{:08x}-subspace-{}-prefix-{:016x}-{}",
        region.subspace.space.0, region.subspace.subspace, region.prefix, region.prefix_len
    )
}
