//! The pending record (spec §3, §4.G): per-(region, key, version)
//! in-flight state tracked by a keyholder until the chain retires it.

use hyperdex_ids::{RegionId, Version, VirtualServerId};

/// A client request's identity, carried only by the pending record at the
/// point leader so the response can be routed back once the chain
/// retires the write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientOpHandle {
    pub nonce: u64,
    pub origin: VirtualServerId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingOp {
    Put(Vec<Vec<u8>>),
    Del,
}

/// Where this version's chain messages come from and go to. A plain
/// `Chain` hop stays within one region's replica chain; `Subspace` marks
/// the hop that crosses from the old region's tail into the new region's
/// head when an attribute change moves the key (spec §4.G "Cross-subspace
/// handoff").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextHop {
    Chain(VirtualServerId),
    Subspace { to: VirtualServerId, from_region: RegionId, to_region: RegionId },
    None,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRecord {
    pub version: Version,
    pub op: PendingOp,
    /// The predecessor state was "absent" (spec glossary: "Fresh").
    pub fresh: bool,
    /// This replica has sent CHAIN_ACK upstream for this version.
    pub acked: bool,
    /// Incoming ACKs for this version are permitted: every earlier
    /// pending version at this replica has already been acked, or this
    /// is the point leader's own origination (spec §4.G step — "may_ack
    /// permitted").
    pub may_ack: bool,
    pub retransmit_count: u32,
    pub client_op: Option<ClientOpHandle>,
    pub prev: Option<VirtualServerId>,
    pub this_old: VirtualServerId,
    pub this_new: VirtualServerId,
    pub next: NextHop,
}

impl PendingRecord {
    pub fn is_put(&self) -> bool {
        matches!(self.op, PendingOp::Put(_))
    }
}
