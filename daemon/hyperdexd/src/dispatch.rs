//! Turns one decoded inbound envelope into the appropriate handler call
//! (spec §4.F "dispatch by message type"): client GET/PUT/DEL, the
//! CHAIN_* replication messages, the XFER_* transfer messages, and the
//! REQ_SEARCH_* family. Grounded on `hyperdex-replication`'s `Action`
//! vocabulary and `hyperdex-transfer`'s `Sink`/`Source` — this module's
//! own job is entirely translation: decode a payload, drive the pure
//! state machine underneath it, turn the result back into sends.

use crate::daemon::Daemon;
use crate::hashing;
use crate::search_wire::{ReqSearchNext, ReqSearchStart, ReqSearchStop};
use hyperdex_config::{Configuration, Space, Subspace};
use hyperdex_error::StatusCode;
use hyperdex_ids::{RegionId, Version, VirtualServerId};
use hyperdex_network::{
    ByteTransport, ChainDel, ChainPut, ChainSubspace, ChainVersionedKey, Envelope, MessageType, ReqDel, ReqGet,
    ReqPut, RespGet, RespSearchItem, RespStatus, TcpTransport, XferData,
};
use hyperdex_replication::{apply_pending_op, Action, ClientOpHandle, Keyholder, NextHop, PendingOp, StripeGuard};
use hyperdex_store::RegionReplica;
use hyperdex_transfer::{HeldWrite, Sink, SinkAction, Source};
use std::net::SocketAddr;
use std::sync::Arc;

/// The keyholder for `key`, seeded from the region's own durable version
/// the first time it is touched (table.rs's `entry_at`) rather than from
/// `Version::ABSENT`. A keyholder is evicted from the table as soon as it
/// quiesces (`evict_if_idle`), so the very next write to an idle key has
/// to rediscover `version_on_disk` from the shard/log instead of assuming
/// it starts the key's history over.
fn seeded_entry<'a>(guard: &'a mut StripeGuard<'_>, replica: &RegionReplica, key: &[u8], key_hash: u64) -> &'a mut Keyholder {
    let version_on_disk = match replica.get(key, key_hash) {
        Ok((version, _)) => version,
        Err(_) => Version::ABSENT,
    };
    guard.entry_at(version_on_disk)
}

/// Processes one inbound envelope under the reconfiguration barrier (spec
/// §5): a configuration swap can't land mid-dispatch, and a message
/// addressed under a configuration this host no longer recognizes is
/// rejected rather than misrouted.
pub fn dispatch(daemon: &Arc<Daemon>, transport: &Arc<TcpTransport>, envelope: Envelope) {
    let _pause = daemon.reconfigure_barrier.read();
    let config = daemon.config.read();

    let msg_version = hyperdex_config::ConfigVersion(envelope.version_to as u64);
    if !config.accepts_message(msg_version, envelope.to, daemon.host_id) {
        reject_stale(transport, &config, &envelope);
        return;
    }

    let result = match envelope.msg_type {
        MessageType::ReqGet => handle_req_get(daemon, transport, &config, &envelope),
        MessageType::ReqPut => handle_req_put(daemon, transport, &config, &envelope),
        MessageType::ReqDel => handle_req_del(daemon, transport, &config, &envelope),
        MessageType::ChainPut => handle_chain_put(daemon, transport, &config, &envelope),
        MessageType::ChainDel => handle_chain_del(daemon, transport, &config, &envelope),
        MessageType::ChainSubspace => handle_chain_subspace(daemon, transport, &config, &envelope),
        MessageType::ChainAck => handle_chain_ack(daemon, transport, &config, &envelope),
        MessageType::ChainPending => handle_chain_pending(daemon, transport, &config, &envelope),
        MessageType::XferMore => handle_xfer_more(daemon, transport, &config, &envelope),
        MessageType::XferData => handle_xfer_data(daemon, transport, &config, &envelope),
        MessageType::XferDone => handle_xfer_done(daemon, transport, &config, &envelope),
        MessageType::ReqSearchStart => handle_search_start(daemon, transport, &config, &envelope),
        MessageType::ReqSearchNext => handle_search_next(daemon, transport, &config, &envelope),
        MessageType::ReqSearchStop => handle_search_stop(daemon, &envelope),
        other => {
            tracing::warn!(?other, "no inbound handler accepts this message type");
            Ok(())
        }
    };
    if let Err(err) = result {
        tracing::warn!(%err, msg_type = ?envelope.msg_type, "dropping message after a handler error");
    }
}

/// Drives spec §5's periodic retransmission task: resends the oldest
/// still-pending chain forward for every key that hasn't heard back
/// within `max_retransmits` attempts, under the same reconfiguration
/// barrier and `Configuration` snapshot a live dispatch would use.
pub fn retransmit_pending(daemon: &Arc<Daemon>, transport: &Arc<TcpTransport>, max_retransmits: u32) {
    let _pause = daemon.reconfigure_barrier.read();
    let config = daemon.config.read();
    for (region, key, this_entity, action) in daemon.keyholders.retransmit_round(max_retransmits) {
        if let Err(err) = apply_actions(daemon, transport, &config, region, &key, this_entity, vec![action]) {
            tracing::warn!(%err, region = %region, "retransmit failed");
        }
    }
}

fn reject_stale(transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) {
    let nonce = match envelope.msg_type {
        MessageType::ReqGet => ReqGet::decode(&envelope.payload).ok().map(|m| m.nonce),
        MessageType::ReqPut => ReqPut::decode(&envelope.payload).ok().map(|m| m.nonce),
        MessageType::ReqDel => ReqDel::decode(&envelope.payload).ok().map(|m| m.nonce),
        MessageType::ReqSearchStart => ReqSearchStart::decode(&envelope.payload).ok().map(|m| m.nonce),
        MessageType::ReqSearchNext => ReqSearchNext::decode(&envelope.payload).ok().map(|m| m.nonce),
        _ => None,
    };
    let Some(nonce) = nonce else {
        // A stale chain/transfer message: the sender will retransmit once
        // its own configuration catches up (spec §5's retransmission
        // loop); nothing to reply to here.
        return;
    };
    let resp = RespStatus { nonce, status: StatusCode::Reconfigure };
    send(transport, config, envelope.to, envelope.from, MessageType::RespStatus, resp.encode());
}

fn send(transport: &Arc<TcpTransport>, config: &Configuration, from: VirtualServerId, to: VirtualServerId, msg_type: MessageType, payload: Vec<u8>) {
    let Some(host) = config.instance_of(to) else {
        tracing::warn!(%to, "no host currently serves this entity; dropping send");
        return;
    };
    let addr = SocketAddr::new(host.ip, host.inbound_port);
    let version = config.version.0 as u16;
    let envelope = Envelope::new(msg_type, version, version, from, to, payload);
    if let Err(err) = transport.send(addr, &envelope) {
        tracing::warn!(%err, %to, "send failed");
    }
}

fn space_and_subspace<'a>(config: &'a Configuration, region: RegionId) -> anyhow::Result<(&'a Space, &'a Subspace)> {
    let space = config
        .space_by_id(region.space())
        .ok_or_else(|| anyhow::anyhow!("unknown space for region {region}"))?;
    let subspace = config
        .subspace(region.subspace)
        .ok_or_else(|| anyhow::anyhow!("unknown subspace for region {region}"))?;
    Ok((space, subspace))
}

/// The `NextHop` a write at `at` should take: another hop within the same
/// region's chain, or — once the tail is reached — the head of the next
/// subspace's region the new (or, for a delete, the still-current) values
/// hash into (spec §4.G "Cross-subspace handoff").
fn next_hop(config: &Configuration, at: VirtualServerId, space: &Space, key: &[u8], values: &[Vec<u8>]) -> anyhow::Result<NextHop> {
    if let Some(next) = config.next(at) {
        return Ok(NextHop::Chain(next));
    }
    let kinds = space.attr_kinds();
    let mut refs: Vec<&[u8]> = Vec::with_capacity(kinds.len());
    refs.push(key);
    refs.extend(values.iter().map(|v| v.as_slice()));
    match config.chain_next_subspace(&space.name, at.region.subspace.subspace, &kinds, &refs)? {
        Some(new_head) => Ok(NextHop::Subspace { to: new_head, from_region: at.region, to_region: new_head.region }),
        None => Ok(NextHop::None),
    }
}

/// Turns a keyholder transition's `Action`s into sends and storage
/// applies. `key` backs the one `Action::ApplyToRegion` case, which
/// doesn't carry its own key (every other action already does).
fn apply_actions(
    daemon: &Daemon,
    transport: &Arc<TcpTransport>,
    config: &Configuration,
    local_region: RegionId,
    key: &[u8],
    this_entity: VirtualServerId,
    actions: Vec<Action>,
) -> anyhow::Result<()> {
    for action in actions {
        match action {
            Action::ForwardPut { to, version, fresh, key, values } => {
                let msg = ChainPut { version, fresh, key, values };
                send(transport, config, this_entity, to, MessageType::ChainPut, msg.encode());
            }
            Action::ForwardDel { to, version, key } => {
                let msg = ChainDel { version, key };
                send(transport, config, this_entity, to, MessageType::ChainDel, msg.encode());
            }
            Action::ForwardSubspace { to, version, key, values, from_region, to_region } => {
                let msg = ChainSubspace { version, key, values, from_region, to_region };
                send(transport, config, this_entity, to, MessageType::ChainSubspace, msg.encode());
            }
            Action::SendAck { to, version, key } => {
                let msg = ChainVersionedKey { version, key };
                send(transport, config, this_entity, to, MessageType::ChainAck, msg.encode());
            }
            Action::SendPending { to, version, key } => {
                let msg = ChainVersionedKey { version, key };
                send(transport, config, this_entity, to, MessageType::ChainPending, msg.encode());
            }
            Action::ApplyToRegion { version, op } => {
                let replica = daemon.region_replica(local_region)?;
                let (space, subspace) = space_and_subspace(config, local_region)?;
                let key_hash = hashing::key_hash(space, key);
                let search_hash = match &op {
                    PendingOp::Put(values) => hashing::search_hash(space, subspace, key, values),
                    PendingOp::Del => 0,
                };
                apply_pending_op(&replica, key, key_hash, search_hash, version, &op);
            }
            Action::RespondClient { handle, status, version: _ } => {
                let resp = RespStatus { nonce: handle.nonce, status };
                send(transport, config, this_entity, handle.origin, MessageType::RespStatus, resp.encode());
            }
        }
    }
    Ok(())
}

fn handle_req_get(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let req = ReqGet::decode(&envelope.payload)?;
    let region = envelope.to.region;
    let (space, _subspace) = space_and_subspace(config, region)?;
    let key_hash = hashing::key_hash(space, &req.key);
    let replica = daemon.region_replica(region)?;
    let resp = match replica.get(&req.key, key_hash) {
        Ok((_version, values)) => RespGet { nonce: req.nonce, status: StatusCode::Success, values },
        Err(e) => RespGet { nonce: req.nonce, status: e.into(), values: Vec::new() },
    };
    send(transport, config, envelope.to, envelope.from, MessageType::RespGet, resp.encode());
    Ok(())
}

fn handle_req_put(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let req = ReqPut::decode(&envelope.payload)?;
    let region = envelope.to.region;
    let (space, _subspace) = space_and_subspace(config, region)?;
    let next = next_hop(config, envelope.to, space, &req.key, &req.values)?;
    let replica = daemon.region_replica(region)?;
    let key_hash = hashing::key_hash(space, &req.key);

    let mut guard = daemon.keyholders.lock(region, &req.key);
    let kh = seeded_entry(&mut guard, &replica, &req.key, key_hash);
    let version = kh.pending_versions().last().map(|v| v.next()).unwrap_or_else(|| kh.version_on_disk.next());
    let client_op = ClientOpHandle { nonce: req.nonce, origin: envelope.from };
    let actions = kh.begin_client_write(version, PendingOp::Put(req.values.clone()), envelope.to, envelope.to, next, client_op)?;
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &req.key, envelope.to, actions)
}

fn handle_req_del(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let req = ReqDel::decode(&envelope.payload)?;
    let region = envelope.to.region;
    let (space, _subspace) = space_and_subspace(config, region)?;
    let replica = daemon.region_replica(region)?;
    let key_hash = hashing::key_hash(space, &req.key);
    let current_values = match replica.get(&req.key, key_hash) {
        Ok((_version, values)) => values,
        Err(_) => {
            let resp = RespStatus { nonce: req.nonce, status: StatusCode::NotFound };
            send(transport, config, envelope.to, envelope.from, MessageType::RespStatus, resp.encode());
            return Ok(());
        }
    };
    let next = next_hop(config, envelope.to, space, &req.key, &current_values)?;

    let mut guard = daemon.keyholders.lock(region, &req.key);
    let kh = seeded_entry(&mut guard, &replica, &req.key, key_hash);
    let version = kh.pending_versions().last().map(|v| v.next()).unwrap_or_else(|| kh.version_on_disk.next());
    let client_op = ClientOpHandle { nonce: req.nonce, origin: envelope.from };
    let actions = kh.begin_client_write(version, PendingOp::Del, envelope.to, envelope.to, next, client_op)?;
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &req.key, envelope.to, actions)
}

/// True while `region` has an inbound transfer that hasn't yet seen
/// `XFER_DONE` (spec §4.H step 5): a chain write arriving in that window
/// is held rather than applied, since the snapshot backing the transfer
/// may or may not already cover it.
fn holds_for_transfer(daemon: &Daemon, region: RegionId, write: HeldWrite) -> bool {
    let mut sinks = daemon.transfer_sinks.lock();
    match sinks.get_mut(&region) {
        Some(sink) if !sink.is_done() => {
            sink.hold(write);
            true
        }
        _ => false,
    }
}

fn handle_chain_put(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let msg = ChainPut::decode(&envelope.payload)?;
    let region = envelope.to.region;
    if holds_for_transfer(
        daemon,
        region,
        HeldWrite { from: envelope.from, version: msg.version, key: msg.key.clone(), op: PendingOp::Put(msg.values.clone()) },
    ) {
        return Ok(());
    }
    let (space, _subspace) = space_and_subspace(config, region)?;
    let next = next_hop(config, envelope.to, space, &msg.key, &msg.values)?;
    let expected_prev = config.prev(envelope.to).unwrap_or(envelope.from);
    let replica = daemon.region_replica(region)?;
    let key_hash = hashing::key_hash(space, &msg.key);

    let mut guard = daemon.keyholders.lock(region, &msg.key);
    let kh = seeded_entry(&mut guard, &replica, &msg.key, key_hash);
    let actions = kh.receive_chain_write(msg.version, PendingOp::Put(msg.values.clone()), envelope.from, expected_prev, envelope.from, envelope.to, next)?;
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &msg.key, envelope.to, actions)
}

fn handle_chain_del(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let msg = ChainDel::decode(&envelope.payload)?;
    let region = envelope.to.region;
    if holds_for_transfer(daemon, region, HeldWrite { from: envelope.from, version: msg.version, key: msg.key.clone(), op: PendingOp::Del }) {
        return Ok(());
    }
    let (space, _subspace) = space_and_subspace(config, region)?;
    let replica = daemon.region_replica(region)?;
    let key_hash = hashing::key_hash(space, &msg.key);
    // The chain's own replicated copy of the current values, needed only
    // to route a cross-subspace hop at the tail; a plain within-chain hop
    // never looks at them.
    let current_values = replica.get(&msg.key, key_hash).map(|(_, v)| v).unwrap_or_default();
    let next = next_hop(config, envelope.to, space, &msg.key, &current_values)?;
    let expected_prev = config.prev(envelope.to).unwrap_or(envelope.from);

    let mut guard = daemon.keyholders.lock(region, &msg.key);
    let kh = seeded_entry(&mut guard, &replica, &msg.key, key_hash);
    let actions = kh.receive_chain_write(msg.version, PendingOp::Del, envelope.from, expected_prev, envelope.from, envelope.to, next)?;
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &msg.key, envelope.to, actions)
}

fn handle_chain_subspace(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let msg = ChainSubspace::decode(&envelope.payload)?;
    let region = envelope.to.region;
    let (space, _subspace) = space_and_subspace(config, region)?;
    let next = next_hop(config, envelope.to, space, &msg.key, &msg.values)?;
    let replica = daemon.region_replica(region)?;
    let key_hash = hashing::key_hash(space, &msg.key);

    let mut guard = daemon.keyholders.lock(region, &msg.key);
    let kh = seeded_entry(&mut guard, &replica, &msg.key, key_hash);
    // A cross-subspace arrival always comes from the old region's tail;
    // there is no intra-region `prev` to check it against.
    let actions = kh.receive_chain_write(msg.version, PendingOp::Put(msg.values.clone()), envelope.from, envelope.from, envelope.from, envelope.to, next)?;
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &msg.key, envelope.to, actions)
}

fn handle_chain_ack(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let msg = ChainVersionedKey::decode(&envelope.payload)?;
    let region = envelope.to.region;
    let is_point_leader = envelope.to.is_point_leader();

    let mut guard = daemon.keyholders.lock(region, &msg.key);
    let kh = guard.entry();
    let actions = match kh.receive_ack(msg.version, is_point_leader) {
        Ok(actions) => actions,
        Err(_deferred) => Vec::new(),
    };
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &msg.key, envelope.to, actions)
}

fn handle_chain_pending(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let msg = ChainVersionedKey::decode(&envelope.payload)?;
    let region = envelope.to.region;

    let mut guard = daemon.keyholders.lock(region, &msg.key);
    let kh = guard.entry();
    let actions = kh.receive_pending(msg.version);
    guard.evict_if_idle();
    drop(guard);

    apply_actions(daemon, transport, config, region, &msg.key, envelope.to, actions)
}

fn handle_xfer_more(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let region = envelope.to.region;
    let mut sources = daemon.transfer_sources.lock();
    if !sources.contains_key(&region) {
        let replica = daemon.region_replica(region)?;
        sources.insert(region, Source::new(replica.snapshot()));
    }
    let source = sources.get_mut(&region).expect("just inserted above");
    match source.next_message() {
        Some(data) => send(transport, config, envelope.to, envelope.from, MessageType::XferData, data.encode()),
        None => send(transport, config, envelope.to, envelope.from, MessageType::XferDone, Vec::new()),
    }
    Ok(())
}

fn handle_xfer_data(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let msg = XferData::decode(&envelope.payload)?;
    let region = envelope.to.region;
    let (space, subspace) = space_and_subspace(config, region)?;
    let key_hash = hashing::key_hash(space, &msg.key);
    let search_hash = hashing::search_hash(space, subspace, &msg.key, &msg.values);
    let replica = daemon.region_replica(region)?;

    {
        let mut sinks = daemon.transfer_sinks.lock();
        let sink = sinks.entry(region).or_insert_with(Sink::new);
        sink.apply_xfer_data(&replica, key_hash, search_hash, &msg)?;
    }
    // Pull-based flow control: request the next record immediately
    // (spec §4.H step 3, "the sink drives the pace of the drain").
    send(transport, config, envelope.to, envelope.from, MessageType::XferMore, Vec::new());
    Ok(())
}

fn handle_xfer_done(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let region = envelope.to.region;
    let actions = {
        let mut sinks = daemon.transfer_sinks.lock();
        match sinks.get_mut(&region) {
            Some(sink) => sink.finish(),
            None => return Ok(()),
        }
    };

    let replica = daemon.region_replica(region)?;
    let (space, subspace) = space_and_subspace(config, region)?;
    for action in actions {
        match action {
            SinkAction::Replay(HeldWrite { from, version, key, op }) => {
                let key_hash = hashing::key_hash(space, &key);
                let search_hash = match &op {
                    PendingOp::Put(values) => hashing::search_hash(space, subspace, &key, values),
                    PendingOp::Del => 0,
                };
                apply_pending_op(&replica, &key, key_hash, search_hash, version, &op);
                let ack = ChainVersionedKey { version, key };
                send(transport, config, envelope.to, from, MessageType::ChainAck, ack.encode());
            }
            SinkAction::GoLive => {
                tracing::info!(region = %region, "transfer sink is live; splicing into the chain");
                daemon.transfer_sinks.lock().remove(&region);
            }
        }
    }
    Ok(())
}

fn handle_search_start(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let req = ReqSearchStart::decode(&envelope.payload)?;
    let Some(space) = config.space(&req.space) else {
        let resp = RespStatus { nonce: req.nonce, status: StatusCode::NotASpace };
        send(transport, config, envelope.to, envelope.from, MessageType::RespStatus, resp.encode());
        return Ok(());
    };

    let count = config.subspace_count(space.id);
    let mut candidates = Vec::new();
    let mut regions = Vec::new();
    for number in 0..count {
        let id = hyperdex_ids::SubspaceId::new(space.id, number);
        if let Some(subspace) = config.subspace(id) {
            candidates.push(subspace.clone());
        }
        regions.extend(config.regions_of(id).into_iter().cloned());
    }

    let mut replica_owned = Vec::new();
    for region in &regions {
        replica_owned.push((region.id, daemon.region_replica(region.id)?));
    }
    let replica_refs: Vec<(RegionId, &hyperdex_store::RegionReplica)> =
        replica_owned.iter().map(|(id, r)| (*id, r.as_ref())).collect();

    match hyperdex_search::execute(space, &candidates, &regions, &replica_refs, &req.predicate) {
        Ok(items) => {
            daemon.searches.lock().insert(req.nonce, hyperdex_search::SearchCursor::new(items));
        }
        Err(e) => {
            let resp = RespStatus { nonce: req.nonce, status: e.into() };
            send(transport, config, envelope.to, envelope.from, MessageType::RespStatus, resp.encode());
        }
    }
    Ok(())
}

fn handle_search_next(daemon: &Daemon, transport: &Arc<TcpTransport>, config: &Configuration, envelope: &Envelope) -> anyhow::Result<()> {
    let req = ReqSearchNext::decode(&envelope.payload)?;
    let mut searches = daemon.searches.lock();
    let Some(cursor) = searches.get_mut(&req.nonce) else {
        let resp = RespStatus { nonce: req.nonce, status: StatusCode::LogicError };
        send(transport, config, envelope.to, envelope.from, MessageType::RespStatus, resp.encode());
        return Ok(());
    };

    match cursor.next() {
        Some((seq, item)) => {
            let resp = RespSearchItem { nonce: req.nonce, seq, key: item.key, values: item.values };
            let exhausted = cursor.is_exhausted();
            send(transport, config, envelope.to, envelope.from, MessageType::RespSearchItem, resp.encode());
            if exhausted {
                searches.remove(&req.nonce);
            }
        }
        None => {
            searches.remove(&req.nonce);
            let resp = RespStatus { nonce: req.nonce, status: StatusCode::Success };
            send(transport, config, envelope.to, envelope.from, MessageType::RespStatus, resp.encode());
        }
    }
    Ok(())
}

fn handle_search_stop(daemon: &Daemon, envelope: &Envelope) -> anyhow::Result<()> {
    let req = ReqSearchStop::decode(&envelope.payload)?;
    daemon.searches.lock().remove(&req.nonce);
    Ok(())
}
