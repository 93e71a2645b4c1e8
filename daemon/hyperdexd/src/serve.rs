//! The daemon's run loop (spec §5): binds the listening socket, fans
//! inbound envelopes out across a fixed worker pool, and polls the
//! `--connect` configuration for new versions to swap in. Grounded on
//! `neard`'s own split between "bind transport" and "drive a fixed
//! worker pool off one inbox channel" — the same shape `hyperdex-network`
//! `TcpTransport::bind`'s doc comment describes.

use crate::daemon::Daemon;
use crate::dispatch::{dispatch, retransmit_pending};
use hyperdex_config::ConfigVersion;
use hyperdex_network::TcpTransport;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How often the `--connect` file is reread for a new configuration.
/// There is no coordinator push subscription in this port (spec §4.E's
/// module doc: only the receiving half of that protocol exists here), so
/// polling stands in for it.
const RECONFIG_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How often each open region's mutation log is drained into its shards
/// (spec §4.D).
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// How often a key with a still-unretired pending write re-forwards it
/// (spec §5).
const RETRANSMIT_INTERVAL: Duration = Duration::from_millis(500);

/// Per-record cap on retransmit attempts before a key just waits for an
/// operator to notice (spec §5: "up to a bound").
const MAX_RETRANSMITS: u32 = 12;

pub fn run(daemon: Arc<Daemon>, listen: IpAddr, listen_port: u16, workers: usize, connect: PathBuf) -> anyhow::Result<()> {
    let (transport, inbox) = TcpTransport::bind(SocketAddr::new(listen, listen_port))?;
    tracing::info!(addr = %transport.local_addr(), workers, "hyperdexd listening");

    let mut handles = Vec::with_capacity(workers);
    for worker_index in 0..workers.max(1) {
        let daemon = daemon.clone();
        let transport = transport.clone();
        let inbox = inbox.clone();
        let handle = std::thread::Builder::new()
            .name(format!("hyperdexd-worker-{worker_index}"))
            .spawn(move || {
                for envelope in inbox.iter() {
                    dispatch(&daemon, &transport, envelope);
                }
            })?;
        handles.push(handle);
    }

    {
        let daemon = daemon.clone();
        std::thread::Builder::new().name("hyperdexd-flusher".to_string()).spawn(move || flush_loop(daemon))?;
    }
    {
        let daemon = daemon.clone();
        let transport = transport.clone();
        std::thread::Builder::new().name("hyperdexd-retransmit".to_string()).spawn(move || retransmit_loop(daemon, transport))?;
    }

    reconfig_loop(daemon, connect);

    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}

/// Periodically drains every open region's in-memory mutation log into
/// its shards (spec §4.D: "a background flusher periodically drains the
/// log into shards"), the way `serve::run`'s worker pool and
/// `reconfig_loop` each run as their own dedicated thread.
fn flush_loop(daemon: Arc<Daemon>) {
    loop {
        std::thread::sleep(FLUSH_INTERVAL);
        for (region, replica) in daemon.open_regions() {
            if let Err(err) = replica.flush() {
                tracing::warn!(%err, %region, "flush failed");
            }
        }
    }
}

/// Periodically re-forwards any key's oldest unretired pending write
/// (spec §5's "retransmission" background task).
fn retransmit_loop(daemon: Arc<Daemon>, transport: Arc<TcpTransport>) {
    loop {
        std::thread::sleep(RETRANSMIT_INTERVAL);
        retransmit_pending(&daemon, &transport, MAX_RETRANSMITS);
    }
}

/// Polls `connect` for configuration text that differs from what's
/// currently loaded, parsing and swapping it in under
/// [`Daemon::swap_config`]'s reconfiguration barrier (spec §5's
/// pause/unpause). Runs on the calling thread for the lifetime of the
/// daemon, the way `TcpTransport::bind`'s accept loop runs on its own
/// background thread — this is `serve::run`'s equivalent background
/// loop, just blocking the caller instead of detaching.
fn reconfig_loop(daemon: Arc<Daemon>, connect: PathBuf) {
    let mut last_text: Option<String> = None;
    loop {
        std::thread::sleep(RECONFIG_POLL_INTERVAL);
        let text = match std::fs::read_to_string(&connect) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%err, path = %connect.display(), "failed to read configuration; keeping current version");
                continue;
            }
        };
        if last_text.as_deref() == Some(text.as_str()) {
            continue;
        }
        let next_version = ConfigVersion(daemon.config.read().version.0 + 1);
        match daemon.swap_config(next_version, &text) {
            Ok(()) => {
                tracing::info!(version = %next_version, "reconfigured");
                last_text = Some(text);
            }
            Err(err) => tracing::warn!(%err, "rejected configuration update"),
        }
    }
}
