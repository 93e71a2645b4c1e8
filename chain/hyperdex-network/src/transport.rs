//! The byte transport (spec §4.F, §5): delivers framed envelopes to a
//! destination host and accepts inbound connections from a fixed pool of
//! worker threads. Spec §9 is explicit that coroutines/async should stay
//! out of the core, so this is plain blocking `std::net`, not `tokio` —
//! one reader thread per inbound connection, and a small pool of reusable
//! outbound connections guarded by a mutex rather than the hazard-pointer
//! scheme spec §5 describes for the production system (documented
//! simplification: `Arc`/`Mutex` already gives memory safety for a
//! teaching-scale port, where the hazard-pointer scheme's payoff is purely
//! about avoiding lock contention under heavy fan-out).

use crate::envelope::{Envelope, FrameError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// Delivers framed envelopes to other hosts and accepts inbound ones.
/// Implemented by `TcpTransport` for real daemons and by an in-process
/// fake in tests for the replication/transfer layers above it.
pub trait ByteTransport: Send + Sync {
    fn send(&self, dest: SocketAddr, envelope: &Envelope) -> io::Result<()>;
}

/// A blocking TCP transport: one persistent outbound `TcpStream` per
/// destination address, and a listener that spawns one reader thread per
/// inbound connection, pushing decoded envelopes onto `inbox`.
pub struct TcpTransport {
    local_addr: SocketAddr,
    outbound: Mutex<HashMap<SocketAddr, TcpStream>>,
    inbox: crossbeam_channel::Sender<Envelope>,
}

impl TcpTransport {
    /// Binds `listen_addr` and spawns the accept loop on a background
    /// thread; decoded inbound envelopes are sent on the returned
    /// receiver, which the daemon's worker pool drains (spec §5:
    /// "a fixed pool of network workers processes inbound messages").
    pub fn bind(listen_addr: SocketAddr) -> io::Result<(Arc<TcpTransport>, crossbeam_channel::Receiver<Envelope>)> {
        let listener = TcpListener::bind(listen_addr)?;
        let local_addr = listener.local_addr()?;
        let (tx, rx) = crossbeam_channel::unbounded();
        let transport = Arc::new(TcpTransport { local_addr, outbound: Mutex::new(HashMap::new()), inbox: tx });
        let inbox = transport.inbox.clone();
        thread::Builder::new()
            .name("hyperdex-accept".to_string())
            .spawn(move || accept_loop(listener, inbox))?;
        Ok((transport, rx))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn connection_for(&self, dest: SocketAddr) -> io::Result<TcpStream> {
        let mut outbound = self.outbound.lock();
        if let Some(stream) = outbound.get(&dest) {
            if let Ok(cloned) = stream.try_clone() {
                return Ok(cloned);
            }
        }
        let stream = TcpStream::connect(dest)?;
        let cloned = stream.try_clone()?;
        outbound.insert(dest, stream);
        Ok(cloned)
    }
}

impl ByteTransport for TcpTransport {
    fn send(&self, dest: SocketAddr, envelope: &Envelope) -> io::Result<()> {
        let mut stream = self.connection_for(dest)?;
        match envelope.write_frame(&mut stream) {
            Ok(()) => Ok(()),
            Err(FrameError::Io(e)) => {
                self.outbound.lock().remove(&dest);
                Err(e)
            }
            Err(other) => Err(io::Error::new(io::ErrorKind::InvalidData, other)),
        }
    }
}

fn accept_loop(listener: TcpListener, inbox: crossbeam_channel::Sender<Envelope>) {
    for incoming in listener.incoming() {
        let Ok(stream) = incoming else { continue };
        let inbox = inbox.clone();
        let builder = thread::Builder::new().name("hyperdex-conn".to_string());
        if let Err(err) = builder.spawn(move || connection_loop(stream, inbox)) {
            tracing::warn!(%err, "failed to spawn connection reader thread");
        }
    }
}

fn connection_loop(mut stream: TcpStream, inbox: crossbeam_channel::Sender<Envelope>) {
    loop {
        match Envelope::read_frame(&mut stream) {
            Ok(envelope) => {
                if inbox.send(envelope).is_err() {
                    return;
                }
            }
            Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return,
            Err(err) => {
                tracing::warn!(%err, "dropping connection after a framing error");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use hyperdex_ids::{RegionId, SpaceId, SubspaceId, VirtualServerId};
    use std::time::Duration;

    fn entity() -> VirtualServerId {
        VirtualServerId::new(RegionId::new(SubspaceId::key_subspace(SpaceId::new(1)), 0, 0), 0)
    }

    #[test]
    fn a_sent_envelope_is_received_on_the_other_end() {
        let (server, server_rx) = TcpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let (client, _client_rx) = TcpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();

        let envelope = Envelope::new(MessageType::ChainAck, 1, 1, entity(), entity(), b"hello".to_vec());
        client.send(server.local_addr(), &envelope).unwrap();

        let received = server_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received.payload, b"hello".to_vec());
    }
}
