//! The transport layer (C8) and the event loop (C9).
//!
//! Each neighbor gets one `SOCK_SEQPACKET` `AF_UNIX` socket, `connect`ed at
//! startup to the filesystem path given by its descriptor. The event loop
//! blocks in `poll(2)` across every neighbor socket at once and, for each
//! socket reported readable, reads exactly one datagram and drives the
//! message dispatcher (C7) synchronously before moving to the next one.

use std::collections::HashMap;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use log::{debug, error, info, warn};
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::socket::{self, AddressFamily, MsgFlags, SockFlag, SockType, UnixAddr};

use crate::config::NeighborDescriptor;
use crate::dispatcher::Dispatcher;
use crate::error::{ConfigError, RouterError};
use crate::message::Message;
use crate::types::NeighborId;

/// `SOCK_SEQPACKET` preserves message boundaries, so a buffer this size
/// comfortably holds any single JSON-encoded envelope this router ever
/// sends or expects to receive; no length-prefix framing is needed on top.
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// How long a single `poll(2)` call blocks before returning with nothing
/// ready. This is not a protocol timer; it only bounds how long the loop
/// can be unresponsive to a process-level shutdown signal.
const POLL_TIMEOUT_MS: i32 = 250;

/// `nix::Error` (a bare `Errno`) doesn't carry enough context on its own;
/// every caller here already knows which neighbor and which operation
/// failed; it just needs turning into the `std::io::Error` our error enum
/// stores.
fn io_err(e: nix::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(e as i32)
}

/// One neighbor's connected `SOCK_SEQPACKET` socket.
struct NeighborSocket {
    id: NeighborId,
    fd: OwnedFd,
}

impl NeighborSocket {
    fn connect(id: NeighborId) -> Result<Self, ConfigError> {
        let fd = socket::socket(
            AddressFamily::Unix,
            SockType::SeqPacket,
            SockFlag::empty(),
            None,
        )
        .map_err(|e| ConfigError::SocketConnect(id.clone(), io_err(e)))?;
        let addr = UnixAddr::new(id.as_str())
            .map_err(|e| ConfigError::SocketConnect(id.clone(), io_err(e)))?;
        socket::connect(fd.as_raw_fd(), &addr)
            .map_err(|e| ConfigError::SocketConnect(id.clone(), io_err(e)))?;
        Ok(Self { id, fd })
    }

    /// Read one datagram. `Ok(None)` means the peer closed its end
    /// (zero-length read), which the event loop treats as that neighbor's
    /// session ending rather than an error (§4.9, step 4).
    fn recv(&self) -> Result<Option<Vec<u8>>, RouterError> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        match socket::recv(self.fd.as_raw_fd(), &mut buf, MsgFlags::empty()) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(buf[..n].to_vec())),
            Err(e) => Err(RouterError::TransportFailure(self.id.clone(), io_err(e))),
        }
    }

    fn send(&self, bytes: &[u8]) -> Result<(), RouterError> {
        socket::send(self.fd.as_raw_fd(), bytes, MsgFlags::empty())
            .map(|_| ())
            .map_err(|e| RouterError::TransportFailure(self.id.clone(), io_err(e)))
    }
}

/// Opens one socket per descriptor, in the order given (§4.10), and drives
/// the single-threaded event loop described in §4.9/§5.
pub struct EventLoop {
    sockets: Vec<NeighborSocket>,
    index_of: HashMap<NeighborId, usize>,
}

impl EventLoop {
    pub fn connect(descriptors: &[NeighborDescriptor]) -> Result<Self, ConfigError> {
        let mut sockets = Vec::with_capacity(descriptors.len());
        let mut index_of = HashMap::with_capacity(descriptors.len());
        for d in descriptors {
            let idx = sockets.len();
            sockets.push(NeighborSocket::connect(d.id.clone())?);
            index_of.insert(d.id.clone(), idx);
        }
        Ok(Self { sockets, index_of })
    }

    /// Run until every neighbor has reached EOF (clean shutdown) or a
    /// socket read/write fails (fatal, propagated to the caller).
    pub fn run(&mut self, dispatcher: &mut Dispatcher) -> Result<(), RouterError> {
        let mut alive = vec![true; self.sockets.len()];
        info!("router started with {} neighbor(s)", self.sockets.len());

        loop {
            if alive.iter().all(|a| !a) {
                info!("all neighbor sessions closed, shutting down");
                return Ok(());
            }

            let mut poll_fds: Vec<PollFd> = self
                .sockets
                .iter()
                .map(|s| PollFd::new(s.fd.as_fd(), PollFlags::POLLIN))
                .collect();
            let ready = poll(&mut poll_fds, POLL_TIMEOUT_MS)
                .map_err(|e| RouterError::TransportFailure("<poll>".to_string(), io_err(e)))?;
            if ready == 0 {
                continue;
            }

            for i in 0..self.sockets.len() {
                if !alive[i] {
                    continue;
                }
                let Some(revents) = poll_fds[i].revents() else {
                    continue;
                };
                if !revents.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR) {
                    continue;
                }
                self.service(i, &mut alive, dispatcher)?;
            }
        }
    }

    fn service(
        &mut self,
        i: usize,
        alive: &mut [bool],
        dispatcher: &mut Dispatcher,
    ) -> Result<(), RouterError> {
        let neighbor = self.sockets[i].id.clone();
        match self.sockets[i].recv()? {
            None => {
                info!("neighbor {neighbor} reached EOF");
                alive[i] = false;
                Ok(())
            }
            Some(bytes) => {
                match Message::parse(&bytes) {
                    Ok(msg) => {
                        for outgoing in dispatcher.handle(&msg) {
                            self.deliver(&outgoing)?;
                        }
                    }
                    Err(e) => warn!("dropping malformed message from {neighbor}: {e}"),
                }
                Ok(())
            }
        }
    }

    fn deliver(&self, outgoing: &Message) -> Result<(), RouterError> {
        let Some(&idx) = self.index_of.get(&outgoing.dst) else {
            warn!("cannot deliver {:?} message: unknown neighbor {}", outgoing.kind, outgoing.dst);
            return Ok(());
        };
        let bytes = outgoing.to_bytes()?;
        debug!("sending {:?} to {}", outgoing.kind, outgoing.dst);
        self.sockets[idx].send(&bytes).inspect_err(|e| {
            error!("transport failure sending to {}: {e}", outgoing.dst);
        })
    }
}
