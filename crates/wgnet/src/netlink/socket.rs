//! Blocking netlink socket.
//!
//! Every operation in this crate opens its own socket, runs one exchange and
//! drops it. The file descriptor is owned by `netlink_sys::Socket`, which
//! closes it on drop, so failure paths never leak it.

use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};

use super::error::Result;

/// Default receive buffer size, large enough for a WireGuard dump chunk.
pub const DEFAULT_RECV_BUFFER: usize = 32768;

/// Netlink protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Routing/device hook (links, addresses).
    Route,
    /// Generic netlink (WireGuard).
    Generic,
}

impl Protocol {
    fn as_isize(self) -> isize {
        match self {
            Protocol::Route => protocols::NETLINK_ROUTE,
            Protocol::Generic => protocols::NETLINK_GENERIC,
        }
    }
}

/// Blocking netlink socket bound to a kernel-assigned port.
pub struct NetlinkSocket {
    socket: Socket,
    /// Sequence number counter.
    seq: AtomicU32,
    /// Local port ID (assigned by kernel).
    pid: u32,
    recv_buffer_size: usize,
}

impl NetlinkSocket {
    /// Create a new netlink socket for the given protocol.
    pub fn new(protocol: Protocol) -> Result<Self> {
        let mut socket = Socket::new(protocol.as_isize())?;

        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Extended ACK only improves error text; older kernels lack it.
        socket.set_ext_ack(true).ok();

        tracing::trace!(?protocol, pid, "opened netlink socket");

        Ok(Self {
            socket,
            seq: AtomicU32::new(1),
            pid,
            recv_buffer_size: DEFAULT_RECV_BUFFER,
        })
    }

    /// Set the receive buffer size used by [`recv_msg`](Self::recv_msg).
    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size.max(4096);
        self
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send a message to the kernel (port 0).
    pub fn send(&self, msg: &[u8]) -> Result<()> {
        let kernel = SocketAddr::new(0, 0);
        let sent = self.socket.send_to(msg, &kernel, 0)?;
        tracing::trace!(len = msg.len(), sent, "netlink send");
        Ok(())
    }

    /// Receive one datagram, blocking until it arrives.
    pub fn recv_msg(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(self.recv_buffer_size);
        let n = self.socket.recv(&mut buf, 0)?;
        tracing::trace!(len = n, "netlink recv");
        Ok(buf.to_vec())
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
