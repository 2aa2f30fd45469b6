//! Kernel-side WireGuard types.
//!
//! These mirror what the `wireguard` genl family sends and accepts, with raw
//! 32-byte keys. [`crate::model`] holds the base64/text view built from them.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec::{self, Family};
use crate::error::Result;

pub const WG_KEY_LEN: usize = 32;

/// Raw Curve25519 key or preshared key.
pub type Key = [u8; WG_KEY_LEN];

/// Snapshot of a WireGuard device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WgDevice {
    pub ifindex: Option<u32>,
    pub ifname: Option<String>,
    /// Only reported to privileged callers.
    pub private_key: Option<Key>,
    pub public_key: Option<Key>,
    /// UDP listen port, 0 until configured.
    pub listen_port: u16,
    pub peers: Vec<WgPeer>,
}

/// Peer flags for `WG_CMD_SET_DEVICE` (WGPEER_F_*).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgPeerFlag {
    RemoveMe = 1 << 0,
}

/// One peer of a device snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WgPeer {
    pub public_key: Key,
    /// `None` when the kernel reports an all-zero key.
    pub preshared_key: Option<Key>,
    pub endpoint: Option<SocketAddr>,
    /// Seconds, 0 = disabled.
    pub persistent_keepalive: u16,
    pub last_handshake: Option<SystemTime>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub allowed_ips: Vec<WgAllowedIp>,
}

impl WgPeer {
    /// Last handshake as UNIX seconds, 0 if none.
    pub fn last_handshake_secs(&self) -> i64 {
        self.last_handshake
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64)
    }
}

/// An allowed-IP range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WgAllowedIp {
    pub addr: IpAddr,
    pub cidr: u8,
}

impl WgAllowedIp {
    pub fn new(addr: IpAddr, cidr: u8) -> Self {
        Self { addr, cidr }
    }

    /// Parse `addr[/prefix]` text. The family comes from the text.
    pub fn parse(text: &str) -> Result<Self> {
        let family = Family::of(text);
        let (addr, prefix) = codec::split(text)?;
        let addr = codec::parse_address(addr, family)?;
        let cidr = codec::parse_prefix(prefix, family)?;
        Ok(Self { addr, cidr })
    }

    /// `AF_INET` or `AF_INET6`, as `WGALLOWEDIP_A_FAMILY` wants it.
    pub fn family(&self) -> u16 {
        let af = if self.addr.is_ipv4() {
            libc::AF_INET
        } else {
            libc::AF_INET6
        };
        af as u16
    }

    /// Address in network order, 4 or 16 bytes.
    pub fn addr_bytes(&self) -> Vec<u8> {
        match self.addr {
            IpAddr::V4(a) => a.octets().into(),
            IpAddr::V6(a) => a.octets().into(),
        }
    }
}

impl fmt::Display for WgAllowedIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::format_cidr(self.addr, self.cidr))
    }
}

/// Changes applied with `WG_CMD_SET_DEVICE`.
#[derive(Debug, Clone, Default)]
pub struct WgDeviceBuilder {
    pub(crate) private_key: Option<Key>,
    pub(crate) listen_port: Option<u16>,
    pub(crate) peers: Vec<WgPeerBuilder>,
}

impl WgDeviceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn private_key(self, private_key: Key) -> Self {
        Self {
            private_key: Some(private_key),
            ..self
        }
    }

    pub fn listen_port(self, listen_port: u16) -> Self {
        Self {
            listen_port: Some(listen_port),
            ..self
        }
    }

    pub fn peer(mut self, peer: WgPeerBuilder) -> Self {
        self.peers.push(peer);
        self
    }
}

/// Peer part of a `WG_CMD_SET_DEVICE` request.
#[derive(Debug, Clone)]
pub struct WgPeerBuilder {
    pub(crate) public_key: Key,
    pub(crate) preshared_key: Option<Key>,
    pub(crate) persistent_keepalive: Option<u16>,
    pub(crate) allowed_ips: Vec<WgAllowedIp>,
    pub(crate) flags: u32,
}

impl WgPeerBuilder {
    pub fn new(public_key: Key) -> Self {
        Self {
            public_key,
            preshared_key: None,
            persistent_keepalive: None,
            allowed_ips: Vec::new(),
            flags: 0,
        }
    }

    pub fn preshared_key(self, preshared_key: Key) -> Self {
        Self {
            preshared_key: Some(preshared_key),
            ..self
        }
    }

    /// Seconds between keepalives; 0 turns them off.
    pub fn persistent_keepalive(self, secs: u16) -> Self {
        Self {
            persistent_keepalive: Some(secs),
            ..self
        }
    }

    pub fn allowed_ip(mut self, ip: WgAllowedIp) -> Self {
        self.allowed_ips.push(ip);
        self
    }

    pub fn allowed_ips(mut self, ips: impl IntoIterator<Item = WgAllowedIp>) -> Self {
        self.allowed_ips.extend(ips);
        self
    }

    /// Sets `WGPEER_F_REMOVE_ME`.
    pub fn remove(mut self) -> Self {
        self.flags |= WgPeerFlag::RemoveMe as u32;
        self
    }
}

/// Parse the `__kernel_timespec` of `WGPEER_A_LAST_HANDSHAKE_TIME`.
///
/// A zero timespec means no handshake yet.
pub fn parse_timespec(data: &[u8]) -> Option<SystemTime> {
    let secs = i64::from_ne_bytes(data.get(..8)?.try_into().ok()?);
    let nsecs = i64::from_ne_bytes(data.get(8..16)?.try_into().ok()?);

    if secs <= 0 && nsecs <= 0 {
        return None;
    }

    let nanos = nsecs.clamp(0, 999_999_999) as u32;
    Some(UNIX_EPOCH + Duration::new(secs.max(0) as u64, nanos))
}
