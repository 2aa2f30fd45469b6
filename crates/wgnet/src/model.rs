//! Stable external types returned by [`NetDev`](crate::NetDev) and
//! [`WgManager`](crate::WgManager).
//!
//! Sequences are owned `Vec`s: dropping a `Peer` drops its allowed IPs,
//! dropping a `Vec<Peer>` drops every peer.

use std::fmt;

use crate::codec::Family;

/// Current addressing of one interface.
///
/// Each slot is empty or holds `addr/prefix`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceAddressing {
    pub ipv4: String,
    pub ipv6: String,
}

impl InterfaceAddressing {
    pub fn new(ipv4: impl Into<String>, ipv6: impl Into<String>) -> Self {
        Self {
            ipv4: ipv4.into(),
            ipv6: ipv6.into(),
        }
    }

    /// Both slots are empty.
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}

/// A WireGuard interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Device {
    pub name: String,
    pub listen_port: u16,
    /// Number of configured peers.
    pub peers: u64,
    /// Base64 public key.
    pub public_key: String,
    /// Base64 private key.
    pub private_key: String,
}

/// One allowed-IP entry in `addr/prefix` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AllowedIp(String);

impl AllowedIp {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Family inferred from the text.
    pub fn family(&self) -> Family {
        Family::of(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AllowedIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AllowedIp {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for AllowedIp {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// A WireGuard peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peer {
    /// Allowed IPs in the order the kernel reports them.
    pub allowed_ips: Vec<AllowedIp>,
    /// `a.b.c.d:port`, `[v6]:port`, or empty.
    pub endpoint: String,
    /// Last handshake, UNIX seconds. Zero if never.
    pub last_handshake: i64,
    /// Persistent keepalive in seconds. Zero means disabled.
    pub keepalive: u16,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub public_key: String,
    /// Only set on the peer returned by `add_peer`.
    pub private_key: String,
    pub preshared_key: String,
}

/// Names of the WireGuard interfaces on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DeviceNames(Vec<String>);

impl DeviceNames {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// NUL-separated form: `name1\0name2\0\0`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.iter().map(|n| n.len() + 1).sum::<usize>() + 1);
        for name in &self.0 {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        out.push(0);
        out
    }

    /// Parse the NUL-separated form, stopping at the first empty name.
    pub fn from_bytes(data: &[u8]) -> Self {
        let names = data
            .split(|&b| b == 0)
            .take_while(|name| !name.is_empty())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect();
        Self(names)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl IntoIterator for DeviceNames {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<String> for DeviceNames {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
