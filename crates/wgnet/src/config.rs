//! Tunables for the netlink exchanges.
//!
//! ```
//! use wgnet::Config;
//!
//! let config = Config::new()
//!     .with_ipv6_ack(true)
//!     .with_recv_buffer_size(64 * 1024);
//! assert!(config.ipv6_ack);
//! ```

use crate::netlink::socket::DEFAULT_RECV_BUFFER;
use crate::wireguard::WG_GENL_NAME;

/// Library configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Config {
    /// Request an ACK for `RTM_NEWADDR` and surface kernel rejections.
    ///
    /// Off by default: the address request is sent once and not confirmed.
    pub ipv6_ack: bool,
    /// Receive buffer size for netlink replies.
    pub recv_buffer_size: usize,
    /// Generic netlink family name of the WireGuard module.
    pub wireguard_family: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ipv6_ack: false,
            recv_buffer_size: DEFAULT_RECV_BUFFER,
            wireguard_family: WG_GENL_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ipv6_ack(mut self, ack: bool) -> Self {
        self.ipv6_ack = ack;
        self
    }

    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn with_wireguard_family(mut self, name: impl Into<String>) -> Self {
        self.wireguard_family = name.into();
        self
    }

    /// Load a configuration from JSON. Missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
