//! WireGuard device and peer management.
//!
//! Link creation and removal use RTNetlink (`RTM_NEWLINK` with kind
//! `wireguard`). Keys, listen port and peers are configured through the
//! `wireguard` Generic Netlink family.
//!
//! [`WgManager`] is the entry point. The lower layers are public for callers
//! that need the raw kernel view:
//!
//! ```ignore
//! use wgnet::Config;
//! use wgnet::wireguard::WireguardConnection;
//!
//! let wg = WireguardConnection::new(&Config::default())?;
//! let device = wg.get_device("wg0")?;
//! for peer in &device.peers {
//!     println!("{:?} {:?}", peer.endpoint, peer.allowed_ips);
//! }
//! ```

mod connection;
pub mod keys;
pub mod link;
mod manager;
mod types;

pub use connection::WireguardConnection;
pub use manager::{WgManager, WireguardAdapter};
pub use types::{
    WG_KEY_LEN, WgAllowedIp, WgDevice, WgDeviceBuilder, WgPeer, WgPeerBuilder, WgPeerFlag,
    parse_timespec,
};

/// WireGuard Generic Netlink family name.
pub const WG_GENL_NAME: &str = "wireguard";

/// WireGuard Generic Netlink version.
pub const WG_GENL_VERSION: u8 = 1;

/// Link kind reported in `IFLA_INFO_KIND`.
pub const WG_LINK_KIND: &str = "wireguard";

/// WireGuard GENL commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgCmd {
    GetDevice = 0,
    SetDevice = 1,
}

/// WireGuard device attributes (WGDEVICE_A_*).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgDeviceAttr {
    Unspec = 0,
    Ifindex = 1,
    Ifname = 2,
    PrivateKey = 3,
    PublicKey = 4,
    Flags = 5,
    ListenPort = 6,
    Fwmark = 7,
    Peers = 8,
}

/// WireGuard peer attributes (WGPEER_A_*).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgPeerAttr {
    Unspec = 0,
    PublicKey = 1,
    PresharedKey = 2,
    Flags = 3,
    Endpoint = 4,
    PersistentKeepalive = 5,
    LastHandshake = 6,
    RxBytes = 7,
    TxBytes = 8,
    AllowedIps = 9,
    ProtocolVersion = 10,
}

/// Allowed-IP attributes (WGALLOWEDIP_A_*).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgAllowedIpAttr {
    Unspec = 0,
    Family = 1,
    IpAddr = 2,
    CidrMask = 3,
}

