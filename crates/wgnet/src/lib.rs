//! Interface addressing and WireGuard device management for Linux.
//!
//! Two entry points sit on top of a small blocking netlink stack:
//!
//! - [`NetDev`] ([`InterfaceAdapter`]) reads and assigns one IPv4 and one
//!   IPv6 address per interface and brings interfaces up. IPv4 goes through
//!   the legacy `SIOCSIF*` ioctls, IPv6 through `RTM_NEWADDR`.
//! - [`WgManager`] ([`WireguardAdapter`]) creates, lists and deletes
//!   WireGuard links and manages their peers over the `wireguard` generic
//!   netlink family.
//!
//! All operations are synchronous and open their kernel handles per call.
//! Most of them need `CAP_NET_ADMIN`.
//!
//! # Features
//!
//! - `serde` - Serialize/deserialize model and config types
//! - `integration` - Root-only integration tests
//!
//! # Example
//!
//! ```ignore
//! use wgnet::{AllowedIp, InterfaceAdapter, InterfaceAddressing, NetDev};
//! use wgnet::{WgManager, WireguardAdapter};
//!
//! let wg = WgManager::new();
//! let device = wg.create_device("wg0", 51820)?;
//! println!("{} {}", device.name, device.public_key);
//!
//! let net = NetDev::new();
//! net.set_ip("wg0", &InterfaceAddressing::new("10.8.0.1/24", "fd00:8::1/64"))?;
//! net.up("wg0")?;
//!
//! let peer = wg.add_peer("wg0", &[AllowedIp::from("10.8.0.2/32")], 25)?;
//! println!("peer private key: {}", peer.private_key);
//! # Ok::<(), wgnet::Error>(())
//! ```

pub mod addr;
pub mod codec;
pub mod config;
pub mod error;
pub mod ifaddrs;
pub mod interface;
pub mod ioctl;
pub mod model;
pub mod netlink;
pub mod util;
pub mod wireguard;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use interface::{InterfaceAdapter, NetDev};
pub use model::{AllowedIp, Device, DeviceNames, InterfaceAddressing, Peer};
pub use wireguard::{WgManager, WireguardAdapter};
