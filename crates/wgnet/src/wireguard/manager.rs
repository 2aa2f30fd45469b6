//! WireGuard device and peer operations in the external model.

use super::connection::WireguardConnection;
use super::keys;
use super::link::LinkConnection;
use super::types::{WgAllowedIp, WgDevice, WgDeviceBuilder, WgPeer, WgPeerBuilder};
use crate::codec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{AllowedIp, Device, DeviceNames, Peer};
use crate::netlink;
use crate::netlink::socket::{NetlinkSocket, Protocol};
use crate::util::ifname;

/// WireGuard device and peer management.
pub trait WireguardAdapter {
    /// Snapshot of one device.
    fn get_device(&self, name: &str) -> Result<Device>;

    /// Names of all WireGuard links.
    fn list_device_names(&self) -> Result<DeviceNames>;

    /// Every WireGuard device.
    fn list_devices(&self) -> Result<Vec<Device>>;

    /// Create a device with a fresh key pair listening on `port`.
    fn create_device(&self, name: &str, port: u16) -> Result<Device>;

    fn delete_device(&self, name: &str) -> Result<()>;

    /// Add a peer with a generated key pair and preshared key.
    ///
    /// The returned peer is the only place the peer's private key appears.
    fn add_peer(&self, name: &str, allowed_ips: &[AllowedIp], keepalive: u16) -> Result<Peer>;

    /// Every peer of a device.
    fn list_peers(&self, name: &str) -> Result<Vec<Peer>>;

    /// Remove the peer with this base64 public key.
    fn delete_peer(&self, name: &str, public_key: &str) -> Result<()>;
}

/// Kernel-backed [`WireguardAdapter`].
///
/// Every operation opens its own netlink sockets and closes them on return.
/// Compound operations are not atomic; callers serialize them.
#[derive(Debug, Clone, Default)]
pub struct WgManager {
    config: Config,
}

impl WgManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn socket(&self, protocol: Protocol) -> Result<NetlinkSocket> {
        Ok(NetlinkSocket::new(protocol)
            .map_err(Error::NetlinkSocketFailed)?
            .with_recv_buffer_size(self.config.recv_buffer_size))
    }

    fn genl(&self) -> Result<WireguardConnection> {
        let socket = self.socket(Protocol::Generic)?;
        WireguardConnection::from_socket(socket, &self.config.wireguard_family)
            .map_err(Error::NetlinkSendFailed)
    }

    fn links(&self) -> Result<LinkConnection> {
        Ok(LinkConnection::from_socket(self.socket(Protocol::Route)?))
    }

    /// Any failure to read the device, including a link of another kind,
    /// is `DEV_NOT_FOUND`.
    fn fetch(&self, wg: &WireguardConnection, name: &str) -> Result<WgDevice> {
        wg.get_device(name).map_err(|e| lookup_failed(name, e))
    }
}

impl WireguardAdapter for WgManager {
    fn get_device(&self, name: &str) -> Result<Device> {
        let wg = self.genl()?;
        let device = self.fetch(&wg, name)?;
        Ok(to_device(name, &device))
    }

    fn list_device_names(&self) -> Result<DeviceNames> {
        let links = self
            .links()?
            .list_links()
            .map_err(Error::NetlinkSendFailed)?;
        Ok(links.into_iter().filter_map(|link| link.name).collect())
    }

    fn list_devices(&self) -> Result<Vec<Device>> {
        let names = self.list_device_names()?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let wg = self.genl()?;
        let mut devices = Vec::new();
        devices.try_reserve(names.len())?;
        for name in names.iter() {
            let device = self.fetch(&wg, name)?;
            devices.push(to_device(name, &device));
        }
        Ok(devices)
    }

    fn create_device(&self, name: &str, port: u16) -> Result<Device> {
        self.links()?
            .add_link(name)
            .map_err(|source| Error::DevAddFailed {
                name: name.to_string(),
                source,
            })?;

        let wg = self.genl()?;
        let mut device = self.fetch(&wg, name)?;

        let private_key = keys::generate_private_key();
        let public_key = keys::derive_public_key(&private_key);
        let config = WgDeviceBuilder::new()
            .private_key(private_key)
            .listen_port(port);
        wg.set_device(name, &config)
            .map_err(|source| Error::DevSetFailed {
                name: name.to_string(),
                source,
            })?;

        device.private_key = Some(private_key);
        device.public_key = Some(public_key);
        device.listen_port = port;

        tracing::debug!(ifname = name, port, "created WireGuard device");
        Ok(to_device(name, &device))
    }

    fn delete_device(&self, name: &str) -> Result<()> {
        let index = ifname::name_to_index(name)?;
        self.links()?.del_link(index).map_err(|e| {
            if e.is_not_found() {
                Error::dev_not_found(name)
            } else {
                Error::DevDelFailed {
                    name: name.to_string(),
                    source: e,
                }
            }
        })
    }

    fn add_peer(&self, name: &str, allowed_ips: &[AllowedIp], keepalive: u16) -> Result<Peer> {
        let wg = self.genl()?;
        self.fetch(&wg, name)?;

        let private_key = keys::generate_private_key();
        let public_key = keys::derive_public_key(&private_key);
        let preshared_key = keys::generate_preshared_key();

        let mut ips = Vec::new();
        ips.try_reserve(allowed_ips.len())?;
        for entry in allowed_ips {
            match WgAllowedIp::parse(entry.as_str()) {
                Ok(ip) => ips.push(ip),
                Err(e) => tracing::warn!(ifname = name, allowed_ip = %entry, error = %e, "skipping allowed IP"),
            }
        }

        let mut peer = WgPeerBuilder::new(public_key)
            .preshared_key(preshared_key)
            .allowed_ips(ips.iter().copied());
        if keepalive > 0 {
            peer = peer.persistent_keepalive(keepalive);
        }

        wg.set_device(name, &WgDeviceBuilder::new().peer(peer))
            .map_err(|source| Error::DevSetFailed {
                name: name.to_string(),
                source,
            })?;

        tracing::debug!(ifname = name, allowed_ips = ips.len(), keepalive, "added peer");
        Ok(Peer {
            allowed_ips: ips.iter().map(|ip| AllowedIp::new(ip.to_string())).collect(),
            keepalive,
            public_key: keys::encode(&public_key),
            private_key: keys::encode(&private_key),
            preshared_key: keys::encode(&preshared_key),
            ..Default::default()
        })
    }

    fn list_peers(&self, name: &str) -> Result<Vec<Peer>> {
        let wg = self.genl()?;
        let device = self.fetch(&wg, name)?;

        let mut peers = Vec::new();
        peers.try_reserve(device.peers.len())?;
        peers.extend(device.peers.iter().map(to_peer));
        Ok(peers)
    }

    fn delete_peer(&self, name: &str, public_key: &str) -> Result<()> {
        let wg = self.genl()?;
        let device = self.fetch(&wg, name)?;

        let Some(peer) = find_peer(&device, public_key) else {
            return Err(Error::PeerNotFound {
                name: name.to_string(),
                public_key: public_key.to_string(),
            });
        };

        wg.remove_peer(name, peer.public_key)
            .map_err(|source| Error::DevSetFailed {
                name: name.to_string(),
                source,
            })?;

        tracing::debug!(ifname = name, public_key, "deleted peer");
        Ok(())
    }
}

fn lookup_failed(name: &str, e: netlink::Error) -> Error {
    tracing::debug!(ifname = name, error = %e, "WireGuard device lookup failed");
    Error::DevNotFound {
        name: name.to_string(),
        source: Some(e),
    }
}

/// Match on the exact base64 text, as `list_peers` reports it.
fn find_peer<'a>(device: &'a WgDevice, public_key: &str) -> Option<&'a WgPeer> {
    device
        .peers
        .iter()
        .find(|peer| keys::encode(&peer.public_key) == public_key)
}

fn encode_opt(key: Option<&[u8; 32]>) -> String {
    key.map(keys::encode).unwrap_or_default()
}

fn to_device(name: &str, device: &WgDevice) -> Device {
    Device {
        name: device.ifname.clone().unwrap_or_else(|| name.to_string()),
        listen_port: device.listen_port,
        peers: device.peers.len() as u64,
        public_key: encode_opt(device.public_key.as_ref()),
        private_key: encode_opt(device.private_key.as_ref()),
    }
}

fn to_peer(peer: &WgPeer) -> Peer {
    Peer {
        allowed_ips: peer
            .allowed_ips
            .iter()
            .map(|ip| AllowedIp::new(ip.to_string()))
            .collect(),
        endpoint: peer
            .endpoint
            .as_ref()
            .map(codec::format_endpoint)
            .unwrap_or_default(),
        last_handshake: peer.last_handshake_secs(),
        keepalive: peer.persistent_keepalive,
        rx_bytes: peer.rx_bytes,
        tx_bytes: peer.tx_bytes,
        public_key: keys::encode(&peer.public_key),
        private_key: String::new(),
        preshared_key: encode_opt(peer.preshared_key.as_ref()),
    }
}
