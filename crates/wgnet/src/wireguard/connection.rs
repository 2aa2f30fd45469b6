//! WireGuard Generic Netlink requests.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

/// Room for peers in one SET_DEVICE request; `WGDEVICE_A_PEERS` is a single
/// attribute and its length is a `u16`.
const PEERS_BUDGET: usize = u16::MAX as usize - NLA_HDRLEN;

use super::types::{
    Key, WG_KEY_LEN, WgAllowedIp, WgDevice, WgDeviceBuilder, WgPeer, WgPeerBuilder, parse_timespec,
};
use super::{WG_GENL_VERSION, WgAllowedIpAttr, WgCmd, WgDeviceAttr, WgPeerAttr};
use crate::config::Config;
use crate::netlink::attr::{AttrIter, NLA_HDRLEN, get, nla_align};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{FamilyInfo, GENL_HDRLEN, GenlConnection};
use crate::netlink::socket::{NetlinkSocket, Protocol};

/// Connection to the `wireguard` genl family.
pub struct WireguardConnection {
    genl: GenlConnection,
    family: FamilyInfo,
}

impl WireguardConnection {
    /// Open a generic netlink socket and resolve the WireGuard family.
    pub fn new(config: &Config) -> Result<Self> {
        let socket = NetlinkSocket::new(Protocol::Generic)?
            .with_recv_buffer_size(config.recv_buffer_size);
        Self::from_socket(socket, &config.wireguard_family)
    }

    /// Resolve `family_name` on an existing `Protocol::Generic` socket.
    pub fn from_socket(socket: NetlinkSocket, family_name: &str) -> Result<Self> {
        let genl = GenlConnection::from_socket(socket);
        let family = genl.resolve_family(family_name)?;
        Ok(Self { genl, family })
    }

    pub fn family_id(&self) -> u16 {
        self.family.id
    }

    /// Fetch the device snapshot, merging multi-part replies.
    pub fn get_device(&self, ifname: &str) -> Result<WgDevice> {
        let responses = self.genl.dump_command(
            self.family.id,
            WgCmd::GetDevice as u8,
            WG_GENL_VERSION,
            |builder| builder.append_attr_str(WgDeviceAttr::Ifname as u16, ifname),
        )?;

        if responses.is_empty() {
            return Err(Error::from_errno(libc::ENODEV));
        }

        tracing::debug!(
            ifname,
            family_id = self.family.id,
            parts = responses.len(),
            "fetched WireGuard device"
        );
        parse_device(&responses)
    }

    /// Apply `config` to the device, one ACKed request per chunk.
    ///
    /// Peer lists too large for one request are split; a peer whose allowed
    /// IPs overflow continues in the next request under the same key.
    pub fn set_device(&self, ifname: &str, config: &WgDeviceBuilder) -> Result<()> {
        let parts = split_device(config);
        for part in &parts {
            self.genl.command(
                self.family.id,
                WgCmd::SetDevice as u8,
                WG_GENL_VERSION,
                |builder| append_device(builder, ifname, part),
            )?;
        }

        tracing::debug!(
            ifname,
            family_id = self.family.id,
            peers = config.peers.len(),
            requests = parts.len(),
            "configured WireGuard device"
        );
        Ok(())
    }

    /// Remove one peer by raw public key.
    pub fn remove_peer(&self, ifname: &str, public_key: Key) -> Result<()> {
        let config = WgDeviceBuilder::new().peer(WgPeerBuilder::new(public_key).remove());
        self.set_device(ifname, &config)
    }
}

fn attr_len(payload: usize) -> usize {
    nla_align(NLA_HDRLEN + payload)
}

fn allowed_ip_len(ip: &WgAllowedIp) -> usize {
    attr_len(attr_len(2) + attr_len(ip.addr_bytes().len()) + attr_len(1))
}

/// Encoded size of a peer without its allowed-IP entries.
fn peer_base_len(peer: &WgPeerBuilder) -> usize {
    let mut len = NLA_HDRLEN + attr_len(WG_KEY_LEN) + NLA_HDRLEN;
    if peer.flags != 0 {
        len += attr_len(4);
    }
    if peer.preshared_key.is_some() {
        len += attr_len(WG_KEY_LEN);
    }
    if peer.persistent_keepalive.is_some() {
        len += attr_len(2);
    }
    len
}

/// Cut `config` into requests whose peer list fits [`PEERS_BUDGET`].
///
/// Device settings go in the first request only. A continuation peer carries
/// just its public key and the remaining allowed IPs, which the kernel
/// appends to the ones already set.
fn split_device(config: &WgDeviceBuilder) -> Vec<WgDeviceBuilder> {
    let mut parts = Vec::new();
    let mut part = WgDeviceBuilder {
        private_key: config.private_key,
        listen_port: config.listen_port,
        peers: Vec::new(),
    };
    let mut used = 0;

    for peer in &config.peers {
        let base = peer_base_len(peer);
        if used + base > PEERS_BUDGET && !part.peers.is_empty() {
            parts.push(std::mem::take(&mut part));
            used = 0;
        }

        let mut current = WgPeerBuilder {
            allowed_ips: Vec::new(),
            ..peer.clone()
        };
        used += base;

        for ip in &peer.allowed_ips {
            let len = allowed_ip_len(ip);
            if used + len > PEERS_BUDGET {
                let next = WgPeerBuilder::new(peer.public_key);
                part.peers.push(std::mem::replace(&mut current, next));
                parts.push(std::mem::take(&mut part));
                used = peer_base_len(&current);
            }
            current.allowed_ips.push(*ip);
            used += len;
        }
        part.peers.push(current);
    }

    parts.push(part);
    parts
}

fn append_device(builder: &mut MessageBuilder, ifname: &str, config: &WgDeviceBuilder) {
    builder.append_attr_str(WgDeviceAttr::Ifname as u16, ifname);

    if let Some(key) = &config.private_key {
        builder.append_attr(WgDeviceAttr::PrivateKey as u16, key);
    }
    if let Some(port) = config.listen_port {
        builder.append_attr_u16(WgDeviceAttr::ListenPort as u16, port);
    }

    if !config.peers.is_empty() {
        let peers = builder.nest_start(WgDeviceAttr::Peers as u16);
        for (idx, peer) in config.peers.iter().enumerate() {
            append_peer(builder, idx as u16, peer);
        }
        builder.nest_end(peers);
    }
}

fn append_peer(builder: &mut MessageBuilder, idx: u16, peer: &WgPeerBuilder) {
    let token = builder.nest_start(idx);

    builder.append_attr(WgPeerAttr::PublicKey as u16, &peer.public_key);
    if peer.flags != 0 {
        builder.append_attr_u32(WgPeerAttr::Flags as u16, peer.flags);
    }
    if let Some(psk) = &peer.preshared_key {
        builder.append_attr(WgPeerAttr::PresharedKey as u16, psk);
    }
    if let Some(interval) = peer.persistent_keepalive {
        builder.append_attr_u16(WgPeerAttr::PersistentKeepalive as u16, interval);
    }

    if !peer.allowed_ips.is_empty() {
        let ips = builder.nest_start(WgPeerAttr::AllowedIps as u16);
        for (i, ip) in peer.allowed_ips.iter().enumerate() {
            let entry = builder.nest_start(i as u16);
            builder.append_attr_u16(WgAllowedIpAttr::Family as u16, ip.family());
            builder.append_attr(WgAllowedIpAttr::IpAddr as u16, &ip.addr_bytes());
            builder.append_attr_u8(WgAllowedIpAttr::CidrMask as u16, ip.cidr);
            builder.nest_end(entry);
        }
        builder.nest_end(ips);
    }

    builder.nest_end(token);
}

/// Build one device from the GET_DEVICE reply payloads (genl header included).
///
/// The kernel splits large peer lists across messages. A peer that opens a
/// message with the same public key as the last peer seen continues it.
fn parse_device(responses: &[Vec<u8>]) -> Result<WgDevice> {
    let mut device = WgDevice::default();

    for response in responses {
        let Some(attrs) = response.get(GENL_HDRLEN..) else {
            tracing::warn!(len = response.len(), "short WireGuard reply skipped");
            continue;
        };
        parse_device_attrs(attrs, &mut device)?;
    }

    Ok(device)
}

fn parse_device_attrs(data: &[u8], device: &mut WgDevice) -> Result<()> {
    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == WgDeviceAttr::Ifindex as u16 => device.ifindex = Some(get::u32_ne(payload)?),
            t if t == WgDeviceAttr::Ifname as u16 => {
                device.ifname = Some(get::string(payload)?.to_string());
            }
            t if t == WgDeviceAttr::PrivateKey as u16 => {
                device.private_key = Some(get::key(payload)?);
            }
            t if t == WgDeviceAttr::PublicKey as u16 => {
                device.public_key = Some(get::key(payload)?);
            }
            t if t == WgDeviceAttr::ListenPort as u16 => device.listen_port = get::u16_ne(payload)?,
            t if t == WgDeviceAttr::Peers as u16 => {
                for (_, peer_data) in AttrIter::new(payload) {
                    let peer = parse_peer(peer_data)?;
                    match device.peers.last_mut() {
                        Some(last) if last.public_key == peer.public_key => {
                            last.allowed_ips.extend(peer.allowed_ips);
                        }
                        _ => device.peers.push(peer),
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_peer(data: &[u8]) -> Result<WgPeer> {
    let mut peer = WgPeer::default();

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == WgPeerAttr::PublicKey as u16 => peer.public_key = get::key(payload)?,
            t if t == WgPeerAttr::PresharedKey as u16 => {
                let key = get::key(payload)?;
                if key != [0u8; WG_KEY_LEN] {
                    peer.preshared_key = Some(key);
                }
            }
            t if t == WgPeerAttr::Endpoint as u16 => peer.endpoint = parse_sockaddr(payload),
            t if t == WgPeerAttr::PersistentKeepalive as u16 => {
                peer.persistent_keepalive = get::u16_ne(payload)?;
            }
            t if t == WgPeerAttr::LastHandshake as u16 => {
                peer.last_handshake = parse_timespec(payload);
            }
            t if t == WgPeerAttr::RxBytes as u16 => peer.rx_bytes = get::u64_ne(payload)?,
            t if t == WgPeerAttr::TxBytes as u16 => peer.tx_bytes = get::u64_ne(payload)?,
            t if t == WgPeerAttr::AllowedIps as u16 => {
                for (_, entry) in AttrIter::new(payload) {
                    if let Some(ip) = parse_allowed_ip(entry)? {
                        peer.allowed_ips.push(ip);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(peer)
}

fn parse_allowed_ip(data: &[u8]) -> Result<Option<WgAllowedIp>> {
    let mut family = None;
    let mut addr = None;
    let mut cidr = None;

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == WgAllowedIpAttr::Family as u16 => family = Some(get::u16_ne(payload)?),
            t if t == WgAllowedIpAttr::IpAddr as u16 => addr = Some(payload),
            t if t == WgAllowedIpAttr::CidrMask as u16 => cidr = Some(get::u8(payload)?),
            _ => {}
        }
    }

    let (Some(family), Some(addr), Some(cidr)) = (family, addr, cidr) else {
        return Ok(None);
    };

    let addr = match i32::from(family) {
        libc::AF_INET => addr
            .get(..4)
            .and_then(|o| <[u8; 4]>::try_from(o).ok())
            .map(|o| IpAddr::V4(Ipv4Addr::from(o))),
        libc::AF_INET6 => addr
            .get(..16)
            .and_then(|o| <[u8; 16]>::try_from(o).ok())
            .map(|o| IpAddr::V6(Ipv6Addr::from(o))),
        _ => None,
    };

    Ok(addr.map(|addr| WgAllowedIp::new(addr, cidr)))
}

/// Decode `sockaddr_in` / `sockaddr_in6` bytes. Family 0 (no endpoint) gives `None`.
fn parse_sockaddr(data: &[u8]) -> Option<SocketAddr> {
    let family = u16::from_ne_bytes(data.get(0..2)?.try_into().ok()?);
    let port = u16::from_be_bytes(data.get(2..4)?.try_into().ok()?);

    match i32::from(family) {
        libc::AF_INET => {
            let octets: [u8; 4] = data.get(4..8)?.try_into().ok()?;
            Some(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(octets), port)))
        }
        libc::AF_INET6 => {
            let flowinfo = u32::from_be_bytes(data.get(4..8)?.try_into().ok()?);
            let octets: [u8; 16] = data.get(8..24)?.try_into().ok()?;
            let scope_id = data
                .get(24..28)
                .and_then(|s| s.try_into().ok())
                .map_or(0, u32::from_ne_bytes);
            Some(SocketAddr::V6(SocketAddrV6::new(
                Ipv6Addr::from(octets),
                port,
                flowinfo,
                scope_id,
            )))
        }
        _ => None,
    }
}
