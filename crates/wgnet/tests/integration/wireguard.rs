//! WireGuard integration tests.
//!
//! Device lifecycle and peer management on real WireGuard links.

use wgnet::wireguard::keys;
use wgnet::{AllowedIp, ErrorKind, Result, WgManager, WireguardAdapter};

use crate::common::TestLink;

#[test]
fn test_create_device() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, created) = TestLink::wireguard("wgnt", 51820)?;
    assert_eq!(created.listen_port, 51820);

    let device = WgManager::new().get_device(link.name())?;
    assert_eq!(device.name, link.name());
    assert_eq!(device.listen_port, 51820);
    assert_eq!(device.peers, 0);
    assert_eq!(device.public_key.len(), 44);

    let private = keys::decode(&created.private_key)?;
    assert_eq!(keys::encode(&keys::derive_public_key(&private)), device.public_key);

    Ok(())
}

#[test]
fn test_create_existing_device_fails() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51821)?;

    let err = WgManager::new().create_device(link.name(), 51821).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DevAddFailed);
    assert_eq!(err.errno(), Some(libc::EEXIST));

    Ok(())
}

#[test]
fn test_list_device_names() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51822)?;
    let dummy = require_dummy!("wgnd");

    let wg = WgManager::new();
    let names = wg.list_device_names()?;
    assert!(names.iter().any(|n| n == link.name()));
    assert!(!names.iter().any(|n| n == dummy.name()));
    assert!(names.to_bytes().ends_with(b"\0\0"));

    let devices = wg.list_devices()?;
    assert!(devices.iter().any(|d| d.name == link.name()));

    Ok(())
}

#[test]
fn test_add_and_list_peers() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51823)?;
    let wg = WgManager::new();

    let allowed = [AllowedIp::from("10.0.0.2/32"), AllowedIp::from("fd00::/64")];
    let added = wg.add_peer(link.name(), &allowed, 25)?;
    assert_eq!(added.private_key.len(), 44);
    assert_eq!(added.preshared_key.len(), 44);

    let peers = wg.list_peers(link.name())?;
    assert_eq!(peers.len(), 1);

    let peer = &peers[0];
    assert_eq!(peer.allowed_ips, allowed);
    assert_eq!(peer.public_key, added.public_key);
    assert_eq!(peer.preshared_key, added.preshared_key);
    assert_eq!(peer.keepalive, 25);
    assert!(peer.private_key.is_empty());
    assert!(peer.endpoint.is_empty());
    assert_eq!(peer.last_handshake, 0);

    assert_eq!(wg.get_device(link.name())?.peers, 1);

    Ok(())
}

#[test]
fn test_add_peer_skips_bad_allowed_ips() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51824)?;
    let wg = WgManager::new();

    let allowed = [
        AllowedIp::from("10.0.0.0/33"),
        AllowedIp::from("10.9.0.0/16"),
        AllowedIp::from("not-an-ip/8"),
    ];
    let added = wg.add_peer(link.name(), &allowed, 0)?;
    assert_eq!(added.allowed_ips, vec![AllowedIp::from("10.9.0.0/16")]);

    let peers = wg.list_peers(link.name())?;
    assert_eq!(peers[0].allowed_ips, vec![AllowedIp::from("10.9.0.0/16")]);
    assert_eq!(peers[0].keepalive, 0);

    Ok(())
}

#[test]
fn test_delete_peer() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51825)?;
    let wg = WgManager::new();

    let first = wg.add_peer(link.name(), &[AllowedIp::from("10.0.0.2/32")], 0)?;
    let second = wg.add_peer(link.name(), &[AllowedIp::from("10.0.0.3/32")], 0)?;

    wg.delete_peer(link.name(), &first.public_key)?;

    let peers = wg.list_peers(link.name())?;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].public_key, second.public_key);

    Ok(())
}

#[test]
fn test_delete_unknown_peer() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51826)?;

    let wg = WgManager::new();
    wg.add_peer(link.name(), &[AllowedIp::from("10.0.0.2/32")], 0)?;

    let unknown = keys::encode(&keys::generate_preshared_key());
    for text in [unknown.as_str(), "unknown-b64-key", ""] {
        let err = wg.delete_peer(link.name(), text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PeerNotFound, "{text:?}");
    }
    assert_eq!(wg.list_peers(link.name())?.len(), 1);

    Ok(())
}

#[test]
fn test_large_allowed_ip_list() -> Result<()> {
    require_root!();
    require_wireguard!();

    let (link, _) = TestLink::wireguard("wgnt", 51828)?;
    let wg = WgManager::new();

    let ips: Vec<AllowedIp> = (0..2500u32)
        .map(|i| AllowedIp::new(format!("10.{}.{}.0/24", i / 256, i % 256)))
        .collect();
    let peer = wg.add_peer(link.name(), &ips, 0)?;
    assert_eq!(peer.allowed_ips.len(), ips.len());

    let peers = wg.list_peers(link.name())?;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].allowed_ips.len(), ips.len());

    Ok(())
}

#[test]
fn test_non_wireguard_link() -> Result<()> {
    require_root!();
    require_wireguard!();

    let wg = WgManager::new();
    assert_eq!(wg.get_device("lo").unwrap_err().kind(), ErrorKind::DevNotFound);
    assert_eq!(wg.list_peers("lo").unwrap_err().kind(), ErrorKind::DevNotFound);
    assert_eq!(
        wg.add_peer("lo", &[], 0).unwrap_err().kind(),
        ErrorKind::DevNotFound
    );
    assert_eq!(
        wg.delete_peer("lo", "x").unwrap_err().kind(),
        ErrorKind::DevNotFound
    );

    Ok(())
}

#[test]
fn test_missing_device() -> Result<()> {
    require_root!();
    require_wireguard!();

    let wg = WgManager::new();
    assert_eq!(
        wg.get_device("wgnt_missing").unwrap_err().kind(),
        ErrorKind::DevNotFound
    );
    assert_eq!(
        wg.list_peers("wgnt_missing").unwrap_err().kind(),
        ErrorKind::DevNotFound
    );
    assert_eq!(
        wg.add_peer("wgnt_missing", &[], 0).unwrap_err().kind(),
        ErrorKind::DevNotFound
    );

    Ok(())
}

#[test]
fn test_delete_device() -> Result<()> {
    require_root!();
    require_wireguard!();

    let wg = WgManager::new();
    let (link, _) = TestLink::wireguard("wgnt", 51827)?;

    wg.delete_device(link.name())?;
    assert_eq!(
        wg.get_device(link.name()).unwrap_err().kind(),
        ErrorKind::DevNotFound
    );
    assert_eq!(
        wg.delete_device(link.name()).unwrap_err().kind(),
        ErrorKind::DevNotFound
    );

    Ok(())
}
