//! Address integration tests.
//!
//! Assignment and enumeration on dummy links.

use wgnet::{Config, ErrorKind, InterfaceAdapter, InterfaceAddressing, NetDev, Result};

#[test]
fn test_set_ipv4_roundtrip() -> Result<()> {
    require_root!();

    let link = require_dummy!("wgna");
    let net = NetDev::new();

    net.set_ip(link.name(), &InterfaceAddressing::new("10.11.12.13/22", ""))?;

    let addrs = net.get_ip(link.name())?;
    assert_eq!(addrs.ipv4, "10.11.12.13/22");

    Ok(())
}

#[test]
fn test_set_ipv6_roundtrip() -> Result<()> {
    require_root!();

    let link = require_dummy!("wgna");
    let net = NetDev::with_config(Config::new().with_ipv6_ack(true));

    // dummy links carry no link-local address, see TestLink::dummy
    net.up(link.name())?;
    net.set_ip(link.name(), &InterfaceAddressing::new("", "fd00:11::5/64"))?;

    let addrs = net.get_ip(link.name())?;
    assert_eq!(addrs.ipv6, "fd00:11::5/64");

    Ok(())
}

#[test]
fn test_set_both_families() -> Result<()> {
    require_root!();

    let link = require_dummy!("wgna");
    let net = NetDev::with_config(Config::new().with_ipv6_ack(true));

    net.up(link.name())?;
    net.set_ip(
        link.name(),
        &InterfaceAddressing::new("192.168.77.1/24", "fd00:77::1/48"),
    )?;

    let addrs = net.get_ip(link.name())?;
    assert_eq!(addrs.ipv4, "192.168.77.1/24");
    assert_eq!(addrs.ipv6, "fd00:77::1/48");

    Ok(())
}

#[test]
fn test_invalid_prefix_is_rejected() -> Result<()> {
    require_root!();

    let link = require_dummy!("wgna");
    let net = NetDev::new();

    let err = net
        .set_ip(link.name(), &InterfaceAddressing::new("10.0.0.1/33", ""))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIpPrefix);

    let err = net
        .set_ip(link.name(), &InterfaceAddressing::new("10.0.0.1/abc", ""))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIpPrefix);

    // nothing was assigned
    assert!(net.get_ip(link.name())?.ipv4.is_empty());

    Ok(())
}

#[test]
fn test_ipv6_unknown_device() -> Result<()> {
    require_root!();

    let err = NetDev::new()
        .set_ip("wgna_missing", &InterfaceAddressing::new("", "fd00::1/64"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DevNotFound);

    Ok(())
}

#[test]
fn test_up_sets_flag() -> Result<()> {
    require_root!();

    let link = require_dummy!("wgna");
    NetDev::new().up(link.name())?;

    let flags = std::fs::read_to_string(format!("/sys/class/net/{}/flags", link.name()))
        .map_err(wgnet::Error::CtlSocketFailed)?;
    let flags = u32::from_str_radix(flags.trim().trim_start_matches("0x"), 16).unwrap();
    assert_ne!(flags & libc::IFF_UP as u32, 0);

    Ok(())
}
