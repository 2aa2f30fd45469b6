//! Generic interface configuration.
//!
//! [`NetDev`] reads and assigns the IPv4/IPv6 address of an interface and
//! brings it up. IPv4 goes through `ioctl`, IPv6 through `RTM_NEWADDR`, and
//! reads through `getifaddrs`.
//!
//! ```ignore
//! use wgnet::{InterfaceAdapter, InterfaceAddressing, NetDev};
//!
//! let netdev = NetDev::new();
//! netdev.set_ip("wg0", &InterfaceAddressing::new("10.8.0.1/24", "fd08::1/64"))?;
//! netdev.up("wg0")?;
//! println!("{:?}", netdev.get_ip("wg0")?);
//! ```

use crate::codec::{self, Family};
use crate::config::Config;
use crate::error::Result;
use crate::model::InterfaceAddressing;
use crate::{addr, ifaddrs, ioctl};

/// Interface addressing operations.
pub trait InterfaceAdapter {
    /// Current IPv4/IPv6 address of the interface.
    fn get_ip(&self, name: &str) -> Result<InterfaceAddressing>;

    /// Assign the non-empty slots of `addrs`, IPv4 first.
    ///
    /// The first failure is returned; an IPv4 address already set is not
    /// rolled back when the IPv6 step fails.
    fn set_ip(&self, name: &str, addrs: &InterfaceAddressing) -> Result<()>;

    /// Bring the interface administratively up.
    fn up(&self, name: &str) -> Result<()>;
}

/// Kernel-backed [`InterfaceAdapter`].
#[derive(Debug, Clone, Default)]
pub struct NetDev {
    config: Config,
}

impl NetDev {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn set_ipv4(&self, name: &str, text: &str) -> Result<()> {
        let (addr, prefix) = codec::split(text)?;
        let addr = codec::parse_ipv4(addr)?;
        let prefix = codec::parse_prefix(prefix, Family::V4)?;
        ioctl::assign_ipv4(name, addr, prefix)
    }

    fn set_ipv6(&self, name: &str, text: &str) -> Result<()> {
        let (addr, prefix) = codec::split(text)?;
        let addr = codec::parse_ipv6(addr)?;
        let prefix = codec::parse_prefix(prefix, Family::V6)?;
        addr::assign_ipv6(name, addr, prefix, &self.config)
    }
}

impl InterfaceAdapter for NetDev {
    fn get_ip(&self, name: &str) -> Result<InterfaceAddressing> {
        ifaddrs::get_addresses(name)
    }

    fn set_ip(&self, name: &str, addrs: &InterfaceAddressing) -> Result<()> {
        if !addrs.ipv4.is_empty() {
            self.set_ipv4(name, &addrs.ipv4)?;
        }
        if !addrs.ipv6.is_empty() {
            self.set_ipv6(name, &addrs.ipv6)?;
        }
        Ok(())
    }

    fn up(&self, name: &str) -> Result<()> {
        ioctl::bring_up(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn set(v4: &str, v6: &str) -> ErrorKind {
        NetDev::new()
            .set_ip("nonexistent_x", &InterfaceAddressing::new(v4, v6))
            .unwrap_err()
            .kind()
    }

    #[test]
    fn test_set_ip_empty_is_noop() {
        NetDev::new()
            .set_ip("nonexistent_x", &InterfaceAddressing::default())
            .unwrap();
    }

    #[test]
    fn test_set_ip_validation_order() {
        // address is checked before the prefix
        assert_eq!(set("10.0.0/40", ""), ErrorKind::InvalidIp);
        assert_eq!(set("10.0.0.1/40", ""), ErrorKind::InvalidIpPrefix);
        assert_eq!(set("", "fd00::1/129"), ErrorKind::InvalidIpPrefix);
        assert_eq!(set("", "fd00::g/64"), ErrorKind::InvalidIp);
    }

    #[test]
    fn test_set_ip_wrong_family_slot() {
        assert_eq!(set("fd00::1/64", ""), ErrorKind::InvalidIp);
        assert_eq!(set("", "10.0.0.1/24"), ErrorKind::InvalidIp);
    }

    #[test]
    fn test_set_ip_oversized_text() {
        assert_eq!(set("10.0.0.1/1000", ""), ErrorKind::InvalidIpStr);
    }

    #[test]
    fn test_set_ipv6_unknown_device() {
        assert_eq!(set("", "fd00::1/64"), ErrorKind::DevNotFound);
    }

    #[test]
    fn test_up_unknown_device() {
        let err = NetDev::new().up("nonexistent_x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GetDevFlagsFailed);
    }
}
