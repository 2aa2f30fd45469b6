//! Interface address enumeration through `getifaddrs(3)`.

use std::ffi::CStr;
use std::fmt::Write as _;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::codec::{ADDR_BUF_LEN, Family, prefix_from_mask_v4, prefix_from_mask_v6};
use crate::error::{Error, Result};
use crate::model::InterfaceAddressing;

/// Owned `getifaddrs` list, released with `freeifaddrs` on drop.
struct IfAddrs {
    head: *mut libc::ifaddrs,
}

impl IfAddrs {
    fn new() -> Result<Self> {
        let mut head = std::ptr::null_mut();
        // SAFETY: `head` is a valid out-pointer; on success the list is ours.
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(Error::GetifaddrsFailed(io::Error::last_os_error()));
        }
        Ok(Self { head })
    }

    fn iter(&self) -> IfAddrsIter<'_> {
        IfAddrsIter {
            next: self.head,
            _list: self,
        }
    }
}

impl Drop for IfAddrs {
    fn drop(&mut self) {
        if !self.head.is_null() {
            // SAFETY: `head` came from getifaddrs and is freed exactly once.
            unsafe { libc::freeifaddrs(self.head) };
        }
    }
}

struct IfAddrsIter<'a> {
    next: *mut libc::ifaddrs,
    _list: &'a IfAddrs,
}

impl<'a> Iterator for IfAddrsIter<'a> {
    type Item = &'a libc::ifaddrs;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: entries live as long as the borrowed list.
        let entry = unsafe { self.next.as_ref()? };
        self.next = entry.ifa_next;
        Some(entry)
    }
}

/// Address family, address and prefix length of one entry.
fn entry_address(entry: &libc::ifaddrs) -> Option<(Family, IpAddr, u8)> {
    if entry.ifa_addr.is_null() {
        return None;
    }

    // SAFETY: `ifa_addr` is non-null and points at a sockaddr whose family
    // selects the concrete type; `ifa_netmask` uses the same family.
    unsafe {
        match i32::from((*entry.ifa_addr).sa_family) {
            libc::AF_INET => {
                let sin = &*(entry.ifa_addr as *const libc::sockaddr_in);
                let addr = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                let prefix = match (entry.ifa_netmask as *const libc::sockaddr_in).as_ref() {
                    Some(mask) => prefix_from_mask_v4(mask.sin_addr.s_addr),
                    None => 0,
                };
                Some((Family::V4, IpAddr::V4(addr), prefix))
            }
            libc::AF_INET6 => {
                let sin6 = &*(entry.ifa_addr as *const libc::sockaddr_in6);
                let addr = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                let prefix = match (entry.ifa_netmask as *const libc::sockaddr_in6).as_ref() {
                    Some(mask) => prefix_from_mask_v6(&mask.sin6_addr.s6_addr),
                    None => 0,
                };
                Some((Family::V6, IpAddr::V6(addr), prefix))
            }
            _ => None,
        }
    }
}

fn cidr_text(addr: IpAddr, prefix: u8) -> Result<String> {
    let mut text = String::new();
    text.try_reserve(ADDR_BUF_LEN)?;
    write!(text, "{}/{}", addr, prefix).map_err(|_| Error::InvalidIpStr(addr.to_string()))?;
    Ok(text)
}

/// Current IPv4 and IPv6 address of `name`.
///
/// When the interface holds several addresses of a family, the last one
/// listed wins. An unknown interface gives empty slots.
pub fn get_addresses(name: &str) -> Result<InterfaceAddressing> {
    let list = IfAddrs::new()?;
    let mut result = InterfaceAddressing::default();

    for entry in list.iter() {
        if entry.ifa_name.is_null() {
            continue;
        }
        // SAFETY: non-null names are NUL-terminated C strings.
        let entry_name = unsafe { CStr::from_ptr(entry.ifa_name) };
        if entry_name.to_bytes() != name.as_bytes() {
            continue;
        }

        let Some((family, addr, prefix)) = entry_address(entry) else {
            continue;
        };

        match family {
            Family::V4 => result.ipv4 = cidr_text(addr, prefix)?,
            Family::V6 => result.ipv6 = cidr_text(addr, prefix)?,
        }
    }

    tracing::debug!(ifname = name, ipv4 = %result.ipv4, ipv6 = %result.ipv6, "read addresses");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_interface_is_empty() {
        let addrs = get_addresses("nonexistent_x").unwrap();
        assert!(addrs.is_empty());
    }

    #[test]
    fn test_loopback() {
        let addrs = get_addresses("lo").unwrap();
        assert_eq!(addrs.ipv4, "127.0.0.1/8");
        assert!(addrs.ipv6.is_empty() || addrs.ipv6 == "::1/128");
    }

    #[test]
    fn test_cidr_text() {
        assert_eq!(
            cidr_text(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 24).unwrap(),
            "10.0.0.1/24"
        );
        assert_eq!(cidr_text(IpAddr::V6(Ipv6Addr::LOCALHOST), 128).unwrap(), "::1/128");
    }

    #[test]
    fn test_list_walks_every_entry() {
        let list = IfAddrs::new().unwrap();
        assert!(list.iter().count() > 0);
    }
}
