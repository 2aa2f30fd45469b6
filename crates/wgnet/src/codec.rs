//! Address text codec.
//!
//! Splitting `addr/prefix` text, prefix/mask conversions, and the textual
//! forms used for addresses and endpoints. Everything here is pure.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::{Error, Result};

/// Address buffer size, terminator included (`INET6_ADDRSTRLEN + 4 + 1`).
pub const ADDR_BUF_LEN: usize = 46 + 4 + 1;

/// Prefix buffer size, terminator included.
pub const PREFIX_BUF_LEN: usize = 4;

/// Address family of a piece of address text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Text containing a `:` anywhere is IPv6.
    pub fn of(text: &str) -> Self {
        if text.contains(':') { Self::V6 } else { Self::V4 }
    }

    /// Largest valid prefix length.
    pub fn max_prefix(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    /// Prefix used when the text carries none.
    pub fn default_prefix(self) -> &'static str {
        match self {
            Self::V4 => "32",
            Self::V6 => "128",
        }
    }

    /// `AF_INET` or `AF_INET6`.
    pub fn af(self) -> u8 {
        match self {
            Self::V4 => libc::AF_INET as u8,
            Self::V6 => libc::AF_INET6 as u8,
        }
    }
}

/// Split `addr[/prefix]` at the first `/`.
///
/// A missing prefix defaults to the full host length of the family. Parts
/// that would not fit their fixed-size buffers are rejected.
pub fn split(text: &str) -> Result<(&str, &str)> {
    let family = Family::of(text);

    match text.split_once('/') {
        Some((addr, prefix)) => {
            if addr.len() >= ADDR_BUF_LEN || prefix.len() >= PREFIX_BUF_LEN {
                return Err(Error::InvalidIpStr(text.to_string()));
            }
            Ok((addr, prefix))
        }
        None => {
            if text.len() >= ADDR_BUF_LEN {
                return Err(Error::InvalidIpStr(text.to_string()));
            }
            Ok((text, family.default_prefix()))
        }
    }
}

/// Count the leading one bits of a network-order IPv4 netmask.
pub fn prefix_from_mask_v4(mask_be: u32) -> u8 {
    u32::from_be(mask_be).leading_ones() as u8
}

/// Count the leading one bits of an IPv6 netmask.
pub fn prefix_from_mask_v6(mask: &[u8; 16]) -> u8 {
    u128::from_be_bytes(*mask).leading_ones() as u8
}

/// Build a network-order IPv4 netmask. `0` gives an all-zero mask.
pub fn prefix_to_mask_v4(prefix: u8) -> u32 {
    let shift = 32u32.saturating_sub(u32::from(prefix));
    u32::MAX.checked_shl(shift).unwrap_or(0).to_be()
}

/// Build an IPv6 netmask.
pub fn prefix_to_mask_v6(prefix: u8) -> [u8; 16] {
    let shift = 128u32.saturating_sub(u32::from(prefix));
    u128::MAX.checked_shl(shift).unwrap_or(0).to_be_bytes()
}

/// Check a prefix length against the family range.
pub fn validate_prefix(prefix: u32, family: Family) -> Result<u8> {
    if prefix > u32::from(family.max_prefix()) {
        return Err(Error::InvalidIpPrefix(prefix.to_string()));
    }
    Ok(prefix as u8)
}

/// Parse decimal prefix text and validate it.
pub fn parse_prefix(text: &str, family: Family) -> Result<u8> {
    let prefix: u32 = text
        .parse()
        .map_err(|_| Error::InvalidIpPrefix(text.to_string()))?;
    validate_prefix(prefix, family)
}

pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    text.parse()
        .map_err(|_| Error::InvalidIp(text.to_string()))
}

pub fn parse_ipv6(text: &str) -> Result<Ipv6Addr> {
    text.parse()
        .map_err(|_| Error::InvalidIp(text.to_string()))
}

/// Parse address text of the given family.
pub fn parse_address(text: &str, family: Family) -> Result<IpAddr> {
    match family {
        Family::V4 => parse_ipv4(text).map(IpAddr::V4),
        Family::V6 => parse_ipv6(text).map(IpAddr::V6),
    }
}

/// `addr/prefix`.
pub fn format_cidr(addr: IpAddr, prefix: u8) -> String {
    format!("{}/{}", addr, prefix)
}

/// `a.b.c.d:port` or `[v6]:port`, without scope or flow info.
pub fn format_endpoint(endpoint: &SocketAddr) -> String {
    match endpoint {
        SocketAddr::V4(v4) => format!("{}:{}", v4.ip(), v4.port()),
        SocketAddr::V6(v6) => format!("[{}]:{}", v6.ip(), v6.port()),
    }
}
