//! RTNetlink family headers and attribute identifiers.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::Result;
use super::message::ref_prefix;

/// `struct ifaddrmsg`, the fixed header of `RTM_*ADDR` messages.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrMsg {
    pub ifa_family: u8,
    pub ifa_prefixlen: u8,
    /// Low 8 bits of `IFA_F_*`.
    pub ifa_flags: u8,
    pub ifa_scope: u8,
    pub ifa_index: u32,
}

impl IfAddrMsg {
    pub const SIZE: usize = size_of::<Self>();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.ifa_family = family;
        self
    }

    pub fn with_prefixlen(mut self, prefixlen: u8) -> Self {
        self.ifa_prefixlen = prefixlen;
        self
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.ifa_flags = flags;
        self
    }

    pub fn with_scope(mut self, scope: u8) -> Self {
        self.ifa_scope = scope;
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.ifa_index = index;
        self
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ref_prefix(data)
    }
}

/// `IFA_*`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaAttr {
    Unspec = 0,
    Address = 1,
    Local = 2,
}

pub mod ifa_flags {
    pub const PERMANENT: u8 = 0x80;
}

/// `struct ifinfomsg`, the fixed header of `RTM_*LINK` messages.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    pub ifi_family: u8,
    pub __ifi_pad: u8,
    pub ifi_type: u16,
    pub ifi_index: i32,
    pub ifi_flags: u32,
    pub ifi_change: u32,
}

impl IfInfoMsg {
    pub const SIZE: usize = size_of::<Self>();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.ifi_index = index;
        self
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ref_prefix(data)
    }
}

/// `IFLA_*` used for WireGuard links.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IflaAttr {
    Unspec = 0,
    Ifname = 3,
    Linkinfo = 18,
}

/// Nested inside `IFLA_LINKINFO`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IflaInfo {
    Unspec = 0,
    Kind = 1,
    Data = 2,
}
