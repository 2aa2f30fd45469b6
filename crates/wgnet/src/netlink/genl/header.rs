//! `struct genlmsghdr`.
//!
//! A generic netlink frame is the usual `nlmsghdr`, with `nlmsg_type` set to
//! the resolved family id, then this 4-byte header, then attributes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    /// Family-defined command, e.g. `WG_CMD_GET_DEVICE`.
    pub cmd: u8,
    pub version: u8,
    pub reserved: u16,
}

pub const GENL_HDRLEN: usize = size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    #[inline]
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Split a GENL payload into its header and attribute bytes.
    pub fn split(payload: &[u8]) -> Option<(&Self, &[u8])> {
        Self::ref_from_prefix(payload).ok()
    }
}
