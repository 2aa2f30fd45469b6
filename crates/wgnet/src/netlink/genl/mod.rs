//! Generic Netlink (GENL) support.
//!
//! WireGuard configuration is carried by a dynamically registered GENL
//! family. Its numeric ID is resolved through the fixed control family
//! (`nlctrl`) before any device request is sent.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ WireguardConnection                     │
//! └────────────────┬────────────────────────┘
//!                  │ family id, cmd, attrs
//! ┌────────────────▼────────────────────────┐
//! │ GenlConnection (family resolution)      │
//! └────────────────┬────────────────────────┘
//!                  │
//! ┌────────────────▼────────────────────────┐
//! │ Connection / NetlinkSocket (Generic)    │
//! └─────────────────────────────────────────┘
//! ```

mod connection;
mod header;

pub use connection::{FamilyInfo, GenlConnection};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// Control family ID (fixed, not dynamically assigned).
pub const GENL_ID_CTRL: u16 = 0x10;

/// Control family commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Unspec = 0,
    GetFamily = 3,
}

/// Control family attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    Unspec = 0,
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
}
