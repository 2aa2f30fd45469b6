//! Error types for interface and WireGuard operations.
//!
//! Every failure maps onto one [`ErrorKind`] with a stable numeric code
//! (`0` is reserved for success). The [`Error`] value additionally keeps the
//! interface name and the underlying OS or kernel error for logging.

use std::collections::TryReserveError;
use std::fmt;
use std::io;

use crate::netlink;

/// Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Flat error classification with stable codes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    NoMem = 1,
    CtlSocketFailed = 2,
    NetlinkSocketFailed = 3,
    GetDevFlagsFailed = 4,
    SetDevFlagsFailed = 5,
    InvalidIpStr = 6,
    InvalidIp = 7,
    InvalidIpPrefix = 8,
    DevIpSetFailed = 9,
    DevNetmaskSetFailed = 10,
    DevNotFound = 11,
    NetlinkSendFailed = 12,
    GetifaddrsFailed = 13,
    DevAddFailed = 14,
    DevSetFailed = 15,
    PeerNotFound = 16,
    DevDelFailed = 17,
    InvalidKey = 18,
}

impl ErrorKind {
    const ALL: [ErrorKind; 18] = [
        Self::NoMem,
        Self::CtlSocketFailed,
        Self::NetlinkSocketFailed,
        Self::GetDevFlagsFailed,
        Self::SetDevFlagsFailed,
        Self::InvalidIpStr,
        Self::InvalidIp,
        Self::InvalidIpPrefix,
        Self::DevIpSetFailed,
        Self::DevNetmaskSetFailed,
        Self::DevNotFound,
        Self::NetlinkSendFailed,
        Self::GetifaddrsFailed,
        Self::DevAddFailed,
        Self::DevSetFailed,
        Self::PeerNotFound,
        Self::DevDelFailed,
        Self::InvalidKey,
    ];

    /// Stable numeric code of this kind.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a kind by code. `0` (success) and unknown codes give `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Constant-style name, e.g. `DEV_NOT_FOUND`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMem => "NOMEM",
            Self::CtlSocketFailed => "CTL_SOCKET_FAILED",
            Self::NetlinkSocketFailed => "NETLINK_SOCKET_FAILED",
            Self::GetDevFlagsFailed => "GET_DEV_FLAGS_FAILED",
            Self::SetDevFlagsFailed => "SET_DEV_FLAGS_FAILED",
            Self::InvalidIpStr => "INVALID_IP_STR",
            Self::InvalidIp => "INVALID_IP",
            Self::InvalidIpPrefix => "INVALID_IP_PREFIX",
            Self::DevIpSetFailed => "DEV_IP_SET_FAILED",
            Self::DevNetmaskSetFailed => "DEV_NETMASK_SET_FAILED",
            Self::DevNotFound => "DEV_NOT_FOUND",
            Self::NetlinkSendFailed => "NETLINK_SEND_FAILED",
            Self::GetifaddrsFailed => "GETIFADDRS_FAILED",
            Self::DevAddFailed => "DEV_ADD_FAILED",
            Self::DevSetFailed => "DEV_SET_FAILED",
            Self::PeerNotFound => "PEER_NOT_FOUND",
            Self::DevDelFailed => "DEV_DEL_FAILED",
            Self::InvalidKey => "INVALID_KEY",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by interface and WireGuard operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An allocation could not be reserved.
    #[error("out of memory: {0}")]
    NoMem(#[from] TryReserveError),

    /// The AF_INET control socket could not be opened.
    #[error("cannot open control socket: {0}")]
    CtlSocketFailed(#[source] io::Error),

    /// A netlink socket could not be opened.
    #[error("cannot open netlink socket: {0}")]
    NetlinkSocketFailed(#[source] netlink::Error),

    #[error("SIOCGIFFLAGS on {name} failed: {source}")]
    GetDevFlagsFailed { name: String, source: io::Error },

    #[error("SIOCSIFFLAGS on {name} failed: {source}")]
    SetDevFlagsFailed { name: String, source: io::Error },

    /// Address text does not fit the address/prefix buffers.
    #[error("invalid address string: {0}")]
    InvalidIpStr(String),

    /// Address text is not a valid address of the expected family.
    #[error("invalid IP address: {0}")]
    InvalidIp(String),

    /// Prefix is non-numeric or out of range for the family.
    #[error("invalid prefix length: {0}")]
    InvalidIpPrefix(String),

    #[error("SIOCSIFADDR on {name} failed: {source}")]
    DevIpSetFailed { name: String, source: io::Error },

    #[error("SIOCSIFNETMASK on {name} failed: {source}")]
    DevNetmaskSetFailed { name: String, source: io::Error },

    /// No interface (or WireGuard device) with this name. `source` holds the
    /// kernel's answer when the lookup went through netlink.
    #[error("device not found: {name}")]
    DevNotFound {
        name: String,
        #[source]
        source: Option<netlink::Error>,
    },

    /// The kernel could not be reached, or rejected the request.
    #[error("netlink request failed: {0}")]
    NetlinkSendFailed(#[source] netlink::Error),

    /// The interface address walk failed.
    #[error("getifaddrs failed: {0}")]
    GetifaddrsFailed(#[source] io::Error),

    #[error("cannot add WireGuard device {name}: {source}")]
    DevAddFailed {
        name: String,
        source: netlink::Error,
    },

    #[error("cannot configure WireGuard device {name}: {source}")]
    DevSetFailed {
        name: String,
        source: netlink::Error,
    },

    /// No peer with this public key on the device.
    #[error("peer not found on {name}: {public_key}")]
    PeerNotFound { name: String, public_key: String },

    #[error("cannot delete device {name}: {source}")]
    DevDelFailed {
        name: String,
        source: netlink::Error,
    },

    /// Key text is not base64 of exactly 32 bytes.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl Error {
    /// The flat classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoMem(_) => ErrorKind::NoMem,
            Self::CtlSocketFailed(_) => ErrorKind::CtlSocketFailed,
            Self::NetlinkSocketFailed(_) => ErrorKind::NetlinkSocketFailed,
            Self::GetDevFlagsFailed { .. } => ErrorKind::GetDevFlagsFailed,
            Self::SetDevFlagsFailed { .. } => ErrorKind::SetDevFlagsFailed,
            Self::InvalidIpStr(_) => ErrorKind::InvalidIpStr,
            Self::InvalidIp(_) => ErrorKind::InvalidIp,
            Self::InvalidIpPrefix(_) => ErrorKind::InvalidIpPrefix,
            Self::DevIpSetFailed { .. } => ErrorKind::DevIpSetFailed,
            Self::DevNetmaskSetFailed { .. } => ErrorKind::DevNetmaskSetFailed,
            Self::DevNotFound { .. } => ErrorKind::DevNotFound,
            Self::NetlinkSendFailed(_) => ErrorKind::NetlinkSendFailed,
            Self::GetifaddrsFailed(_) => ErrorKind::GetifaddrsFailed,
            Self::DevAddFailed { .. } => ErrorKind::DevAddFailed,
            Self::DevSetFailed { .. } => ErrorKind::DevSetFailed,
            Self::PeerNotFound { .. } => ErrorKind::PeerNotFound,
            Self::DevDelFailed { .. } => ErrorKind::DevDelFailed,
            Self::InvalidKey(_) => ErrorKind::InvalidKey,
        }
    }

    /// Stable numeric code, shorthand for `self.kind().code()`.
    pub fn code(&self) -> u32 {
        self.kind().code()
    }

    pub(crate) fn dev_not_found(name: &str) -> Self {
        Self::DevNotFound {
            name: name.to_string(),
            source: None,
        }
    }

    /// Get the OS or kernel errno behind this error, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::CtlSocketFailed(e) | Self::GetifaddrsFailed(e) => e.raw_os_error(),
            Self::GetDevFlagsFailed { source, .. }
            | Self::SetDevFlagsFailed { source, .. }
            | Self::DevIpSetFailed { source, .. }
            | Self::DevNetmaskSetFailed { source, .. } => source.raw_os_error(),
            Self::NetlinkSocketFailed(e) | Self::NetlinkSendFailed(e) => e.errno(),
            Self::DevAddFailed { source, .. }
            | Self::DevSetFailed { source, .. }
            | Self::DevDelFailed { source, .. } => source.errno(),
            Self::DevNotFound { source, .. } => source.as_ref().and_then(netlink::Error::errno),
            _ => None,
        }
    }
}
