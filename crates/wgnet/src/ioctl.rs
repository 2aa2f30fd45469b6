//! IPv4 addressing and interface flags through `ioctl(2)`.
//!
//! Requests go through an `AF_INET` datagram socket with a `struct ifreq`
//! naming the interface. The socket is an [`OwnedFd`], so it is closed on
//! every exit path.

use std::io;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::codec::prefix_to_mask_v4;
use crate::error::{Error, Result};
use crate::util::ifname::to_ifr_name;

#[cfg(target_env = "musl")]
type IoctlRequest = libc::c_int;
#[cfg(not(target_env = "musl"))]
type IoctlRequest = libc::c_ulong;

/// Control socket used for interface ioctls.
#[derive(Debug)]
pub struct CtlSocket {
    fd: OwnedFd,
}

impl CtlSocket {
    /// Open an `AF_INET/SOCK_DGRAM` socket.
    pub fn open() -> Result<Self> {
        // SAFETY: plain socket(2) call, the result is checked below.
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
        if fd < 0 {
            return Err(Error::CtlSocketFailed(io::Error::last_os_error()));
        }

        // SAFETY: `fd` is a freshly opened descriptor nobody else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    fn ioctl(&self, request: IoctlRequest, ifr: &mut libc::ifreq) -> io::Result<()> {
        // SAFETY: every request issued here reads or writes a `struct ifreq`.
        let ret = unsafe { libc::ioctl(self.fd.as_raw_fd(), request as _, ifr as *mut libc::ifreq) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Set the interface address, then its netmask.
    ///
    /// A netmask failure leaves the new address in place.
    pub fn assign_ipv4(&self, name: &str, addr: Ipv4Addr, prefix: u8) -> Result<()> {
        let mut ifr = ifreq_with_addr(name, u32::from_ne_bytes(addr.octets()));
        self.ioctl(libc::SIOCSIFADDR as IoctlRequest, &mut ifr)
            .map_err(|source| Error::DevIpSetFailed {
                name: name.to_string(),
                source,
            })?;

        let mut ifr = ifreq_with_addr(name, prefix_to_mask_v4(prefix));
        self.ioctl(libc::SIOCSIFNETMASK as IoctlRequest, &mut ifr)
            .map_err(|source| Error::DevNetmaskSetFailed {
                name: name.to_string(),
                source,
            })?;

        tracing::debug!(ifname = name, %addr, prefix, "assigned IPv4 address");
        Ok(())
    }

    /// Read the interface flags and set `IFF_UP`.
    pub fn bring_up(&self, name: &str) -> Result<()> {
        let mut ifr = ifreq_named(name);
        self.ioctl(libc::SIOCGIFFLAGS as IoctlRequest, &mut ifr)
            .map_err(|source| Error::GetDevFlagsFailed {
                name: name.to_string(),
                source,
            })?;

        // SAFETY: SIOCGIFFLAGS filled the flags member of the union.
        unsafe {
            ifr.ifr_ifru.ifru_flags |= libc::IFF_UP as libc::c_short;
        }

        self.ioctl(libc::SIOCSIFFLAGS as IoctlRequest, &mut ifr)
            .map_err(|source| Error::SetDevFlagsFailed {
                name: name.to_string(),
                source,
            })?;

        tracing::debug!(ifname = name, "interface up");
        Ok(())
    }
}

/// Assign an IPv4 address and netmask on a fresh control socket.
pub fn assign_ipv4(name: &str, addr: Ipv4Addr, prefix: u8) -> Result<()> {
    CtlSocket::open()?.assign_ipv4(name, addr, prefix)
}

/// Bring an interface administratively up on a fresh control socket.
pub fn bring_up(name: &str) -> Result<()> {
    CtlSocket::open()?.bring_up(name)
}

fn ifreq_named(name: &str) -> libc::ifreq {
    // SAFETY: `ifreq` is plain old data, all-zero is a valid value.
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    ifr.ifr_name = to_ifr_name(name);
    ifr
}

/// `ifreq` carrying an `AF_INET` sockaddr whose address is `s_addr`
/// (already in network byte order).
fn ifreq_with_addr(name: &str, s_addr: u32) -> libc::ifreq {
    let mut ifr = ifreq_named(name);
    let sin = libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: 0,
        sin_addr: libc::in_addr { s_addr },
        sin_zero: [0; 8],
    };

    // SAFETY: the union member is a 16-byte sockaddr, the same size as
    // sockaddr_in, and the write does not assume alignment.
    unsafe {
        let dst = std::ptr::addr_of_mut!(ifr.ifr_ifru.ifru_addr) as *mut libc::sockaddr_in;
        dst.write_unaligned(sin);
    }
    ifr
}
