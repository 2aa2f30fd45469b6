//! Interface name and index utilities.

use std::ffi::CString;

use crate::error::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = libc::IFNAMSIZ;

/// Convert an interface name to its index.
///
/// An unknown name, or one the kernel could never hold, is `DEV_NOT_FOUND`.
pub fn name_to_index(name: &str) -> Result<u32> {
    let cname = CString::new(name).map_err(|_| Error::dev_not_found(name))?;

    // SAFETY: `cname` is a valid NUL-terminated string for the whole call.
    let index = unsafe { libc::if_nametoindex(cname.as_ptr()) };
    if index == 0 {
        return Err(Error::dev_not_found(name));
    }
    Ok(index)
}

/// Copy `name` into a fixed `IFNAMSIZ` buffer, truncated to leave a terminator.
pub fn to_ifr_name(name: &str) -> [libc::c_char; IFNAMSIZ] {
    let mut buf = [0 as libc::c_char; IFNAMSIZ];
    for (dst, src) in buf.iter_mut().zip(name.bytes().take(IFNAMSIZ - 1)) {
        *dst = src as libc::c_char;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_loopback_index() {
        assert!(name_to_index("lo").unwrap() > 0);
    }

    #[test]
    fn test_unknown_name() {
        let err = name_to_index("nonexistent_x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DevNotFound);
        assert_eq!(
            name_to_index("bad\0name").unwrap_err().kind(),
            ErrorKind::DevNotFound
        );
    }

    #[test]
    fn test_ifr_name_truncates() {
        let buf = to_ifr_name("abcdefghijklmnopqrs");
        assert_eq!(buf[14], b'o' as libc::c_char);
        assert_eq!(buf[15], 0);

        let buf = to_ifr_name("wg0");
        assert_eq!(&buf[..4], &[b'w' as libc::c_char, b'g' as _, b'0' as _, 0]);
    }
}
