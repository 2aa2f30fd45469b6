//! Netlink message header and reply iteration.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::{Error, Result};

pub const NLMSG_ALIGNTO: usize = 4;

/// Round `len` up to the next multiple of [`NLMSG_ALIGNTO`].
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// `struct nlmsghdr` size, 16 bytes.
pub const NLMSG_HDRLEN: usize = nlmsg_align(size_of::<NlMsgHdr>());

/// View the start of `data` as a fixed-layout kernel struct.
pub(crate) fn ref_prefix<T>(data: &[u8]) -> Result<&T>
where
    T: FromBytes + Immutable + KnownLayout,
{
    T::ref_from_prefix(data)
        .map(|(value, _)| value)
        .map_err(|_| Error::Truncated {
            expected: size_of::<T>(),
            actual: data.len(),
        })
}

/// `struct nlmsghdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Total length, header included.
    pub nlmsg_len: u32,
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    pub nlmsg_seq: u32,
    /// Port id of the sender, 0 for the kernel.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Header of an empty message; the builder patches the length.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    pub fn as_bytes(&self) -> &[u8] {
        IntoBytes::as_bytes(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ref_prefix(data)
    }
}

/// Netlink message types used by this crate.
pub struct NlMsgType;

impl NlMsgType {
    /// `NLMSG_ERROR`, also used for ACKs.
    pub const ERROR: u16 = 2;
    /// `NLMSG_DONE`, closes a dump.
    pub const DONE: u16 = 3;

    pub const RTM_NEWLINK: u16 = 16;
    pub const RTM_DELLINK: u16 = 17;
    pub const RTM_GETLINK: u16 = 18;

    pub const RTM_NEWADDR: u16 = 20;
}

pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;

// GET
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

// NEW
pub const NLM_F_REPLACE: u16 = 0x100;
pub const NLM_F_EXCL: u16 = 0x200;
pub const NLM_F_CREATE: u16 = 0x400;

/// Iterator over the netlink messages packed in one datagram.
///
/// Yields `(header, payload)` where the payload excludes the header.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(&'a NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLMSG_HDRLEN {
            return None;
        }

        let data = std::mem::take(&mut self.data);
        let header = match NlMsgHdr::from_bytes(data) {
            Ok(header) => header,
            Err(e) => return Some(Err(e)),
        };

        // a bad length leaves the iterator empty
        let len = header.nlmsg_len as usize;
        let Some(payload) = data.get(NLMSG_HDRLEN..len) else {
            return Some(Err(Error::InvalidMessage(format!(
                "nlmsg_len {} outside datagram of {} bytes",
                len,
                data.len()
            ))));
        };

        self.data = data.get(nlmsg_align(len)..).unwrap_or_default();
        Some(Ok((header, payload)))
    }
}

/// `struct nlmsgerr`: a negative errno, or 0 for an ACK, plus the
/// header of the request it answers.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    pub error: i32,
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ref_prefix(data)
    }

    pub fn is_ack(&self) -> bool {
        self.error == 0
    }

    /// Convert into a result: `Ok` for an ACK, the kernel error otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.is_ack() {
            Ok(())
        } else {
            Err(Error::from_errno(self.error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut hdr = NlMsgHdr::new(msg_type, 0);
        hdr.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
        hdr.nlmsg_seq = seq;
        let mut buf = hdr.as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nlmsg_align(buf.len()), 0);
        buf
    }

    #[test]
    fn test_header_size() {
        assert_eq!(NLMSG_HDRLEN, 16);
        assert_eq!(nlmsg_align(17), 20);
        assert_eq!(nlmsg_align(20), 20);
    }

    #[test]
    fn test_iterates_packed_messages() {
        let mut data = frame(NlMsgType::RTM_NEWLINK, 7, &[1, 2, 3]);
        data.extend(frame(NlMsgType::DONE, 7, &[0, 0, 0, 0]));

        let msgs: Vec<_> = MessageIter::new(&data).collect::<Result<_>>().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].0.nlmsg_type, NlMsgType::RTM_NEWLINK);
        assert_eq!(msgs[0].1, &[1, 2, 3]);
        assert!(msgs[1].0.is_done());
        assert_eq!(msgs[1].0.nlmsg_seq, 7);
    }

    #[test]
    fn test_bad_length_stops_iteration() {
        let mut data = frame(NlMsgType::RTM_NEWLINK, 1, &[]);
        data[0..4].copy_from_slice(&1000u32.to_ne_bytes());

        let mut iter = MessageIter::new(&data);
        assert!(matches!(iter.next(), Some(Err(Error::InvalidMessage(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_nlmsgerr() {
        let mut payload = (-libc::EEXIST).to_ne_bytes().to_vec();
        payload.extend_from_slice(NlMsgHdr::new(NlMsgType::RTM_NEWADDR, 0).as_bytes());

        let err = NlMsgError::from_bytes(&payload).unwrap();
        assert!(!err.is_ack());
        assert!(err.into_result().unwrap_err().is_already_exists());

        let mut ack = 0i32.to_ne_bytes().to_vec();
        ack.extend_from_slice(NlMsgHdr::default().as_bytes());
        assert!(NlMsgError::from_bytes(&ack).unwrap().into_result().is_ok());
    }
}
