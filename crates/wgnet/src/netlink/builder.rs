//! Request framing.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Open nested attribute; hand back to [`MessageBuilder::nest_end`].
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct NestToken {
    offset: usize,
}

/// Growable netlink request.
///
/// Every append keeps the buffer aligned, so the length written by
/// [`finish`](Self::finish) is always the running aligned sum. An attribute
/// whose length does not fit `nla_len` makes `finish` fail.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    oversized: Option<usize>,
}

impl MessageBuilder {
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(NlMsgHdr::new(msg_type, flags).as_bytes());
        Self {
            buf,
            oversized: None,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True while only the header has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    fn pad(&mut self, align: fn(usize) -> usize) {
        self.buf.resize(align(self.buf.len()), 0);
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn attr_len(&mut self, len: usize) -> u16 {
        u16::try_from(len).unwrap_or_else(|_| {
            self.oversized.get_or_insert(len);
            0
        })
    }

    /// Append a family header such as `ifaddrmsg` or `genlmsghdr`.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.buf.extend_from_slice(data.as_bytes());
        self.pad(nlmsg_align);
    }

    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) {
        let header = NlAttr {
            nla_len: self.attr_len(NLA_HDRLEN + data.len()),
            nla_type: attr_type,
        };
        self.buf.extend_from_slice(header.as_bytes());
        self.buf.extend_from_slice(data);
        self.pad(nla_align);
    }

    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) {
        self.append_attr(attr_type, &[value]);
    }

    pub fn append_attr_u16(&mut self, attr_type: u16, value: u16) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// String attribute with its NUL terminator.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        self.append_attr(attr_type, &data);
    }

    /// Open a nested attribute; its length is filled in by [`nest_end`](Self::nest_end).
    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let offset = self.buf.len();
        let header = NlAttr {
            nla_len: NLA_HDRLEN as u16,
            nla_type: attr_type | NLA_F_NESTED,
        };
        self.buf.extend_from_slice(header.as_bytes());
        NestToken { offset }
    }

    pub fn nest_end(&mut self, token: NestToken) {
        let len = self.attr_len(self.buf.len() - token.offset);
        self.put(token.offset, &len.to_ne_bytes());
        self.pad(nla_align);
    }

    pub fn set_seq(&mut self, seq: u32) {
        self.put(8, &seq.to_ne_bytes());
    }

    pub fn set_pid(&mut self, pid: u32) {
        self.put(12, &pid.to_ne_bytes());
    }

    /// Replace the flags given to [`new`](Self::new).
    pub fn set_flags(&mut self, flags: u16) {
        self.put(6, &flags.to_ne_bytes());
    }

    /// Patch `nlmsg_len` and return the frame.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if let Some(len) = self.oversized {
            return Err(Error::InvalidAttribute(format!(
                "attribute of {} bytes exceeds the {} byte limit",
                len,
                u16::MAX
            )));
        }
        let len = u32::try_from(self.buf.len())
            .map_err(|_| Error::InvalidMessage(format!("{} byte message", self.buf.len())))?;
        self.put(0, &len.to_ne_bytes());
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrIter, NLA_HDRLEN, get};
    use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST, NlMsgType};

    #[test]
    fn test_header_only() {
        let frame = MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST).finish().unwrap();
        let hdr = NlMsgHdr::from_bytes(&frame).unwrap();
        assert_eq!(
            (hdr.nlmsg_len as usize, hdr.nlmsg_type, hdr.nlmsg_flags),
            (NLMSG_HDRLEN, NlMsgType::RTM_GETLINK, NLM_F_REQUEST)
        );
        assert_eq!(frame.len(), NLMSG_HDRLEN);
    }

    #[test]
    fn test_seq_pid_flags() {
        let mut builder = MessageBuilder::new(20, NLM_F_REQUEST);
        builder.set_seq(42);
        builder.set_pid(1234);
        builder.set_flags(NLM_F_REQUEST | NLM_F_ACK);
        let msg = builder.finish().unwrap();

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_seq, 42);
        assert_eq!(header.nlmsg_pid, 1234);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK);
    }

    #[test]
    fn test_attribute_padding() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_REQUEST);
        builder.append_attr_u8(1, 0xab);
        assert_eq!(builder.len(), NLMSG_HDRLEN + 8);
        builder.append_attr_str(2, "wg0");
        assert_eq!(builder.len(), NLMSG_HDRLEN + 8 + NLA_HDRLEN + 4);
        let msg = builder.finish().unwrap();

        let attrs: Vec<_> = AttrIter::new(&msg[NLMSG_HDRLEN..]).collect();
        assert_eq!(attrs[0], (1, &[0xab][..]));
        assert_eq!(get::string(attrs[1].1).unwrap(), "wg0");
    }

    #[test]
    fn test_nested_attribute() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_REQUEST);
        let nest = builder.nest_start(8);
        builder.append_attr_u32(2, 100);
        builder.nest_end(nest);
        let msg = builder.finish().unwrap();

        let (kind, payload) = AttrIter::new(&msg[NLMSG_HDRLEN..]).next().unwrap();
        assert_eq!(kind, 8);
        assert_eq!(payload.len(), NLA_HDRLEN + 4);
        let inner: Vec<_> = AttrIter::new(payload).collect();
        assert_eq!(get::u32_ne(inner[0].1).unwrap(), 100);

        // flag survives on the wire
        let raw_type = u16::from_ne_bytes([msg[NLMSG_HDRLEN + 2], msg[NLMSG_HDRLEN + 3]]);
        assert_ne!(raw_type & NLA_F_NESTED, 0);
    }

    #[test]
    fn test_oversized_nest_fails() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_REQUEST);
        let nest = builder.nest_start(1);
        for i in 0..5000u16 {
            builder.append_attr(i & 0x7fff, &[0u8; 12]);
        }
        builder.nest_end(nest);
        assert!(builder.len() > usize::from(u16::MAX));
        assert!(matches!(builder.finish(), Err(Error::InvalidAttribute(_))));
    }

    #[test]
    fn test_oversized_attr_fails() {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, NLM_F_REQUEST);
        builder.append_attr(1, &vec![0u8; usize::from(u16::MAX)]);
        assert!(builder.finish().is_err());
    }
}
