//! Winnow parsers for RTNetlink replies.
//!
//! Only the link dump needs a typed parser here: WireGuard links are found
//! by walking `RTM_NEWLINK` replies and reading `IFLA_LINKINFO/IFLA_INFO_KIND`.

use winnow::binary::{Endianness, u16 as ne_u16};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use super::attr::{AttrIter, NLA_HDRLEN, NLA_TYPE_MASK, get, nla_align};
use super::error::{Error, Result};
use super::types::{IfInfoMsg, IflaAttr, IflaInfo};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Parse one attribute header and payload, consuming its padding.
pub fn parse_attr<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let len = ne_u16(Endianness::Native).parse_next(input)? as usize;
    let attr_type = ne_u16(Endianness::Native).parse_next(input)?;

    if len < NLA_HDRLEN {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    let payload: &[u8] = take(len - NLA_HDRLEN).parse_next(input)?;

    let padding = nla_align(len) - len;
    if input.len() >= padding {
        let _: &[u8] = take(padding).parse_next(input)?;
    }

    Ok((attr_type & NLA_TYPE_MASK, payload))
}

/// A link as reported by an `RTM_GETLINK` dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMessage {
    /// Interface index.
    pub index: u32,
    /// Interface name (IFLA_IFNAME).
    pub name: Option<String>,
    /// Link kind from IFLA_LINKINFO (e.g. "wireguard", "dummy").
    pub kind: Option<String>,
}

impl LinkMessage {
    /// Parse an `ifinfomsg` followed by its attributes.
    pub fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes: &[u8] = take(IfInfoMsg::SIZE).parse_next(input)?;
        let header = IfInfoMsg::from_bytes(header_bytes)
            .map_err(|_| ErrMode::Cut(ContextError::new()))?;

        let mut msg = LinkMessage {
            index: header.ifi_index as u32,
            ..Default::default()
        };

        while input.len() >= NLA_HDRLEN {
            let (attr_type, payload) = parse_attr(input)?;
            match attr_type {
                t if t == IflaAttr::Ifname as u16 => {
                    msg.name = get::string(payload).ok().map(str::to_string);
                }
                t if t == IflaAttr::Linkinfo as u16 => {
                    msg.kind = AttrIter::new(payload)
                        .find(|(t, _)| *t == IflaInfo::Kind as u16)
                        .and_then(|(_, kind)| get::string(kind).ok())
                        .map(str::to_string);
                }
                _ => {}
            }
        }

        Ok(msg)
    }

    /// Parse from a complete message payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse
            .parse(data)
            .map_err(|e| Error::Parse(format!("link message: {}", e)))
    }

    /// Check whether this link has the given kind.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::message::NLMSG_HDRLEN;

    fn link_payload(index: i32, name: &str, kind: Option<&str>) -> Vec<u8> {
        let mut builder = MessageBuilder::new(16, 0);
        builder.append(&IfInfoMsg::new().with_index(index));
        builder.append_attr_str(IflaAttr::Ifname as u16, name);
        if let Some(kind) = kind {
            let info = builder.nest_start(IflaAttr::Linkinfo as u16);
            builder.append_attr_str(IflaInfo::Kind as u16, kind);
            builder.nest_end(info);
        }
        builder.finish().unwrap()[NLMSG_HDRLEN..].to_vec()
    }

    #[test]
    fn test_parse_attr_consumes_padding() {
        let data = [5u8, 0, 1, 0, 0xaa, 0, 0, 0, 8, 0, 2, 0, 1, 2, 3, 4];
        let mut input = &data[..];
        let (t, p) = parse_attr(&mut input).unwrap();
        assert_eq!((t, p), (1, &[0xaa][..]));
        let (t, p) = parse_attr(&mut input).unwrap();
        assert_eq!((t, p), (2, &[1, 2, 3, 4][..]));
        assert!(input.is_empty());
    }

    #[test]
    fn test_parse_wireguard_link() {
        let payload = link_payload(9, "wg0", Some("wireguard"));
        let link = LinkMessage::from_bytes(&payload).unwrap();
        assert_eq!(link.index, 9);
        assert_eq!(link.name.as_deref(), Some("wg0"));
        assert!(link.is_kind("wireguard"));
    }

    #[test]
    fn test_parse_link_without_info() {
        let payload = link_payload(1, "lo", None);
        let link = LinkMessage::from_bytes(&payload).unwrap();
        assert_eq!(link.name.as_deref(), Some("lo"));
        assert!(link.kind.is_none());
        assert!(!link.is_kind("wireguard"));
    }

    #[test]
    fn test_parse_truncated_header() {
        assert!(LinkMessage::from_bytes(&[0u8; 4]).is_err());
    }
}
