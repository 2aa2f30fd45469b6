//! Generic Netlink connection with family resolution.

use super::header::GenlMsgHdr;
use super::{CtrlAttr, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::{Connection, ack_request, dump_request};
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{MessageIter, NlMsgError};
use crate::netlink::socket::NetlinkSocket;

/// Information about a Generic Netlink family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    pub version: u8,
}

/// Generic Netlink connection.
pub struct GenlConnection {
    conn: Connection,
}

impl GenlConnection {
    /// Create a GENL connection from an existing `Protocol::Generic` socket.
    pub fn from_socket(socket: NetlinkSocket) -> Self {
        Self {
            conn: Connection::from_socket(socket),
        }
    }

    /// Ask `nlctrl` for the family registered under `name`.
    pub fn resolve_family(&self, name: &str) -> Result<FamilyInfo> {
        let socket = self.conn.socket();
        let mut builder = ack_request(GENL_ID_CTRL);
        builder.append(&GenlMsgHdr::new(CtrlCmd::GetFamily as u8, 1));
        builder.append_attr_str(CtrlAttr::FamilyName as u16, name);

        let seq = socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(socket.pid());
        socket.send(&builder.finish()?)?;

        loop {
            let response = socket.recv_msg()?;
            if let Some(info) = parse_family_response(&response, seq, name)? {
                tracing::debug!(family = name, id = info.id, "resolved genl family");
                return Ok(info);
            }
        }
    }

    /// Send a GENL command and wait for the kernel's ACK.
    pub fn command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder),
    ) -> Result<()> {
        let mut builder = ack_request(family_id);
        builder.append(&GenlMsgHdr::new(cmd, version));
        build_attrs(&mut builder);
        self.conn.request_ack(builder)
    }

    /// Send a GENL dump command and collect every reply payload.
    ///
    /// Payloads still start with the genlmsghdr.
    pub fn dump_command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<Vec<u8>>> {
        let mut builder = dump_request(family_id);
        builder.append(&GenlMsgHdr::new(cmd, version));
        build_attrs(&mut builder);
        self.conn.dump(builder)
    }
}

/// Parse a CTRL_CMD_GETFAMILY reply datagram.
///
/// Returns `Ok(None)` when the datagram holds nothing for `seq` (or only the
/// trailing ACK), so the caller keeps reading.
fn parse_family_response(data: &[u8], seq: u32, name: &str) -> Result<Option<FamilyInfo>> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != seq || header.is_done() {
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            if err.error == -libc::ENOENT {
                return Err(Error::FamilyNotFound {
                    name: name.to_string(),
                });
            }
            err.into_result()?;
            continue;
        }

        let (_, attrs) = GenlMsgHdr::split(payload)
            .ok_or_else(|| Error::InvalidMessage("GENL header too short".into()))?;
        return parse_family_attrs(attrs).map(Some);
    }

    Ok(None)
}

fn parse_family_attrs(data: &[u8]) -> Result<FamilyInfo> {
    let mut id = None;
    let mut version = 0;

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == CtrlAttr::FamilyId as u16 => id = Some(get::u16_ne(payload)?),
            t if t == CtrlAttr::Version as u16 => version = get::u32_ne(payload)? as u8,
            _ => {}
        }
    }

    let id = id.ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;

    Ok(FamilyInfo { id, version })
}
