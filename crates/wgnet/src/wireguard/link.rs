//! WireGuard link lifecycle over RTNetlink.

use super::WG_LINK_KIND;
use crate::config::Config;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::{Connection, ack_request, create_excl_request, dump_request};
use crate::netlink::error::Result;
use crate::netlink::message::NlMsgType;
use crate::netlink::parse::LinkMessage;
use crate::netlink::socket::{NetlinkSocket, Protocol};
use crate::netlink::types::{IfInfoMsg, IflaAttr, IflaInfo};

/// `RTM_NEWLINK` creating a WireGuard link. Fails with `EEXIST` if taken.
pub fn build_newlink(name: &str) -> MessageBuilder {
    let mut builder = create_excl_request(NlMsgType::RTM_NEWLINK);
    builder.append(&IfInfoMsg::new());
    builder.append_attr_str(IflaAttr::Ifname as u16, name);

    let linkinfo = builder.nest_start(IflaAttr::Linkinfo as u16);
    builder.append_attr_str(IflaInfo::Kind as u16, WG_LINK_KIND);
    builder.nest_end(linkinfo);
    builder
}

/// `RTM_DELLINK` by interface index.
pub fn build_dellink(index: u32) -> MessageBuilder {
    let mut builder = ack_request(NlMsgType::RTM_DELLINK);
    builder.append(&IfInfoMsg::new().with_index(index as i32));
    builder
}

/// Route netlink connection for WireGuard links.
pub struct LinkConnection {
    conn: Connection,
}

impl LinkConnection {
    pub fn new(config: &Config) -> Result<Self> {
        let socket =
            NetlinkSocket::new(Protocol::Route)?.with_recv_buffer_size(config.recv_buffer_size);
        Ok(Self::from_socket(socket))
    }

    pub fn from_socket(socket: NetlinkSocket) -> Self {
        Self {
            conn: Connection::from_socket(socket),
        }
    }

    /// Create a WireGuard link named `name`.
    pub fn add_link(&self, name: &str) -> Result<()> {
        self.conn.request_ack(build_newlink(name))?;
        tracing::debug!(ifname = name, "added WireGuard link");
        Ok(())
    }

    /// Delete the link with this index.
    pub fn del_link(&self, index: u32) -> Result<()> {
        self.conn.request_ack(build_dellink(index))?;
        tracing::debug!(index, "deleted link");
        Ok(())
    }

    /// All links of kind `wireguard`, in kernel order.
    pub fn list_links(&self) -> Result<Vec<LinkMessage>> {
        let mut request = dump_request(NlMsgType::RTM_GETLINK);
        request.append(&IfInfoMsg::new());

        let mut links = Vec::new();
        for payload in self.conn.dump(request)? {
            let link = LinkMessage::from_bytes(&payload)?;
            if link.is_kind(WG_LINK_KIND) {
                links.push(link);
            }
        }
        Ok(links)
    }
}
