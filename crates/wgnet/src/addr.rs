//! IPv6 address assignment via `RTM_NEWADDR`.

use std::net::Ipv6Addr;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::netlink;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::Connection;
use crate::netlink::message::{NLM_F_ACK, NLM_F_CREATE, NLM_F_REPLACE, NLM_F_REQUEST, NlMsgType};
use crate::netlink::socket::{NetlinkSocket, Protocol};
use crate::netlink::types::{IfAddrMsg, IfaAttr, ifa_flags};
use crate::util::ifname;

/// Build the `RTM_NEWADDR` frame for a permanent IPv6 address.
///
/// The frame uses sequence 1 and the process id as port id. `IFA_ADDRESS`
/// and `IFA_LOCAL` carry the same address.
pub fn build_newaddr(
    index: u32,
    addr: [u8; 16],
    prefix: u8,
    ack: bool,
) -> netlink::Result<Vec<u8>> {
    let mut flags = NLM_F_REQUEST | NLM_F_CREATE | NLM_F_REPLACE;
    if ack {
        flags |= NLM_F_ACK;
    }

    let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWADDR, flags);
    builder.append(
        &IfAddrMsg::new()
            .with_family(libc::AF_INET6 as u8)
            .with_prefixlen(prefix)
            .with_flags(ifa_flags::PERMANENT)
            .with_scope(0)
            .with_index(index),
    );
    builder.append_attr(IfaAttr::Address as u16, &addr);
    builder.append_attr(IfaAttr::Local as u16, &addr);
    builder.set_seq(1);
    builder.set_pid(std::process::id());
    builder.finish()
}

/// Add `addr/prefix` to the interface named `name`.
pub fn assign_ipv6(name: &str, addr: Ipv6Addr, prefix: u8, config: &Config) -> Result<()> {
    let index = ifname::name_to_index(name)?;

    let socket = NetlinkSocket::new(Protocol::Route)
        .map_err(Error::NetlinkSocketFailed)?
        .with_recv_buffer_size(config.recv_buffer_size);

    let frame = build_newaddr(index, addr.octets(), prefix, config.ipv6_ack)
        .map_err(Error::NetlinkSendFailed)?;
    tracing::trace!(len = frame.len(), "RTM_NEWADDR frame");

    if config.ipv6_ack {
        Connection::from_socket(socket)
            .send_ack(&frame)
            .map_err(Error::NetlinkSendFailed)?;
    } else {
        socket.send(&frame).map_err(Error::NetlinkSendFailed)?;
    }

    tracing::debug!(ifname = name, index, %addr, prefix, "assigned IPv6 address");
    Ok(())
}
