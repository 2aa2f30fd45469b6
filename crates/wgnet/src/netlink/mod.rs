//! Netlink framing and transport.
//!
//! A small blocking netlink stack: message and attribute framing, a
//! `netlink-sys` socket, and the request/ACK/dump exchanges used by the
//! IPv6 address path and the WireGuard adapter.
//!
//! ```ignore
//! use wgnet::netlink::{Connection, NetlinkSocket, Protocol, connection::dump_request};
//! use wgnet::netlink::message::NlMsgType;
//! use wgnet::netlink::types::IfInfoMsg;
//!
//! let conn = Connection::from_socket(NetlinkSocket::new(Protocol::Route)?);
//! let mut req = dump_request(NlMsgType::RTM_GETLINK);
//! req.append(&IfInfoMsg::new());
//! for payload in conn.dump(req)? {
//!     let link = wgnet::netlink::parse::LinkMessage::from_bytes(&payload)?;
//!     println!("{}: {:?}", link.index, link.name);
//! }
//! ```

pub mod attr;
pub mod builder;
pub mod connection;
pub mod error;
pub mod genl;
pub mod message;
pub mod parse;
pub mod socket;
pub mod types;

pub use attr::{AttrIter, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::Connection;
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use socket::{NetlinkSocket, Protocol};
