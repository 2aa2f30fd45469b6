//! Request/response handling on top of [`NetlinkSocket`].

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REQUEST, NlMsgError,
    NlMsgHdr,
};
use super::socket::NetlinkSocket;

/// Netlink connection: one socket plus the exchange patterns used by this crate.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Create a connection from an existing socket.
    pub fn from_socket(socket: NetlinkSocket) -> Self {
        Self { socket }
    }

    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Send a finished frame that carries `NLM_F_ACK` and wait for its ACK.
    ///
    /// The sequence number is read back from the frame, so callers that
    /// stamp their own header are matched correctly.
    pub fn send_ack(&self, msg: &[u8]) -> Result<()> {
        let seq = NlMsgHdr::from_bytes(msg)?.nlmsg_seq;
        self.socket.send(msg)?;

        loop {
            let data = self.socket.recv_msg()?;
            if let Some(result) = find_ack(&data, seq)? {
                return result;
            }
        }
    }

    /// Send a request that expects an ACK only (no data response).
    pub fn request_ack(&self, mut builder: MessageBuilder) -> Result<()> {
        builder.set_seq(self.socket.next_seq());
        builder.set_pid(self.socket.pid());
        self.send_ack(&builder.finish()?)
    }

    /// Send a dump request and collect the payload of every reply message.
    ///
    /// Payloads exclude the netlink header. A kernel error aborts the dump.
    pub fn dump(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());
        self.socket.send(&builder.finish()?)?;

        let mut responses = Vec::new();

        loop {
            let data = self.socket.recv_msg()?;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                if header.nlmsg_seq != seq {
                    continue;
                }

                if header.is_error() {
                    NlMsgError::from_bytes(payload)?.into_result()?;
                    continue;
                }

                if header.is_done() {
                    tracing::trace!(seq, messages = responses.len(), "dump complete");
                    return Ok(responses);
                }

                responses.push(payload.to_vec());
            }
        }
    }
}

/// Look for the ACK/error matching `seq` in one datagram.
///
/// Returns `Ok(None)` when the datagram holds no reply for `seq`.
fn find_ack(data: &[u8], seq: u32) -> Result<Option<Result<()>>> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != seq {
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            return Ok(Some(err.into_result()));
        }

        if header.is_done() {
            return Err(Error::InvalidMessage("expected ACK message".into()));
        }
    }

    Ok(None)
}

/// Helper to build a dump request.
pub fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

/// Helper to build a request expecting ACK.
pub fn ack_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

/// Helper to build an exclusive create request (fails with EEXIST).
pub fn create_excl_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(
        msg_type,
        NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL,
    )
}
