use crate::prelude::Message;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// A DNS header alone is 12 bytes (RFC 1035 §4.1.1); anything shorter can't
/// even hold one and is discarded before it reaches a parser.
const MIN_DATAGRAM_LEN: usize = 12;

#[derive(Debug)]
pub struct Receiver {
    socket: Arc<UdpSocket>,
}

impl Receiver {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }

    /// Blocks on a single `recv_from`; never buffers or looks ahead. Datagrams
    /// under [`MIN_DATAGRAM_LEN`] bytes are dropped internally and never
    /// handed back, so callers only ever see a datagram worth parsing.
    pub async fn receive(&self) -> std::io::Result<Message> {
        loop {
            let mut buffer = [0u8; 512];
            let (size, address) = self.socket.recv_from(&mut buffer).await?;
            if size < MIN_DATAGRAM_LEN {
                tracing::debug!(from = %address, size, "dropping undersized datagram");
                continue;
            }
            tracing::debug!(from = %address, size, "received datagram");
            return Ok(Message {
                address,
                buffer,
                size,
            });
        }
    }
}
