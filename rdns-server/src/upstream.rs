//! The upstream-facing read loop and the live [`UpstreamSender`] the
//! resolver engine dispatches through.

use std::net::SocketAddr;
use std::sync::Arc;

use rdns_cache::{Cache, OutstandingGate, WaiterTable};
use rdns_proto::buffer::BytePacketBuffer;
use rdns_proto::DnsPacket;
use rdns_resolver::{UpstreamError, UpstreamSender};
use tokio::net::UdpSocket;

use crate::prelude::Message;
use crate::receiver::Receiver;

/// Sends outbound queries on the same socket this module reads replies
/// from, so both directions of upstream traffic share one ephemeral port.
pub struct UdpUpstreamSender {
    socket: Arc<UdpSocket>,
}

impl UdpUpstreamSender {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }
}

#[async_trait::async_trait]
impl UpstreamSender for UdpUpstreamSender {
    async fn send_query(&self, upstream: SocketAddr, datagram: &[u8]) -> Result<(), UpstreamError> {
        self.socket.send_to(datagram, upstream).await?;
        Ok(())
    }
}

/// Reads the upstream socket forever: every inbound reply is checked
/// against the outstanding-reply gate and, on a match, admitted into the
/// cache. Never blocks beyond a single recv.
pub async fn run_upstream_loop(
    socket: Arc<UdpSocket>,
    cache: Arc<Cache>,
    waiters: Arc<WaiterTable>,
    gate: Arc<OutstandingGate>,
) -> std::io::Result<()> {
    let receiver = Receiver::new(socket);

    loop {
        let message = receiver.receive().await?;
        let cache = cache.clone();
        let waiters = waiters.clone();
        let gate = gate.clone();
        tokio::spawn(async move {
            handle_reply(message, cache, waiters, gate).await;
        });
    }
}

async fn handle_reply(
    message: Message,
    cache: Arc<Cache>,
    waiters: Arc<WaiterTable>,
    gate: Arc<OutstandingGate>,
) {
    let buffer = BytePacketBuffer::new(message.buffer);
    let packet = match DnsPacket::parse(buffer) {
        Ok(packet) => packet,
        Err(err) => {
            tracing::warn!(?err, from = %message.address, "dropping malformed upstream datagram");
            return;
        }
    };

    // Replies are dropped unless matched by the outstanding-reply gate; a
    // query arriving on this socket is nonsense and dropped too.
    if !packet.header.response || packet.questions.len() != 1 {
        tracing::warn!(from = %message.address, "dropping unexpected upstream datagram");
        return;
    }

    let question = &packet.questions[0];
    let Some(delegation_label) = gate
        .verify(message.address, &question.name, question.qtype, question.qclass)
        .await
    else {
        tracing::warn!(from = %message.address, name = %question.name, "dropping unmatched or spoofed upstream reply");
        return;
    };

    if let Err(err) = cache.admit(&packet, &delegation_label, &waiters).await {
        tracing::warn!(?err, from = %message.address, "failed to admit upstream reply");
    }
}
