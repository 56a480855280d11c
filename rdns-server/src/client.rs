//! The client-facing read loop: one task reads the socket and never blocks
//! beyond a single recv; each well-formed query spawns its own
//! `collapsed_lookup` task bound to the 1250 ms deadline.

use std::sync::Arc;

use rdns_proto::buffer::BytePacketBuffer;
use rdns_proto::DnsPacket;
use rdns_resolver::{assemble_reply, Deadline, Engine, UpstreamSender, CLIENT_DEADLINE};
use tokio::net::UdpSocket;

use crate::prelude::Message;
use crate::receiver::Receiver;
use crate::sender::Sender;

/// Reads the client socket forever, spawning one resolution task per
/// well-formed query. Returns only if the socket itself fails.
pub async fn run_client_loop<U>(socket: Arc<UdpSocket>, engine: Arc<Engine<U>>) -> std::io::Result<()>
where
    U: UpstreamSender + Send + Sync + 'static,
{
    let receiver = Receiver::new(socket.clone());
    let sender = Arc::new(Sender::new(socket));

    loop {
        let message = receiver.receive().await?;
        let engine = engine.clone();
        let sender = sender.clone();
        tokio::spawn(async move {
            handle_request(engine, sender, message).await;
        });
    }
}

async fn handle_request<U>(engine: Arc<Engine<U>>, sender: Arc<Sender>, message: Message)
where
    U: UpstreamSender + Send + Sync,
{
    let buffer = BytePacketBuffer::new(message.buffer);
    let packet = match DnsPacket::parse(buffer) {
        Ok(packet) => packet,
        Err(err) => {
            tracing::warn!(?err, from = %message.address, "dropping malformed client datagram");
            return;
        }
    };

    // Inbound: DNS query, QR=0, Opcode=QUERY (RFC 1035 §4.1.1), RD=1, exactly
    // one question. All other inbound datagrams on this socket are dropped.
    if packet.header.response
        || packet.header.opcode != 0
        || !packet.header.recursion_desired
        || packet.questions.len() != 1
    {
        tracing::warn!(from = %message.address, "dropping nonsense client query");
        return;
    }

    let question = packet.questions[0].clone();
    let deadline = Deadline::starting_now(CLIENT_DEADLINE);
    let outcome = engine.collapsed_lookup(question.clone(), deadline).await;

    let mut reply = assemble_reply(&packet.header, &question, outcome);
    let buffer = match reply.assemble() {
        Ok(buffer) => buffer,
        Err(err) => {
            tracing::error!(?err, to = %message.address, "failed to assemble client reply");
            return;
        }
    };

    let reply_message = Message {
        address: message.address,
        buffer: buffer.buf,
        size: buffer.pos(),
    };
    if let Err(err) = sender.send(&reply_message).await {
        tracing::error!(?err, to = %message.address, "failed to send client reply");
    }
}
