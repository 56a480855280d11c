#![no_main]

use rdns_proto::{BytePacketBuffer, DnsPacket};

libfuzzer_sys::fuzz_target!(|buffer: BytePacketBuffer| {
    let _ = DnsPacket::parse(buffer);
});
