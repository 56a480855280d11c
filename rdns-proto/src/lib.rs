//! Wire-format codec for DNS messages: names with compression-pointer
//! support, the 12 byte header, questions, and the resource record types the
//! resolver cares about (A, AAAA, NS, CNAME, SOA, MX).
//!
//! Parsing is lenient: [`packet::DnsPacket::parse`] truncates a section
//! rather than rejecting a datagram outright when a later record fails to
//! decode. Encoding never emits compression pointers.

pub mod buffer;
pub mod name;
pub mod packet;

pub use buffer::BytePacketBuffer;
pub use name::Name;
pub use packet::header::{Header, ResponseCode};
pub use packet::question::{DnsClass, Question};
pub use packet::record::Record;
pub use packet::{DnsPacket, QueryType};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn builds_and_parses_a_referral_style_response() {
        let mut packet = DnsPacket {
            header: Header::question(1).with_response_code(ResponseCode::NoError),
            questions: vec![Question::new(Name::from_dotted("example.com"), QueryType::A)],
            ..Default::default()
        };
        packet.header.response = true;
        packet.authorities.push(Record::NS {
            domain: Name::from_dotted("com"),
            class: packet::record::CLASS_IN,
            host: Name::from_dotted("a.gtld-servers.net"),
            ttl: 172800,
        });
        packet.resources.push(Record::A {
            domain: Name::from_dotted("a.gtld-servers.net"),
            class: packet::record::CLASS_IN,
            addr: Ipv4Addr::new(192, 5, 6, 30),
            ttl: 172800,
        });

        let buffer = packet.assemble().unwrap();
        let parsed = DnsPacket::parse(buffer).unwrap();

        assert_eq!(parsed.questions[0].name.to_dotted_string(), "example.com");
        assert_eq!(parsed.authorities.len(), 1);
        assert_eq!(parsed.resources.len(), 1);
        assert!(parsed.answers.is_empty());
    }
}
