use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rdns_proto::packet::header::Header;
use rdns_proto::packet::question::Question;
use rdns_proto::packet::record::Record;
use rdns_proto::{DnsPacket, Name, QueryType};
use std::net::Ipv4Addr;

fn query_packet() -> DnsPacket {
    DnsPacket {
        header: Header::question(38005),
        questions: vec![Question::new(Name::from_dotted("google.com"), QueryType::A)],
        ..Default::default()
    }
}

fn response_packet() -> DnsPacket {
    let mut packet = query_packet();
    packet.header.response = true;
    packet.answers.push(Record::A {
        domain: Name::from_dotted("google.com"),
        class: rdns_proto::packet::record::CLASS_IN,
        addr: Ipv4Addr::new(172, 217, 20, 206),
        ttl: 8,
    });
    packet
}

fn encoding(mut packet: DnsPacket) {
    let _buffer = packet.assemble().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("encoding query packet", |b| {
        let packet = query_packet();
        b.iter(|| encoding(black_box(packet.clone())))
    });
    c.bench_function("encoding response packet", |b| {
        let packet = response_packet();
        b.iter(|| encoding(black_box(packet.clone())))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
