//! The 13 root-server hints. One is chosen at random per top-level dispatch
//! that falls all the way back to the root, rather than always hitting the
//! same hint, so the root-server load this resolver generates spreads
//! across all thirteen instead of pinning one.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use rand::seq::IteratorRandom;
use rand::Rng;

pub const ROOT_HINTS: [Ipv4Addr; 13] = [
    Ipv4Addr::new(198, 41, 0, 4),     // a.root-servers.net
    Ipv4Addr::new(199, 9, 14, 201),   // b.root-servers.net
    Ipv4Addr::new(192, 33, 4, 12),    // c.root-servers.net
    Ipv4Addr::new(199, 7, 91, 13),    // d.root-servers.net
    Ipv4Addr::new(192, 203, 230, 10), // e.root-servers.net
    Ipv4Addr::new(192, 5, 5, 241),    // f.root-servers.net
    Ipv4Addr::new(192, 112, 36, 4),   // g.root-servers.net
    Ipv4Addr::new(198, 97, 190, 53),  // h.root-servers.net
    Ipv4Addr::new(192, 36, 148, 17),  // i.root-servers.net
    Ipv4Addr::new(192, 58, 128, 30),  // j.root-servers.net
    Ipv4Addr::new(193, 0, 14, 129),   // k.root-servers.net
    Ipv4Addr::new(199, 7, 83, 42),    // l.root-servers.net
    Ipv4Addr::new(202, 12, 27, 33),   // m.root-servers.net
];

pub fn random_root_server(rng: &mut impl Rng) -> SocketAddr {
    let addr = ROOT_HINTS
        .iter()
        .choose(rng)
        .copied()
        .expect("ROOT_HINTS is non-empty");
    SocketAddr::new(IpAddr::V4(addr), 53)
}
