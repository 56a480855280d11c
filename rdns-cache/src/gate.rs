//! The outstanding-reply gate — a fixed 200-slot ring of expectations
//! produced when the resolver dispatches an upstream query, defending the
//! cache against unsolicited or off-path-spoofed replies.

use std::net::SocketAddr;

use rdns_proto::packet::question::DnsClass;
use rdns_proto::{Name, QueryType};
use tokio::sync::Mutex;

/// Fixed ring capacity; replies are dropped on overflow rather than letting
/// the set of outstanding queries grow unbounded.
pub const RING_SIZE: usize = 200;

/// `(upstream-address, question name **with case preserved**, type, class)`.
/// Case is preserved deliberately: the gate's defense depends on a spoofer
/// being unable to guess the exact 0x20 case pattern written on the wire,
/// so this key must not be canonicalized.
fn expectation_key(upstream: SocketAddr, name: &Name, qtype: QueryType, qclass: DnsClass) -> String {
    format!(
        "ns={upstream}, q={}, t={}, c={} ",
        name.case_sensitive_key(),
        qtype.into_num(),
        qclass as u16
    )
}

#[derive(Clone)]
struct Slot {
    key: String,
    delegation_label: Name,
}

struct Inner {
    ring: Vec<Option<Slot>>,
    cursor: usize,
}

/// A fixed-capacity ring buffer, linear-scanned on verify. No hash index:
/// at 200 entries the scan is cheap, and the fixed capacity is a
/// deliberate resource bound rather than something worth optimizing away.
pub struct OutstandingGate {
    inner: Mutex<Inner>,
}

impl Default for OutstandingGate {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                ring: vec![None; RING_SIZE],
                cursor: 0,
            }),
        }
    }
}

impl OutstandingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the expectation for a query this resolver just dispatched
    /// upstream. Wraps at [`RING_SIZE`], overwriting the oldest entry.
    pub async fn register(
        &self,
        upstream: SocketAddr,
        question_name: &Name,
        qtype: QueryType,
        qclass: DnsClass,
        delegation_label: Name,
    ) {
        let key = expectation_key(upstream, question_name, qtype, qclass);
        let mut inner = self.inner.lock().await;
        let cursor = inner.cursor;
        inner.ring[cursor] = Some(Slot {
            key,
            delegation_label,
        });
        inner.cursor = (cursor + 1) % RING_SIZE;
    }

    /// Verifies an inbound upstream reply against the ring. On an exact
    /// match the slot is cleared and the registered delegation label is
    /// returned; on no match, `None` (the packet should be dropped).
    pub async fn verify(
        &self,
        upstream: SocketAddr,
        reply_name: &Name,
        qtype: QueryType,
        qclass: DnsClass,
    ) -> Option<Name> {
        let key = expectation_key(upstream, reply_name, qtype, qclass);
        let mut inner = self.inner.lock().await;
        for slot in inner.ring.iter_mut() {
            if slot.as_ref().is_some_and(|s| s.key == key) {
                return slot.take().map(|s| s.delegation_label);
            }
        }
        None
    }
}
