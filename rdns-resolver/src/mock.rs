//! A scripted upstream, gated behind the `mock` feature: records every
//! query dispatched through it instead of sending anything on the wire, so
//! tests can assert on dispatch counts (e.g. for request coalescing, where
//! a second concurrent caller must join rather than dispatch its own
//! query) and then drive a reply by calling `Cache::admit` directly, as
//! the live upstream reader would after receiving a real datagram.

use std::net::SocketAddr;
use std::sync::Mutex;

use crate::upstream::{UpstreamError, UpstreamSender};

#[derive(Debug, Clone)]
pub struct SentQuery {
    pub upstream: SocketAddr,
    pub datagram: Vec<u8>,
}

#[derive(Default)]
pub struct MockUpstream {
    sent: Mutex<Vec<SentQuery>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentQuery> {
        self.sent.lock().expect("mock upstream lock poisoned").clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.sent.lock().expect("mock upstream lock poisoned").len()
    }
}

#[async_trait::async_trait]
impl UpstreamSender for MockUpstream {
    async fn send_query(&self, upstream: SocketAddr, datagram: &[u8]) -> Result<(), UpstreamError> {
        self.sent
            .lock()
            .expect("mock upstream lock poisoned")
            .push(SentQuery {
                upstream,
                datagram: datagram.to_vec(),
            });
        Ok(())
    }
}
