//! The upstream dispatch seam: the engine sends every outbound query
//! through this trait rather than touching a live socket. `rdns-server`
//! provides the production implementation; this crate's `mock` feature
//! provides a scripted one for tests.

use std::fmt;
use std::net::SocketAddr;

#[derive(Debug)]
pub enum UpstreamError {
    Io(std::io::Error),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to dispatch upstream query: {err}"),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<std::io::Error> for UpstreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[async_trait::async_trait]
pub trait UpstreamSender: Send + Sync {
    /// Sends an already-assembled datagram to `upstream`. Implementations
    /// never block beyond the underlying socket send.
    async fn send_query(&self, upstream: SocketAddr, datagram: &[u8]) -> Result<(), UpstreamError>;
}
