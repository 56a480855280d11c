//! The iterative-resolution engine: collapsed lookups, CNAME chasing,
//! NS-hierarchy walking, and per-query deadlines. Dispatches outbound
//! queries through [`upstream::UpstreamSender`] rather than a live socket,
//! so `rdns-server` and this crate's own `mock`-gated tests share the same
//! engine code.

pub mod deadline;
pub mod engine;
#[cfg(feature = "mock")]
pub mod mock;
pub mod roothints;
pub mod upstream;

pub use deadline::{Deadline, CLIENT_DEADLINE, WAIT_TIMEOUT};
pub use engine::{assemble_reply, Engine, Outcome};
pub use upstream::{UpstreamError, UpstreamSender};
