//! The two socket I/O loops: one task reads the client-facing socket and
//! spawns a `collapsed_lookup` task per request under its 1250 ms deadline;
//! another reads the upstream-facing socket, verifies each reply against
//! the outstanding-reply gate, and admits it into the cache. Neither loop
//! ever blocks beyond a single recv.

pub mod client;
pub mod prelude;
pub mod receiver;
pub mod sender;
pub mod upstream;

pub use client::run_client_loop;
pub use upstream::{run_upstream_loop, UdpUpstreamSender};
