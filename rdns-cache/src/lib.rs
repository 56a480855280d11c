//! The name cache, in-flight waiter table and outstanding-reply gate:
//! everything the resolver engine consults or writes through when an
//! upstream reply lands.
//!
//! None of these types reference the resolver crate. The cache's
//! [`cache::Cache::admit`] takes the waiter table as an explicit
//! collaborator and notifies it from inside its own write lock; the
//! outstanding-reply gate is verified by the caller (the upstream reader)
//! before `admit` is ever called.

pub mod cache;
pub mod gate;
pub mod waiters;

pub use cache::{AdmitError, Cache, CacheResult, LookupResult};
pub use gate::OutstandingGate;
pub use waiters::WaiterTable;
