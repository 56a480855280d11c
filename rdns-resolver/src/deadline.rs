//! The per-query deadline context: every resolution task carries a
//! deadline-bearing context shared with its nested sub-lookups, so a
//! client-facing request can't be kept open indefinitely by a slow or
//! unresponsive chain of upstream referrals.

use std::time::Duration;
use tokio::time::Instant;

/// The overall budget for a single client-facing request.
pub const CLIENT_DEADLINE: Duration = Duration::from_millis(1250);
/// The longest a sub-lookup will wait on an in-flight resolution it's
/// joined, bounded further by whatever is left of the outer deadline.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

/// An absolute deadline, cheap to copy into every nested `collapsed_lookup`
/// call so cancellation is consistent across the whole tree.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn starting_now(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    pub fn has_passed(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Time left before the deadline, or `None` if it has already passed.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        (now < self.0).then(|| self.0 - now)
    }

    /// The smaller of `budget` and whatever is left on this deadline; `None`
    /// if the deadline has already passed.
    pub fn bounded_wait(&self, budget: Duration) -> Option<Duration> {
        self.remaining().map(|left| left.min(budget))
    }
}
