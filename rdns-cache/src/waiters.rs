//! The in-flight waiter table: tracks resolutions already underway so a
//! second caller asking for the same name/type joins the first instead of
//! dispatching its own upstream query.
//!
//! An independent pub/sub structure: the cache takes a `&WaiterTable` as an
//! explicit collaborator on [`crate::cache::Cache::admit`] and calls
//! [`WaiterTable::notify`] itself from inside its write lock, rather than
//! holding a callback pointer back into the resolver engine.

use std::collections::HashMap;
use std::sync::Mutex;

use rdns_proto::QueryType;
use tokio::sync::Notify;

/// `"type->name-key"`, the waiter table's key shape.
fn waiter_key(name_key: &str, qtype: QueryType) -> String {
    format!("{}->{}", qtype.into_num(), name_key)
}

/// Handles registered under a single key are released together — a
/// `tokio::sync::Notify` configured to wake every waiter already polling it
/// does exactly that when [`Notify::notify_waiters`] is used.
#[derive(Default)]
pub struct WaiterTable {
    handles: Mutex<HashMap<String, std::sync::Arc<Notify>>>,
}

impl WaiterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a one-shot wait on `(name_key, qtype)` and returns a
    /// handle to block on. Multiple concurrent callers for the same key
    /// share the same `Notify`, so admitting one record releases all of
    /// them at once — this is the "collapsing" property of request
    /// coalescing.
    fn handle_for(&self, name_key: &str, qtype: QueryType) -> std::sync::Arc<Notify> {
        let key = waiter_key(name_key, qtype);
        let mut handles = self.handles.lock().expect("waiter table lock poisoned");
        handles
            .entry(key)
            .or_insert_with(|| std::sync::Arc::new(Notify::new()))
            .clone()
    }

    /// The first caller for a given `(name_key, qtype)` is the leader and
    /// must dispatch the upstream query; later concurrent callers join the
    /// same handle and only wait.
    /// Returns the handle to wait on and whether this call was the leader.
    pub fn lead_or_join(&self, name_key: &str, qtype: QueryType) -> (std::sync::Arc<Notify>, bool) {
        let key = waiter_key(name_key, qtype);
        let mut handles = self.handles.lock().expect("waiter table lock poisoned");
        match handles.get(&key) {
            Some(handle) => (handle.clone(), false),
            None => {
                let handle = std::sync::Arc::new(Notify::new());
                handles.insert(key, handle.clone());
                (handle, true)
            }
        }
    }

    /// Waits for an admission under this key, or for `timeout` to elapse,
    /// whichever comes first. Returns `true` if progress was observed.
    pub async fn block_for_progress(
        &self,
        name_key: &str,
        qtype: QueryType,
        timeout: std::time::Duration,
    ) -> bool {
        let handle = self.handle_for(name_key, qtype);
        // `notified()` must be constructed before any await point that
        // could yield to the notifier, so no wakeup is missed between
        // registration and waiting.
        let notified = handle.notified();
        tokio::time::timeout(timeout, notified).await.is_ok()
    }

    /// Releases every waiter currently parked on `(name_key, qtype)`.
    /// Called by [`crate::cache::Cache::admit`] from inside its write lock.
    pub async fn notify(&self, name_key: &str, qtype: QueryType) {
        let key = waiter_key(name_key, qtype);
        let handle = {
            let mut handles = self.handles.lock().expect("waiter table lock poisoned");
            handles.remove(&key)
        };
        if let Some(handle) = handle {
            handle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn notify_releases_a_waiting_task() {
        let table = std::sync::Arc::new(WaiterTable::new());
        let waiter = {
            let table = table.clone();
            tokio::spawn(async move {
                table
                    .block_for_progress("EXAMPLE/COM;", QueryType::A, Duration::from_secs(2))
                    .await
            })
        };

        tokio::task::yield_now().await;
        table.notify("EXAMPLE/COM;", QueryType::A).await;

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn times_out_without_progress() {
        let table = WaiterTable::new();
        let progressed = table
            .block_for_progress("EXAMPLE/COM;", QueryType::A, Duration::from_millis(10))
            .await;
        assert!(!progressed);
    }

    #[tokio::test]
    async fn notify_releases_all_concurrent_waiters_on_the_same_key() {
        let table = std::sync::Arc::new(WaiterTable::new());
        let mut waiters = Vec::new();
        for _ in 0..10 {
            let table = table.clone();
            waiters.push(tokio::spawn(async move {
                table
                    .block_for_progress("EXAMPLE/COM;", QueryType::A, Duration::from_secs(2))
                    .await
            }));
        }

        tokio::task::yield_now().await;
        table.notify("EXAMPLE/COM;", QueryType::A).await;

        for waiter in waiters {
            assert!(waiter.await.unwrap());
        }
    }

    #[test]
    fn only_the_first_caller_leads() {
        let table = WaiterTable::new();
        let (_, first_leads) = table.lead_or_join("EXAMPLE/COM;", QueryType::A);
        let (_, second_leads) = table.lead_or_join("EXAMPLE/COM;", QueryType::A);
        assert!(first_leads);
        assert!(!second_leads);
    }
}
