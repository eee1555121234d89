//! Per-key serialisation of remote fetches
//!
//! When several requests miss the cache for the same file at once, only the
//! first one downloads it. The others wait on the same key and re-probe the
//! cache once the first has finished writing.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of in-flight fetches keyed by `<bucket>/<file_name>`
#[derive(Default)]
pub struct FetchCoalescer {
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl FetchCoalescer {
    /// Create an empty coalescer
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder owns `key`, then take it
    pub async fn acquire(&self, key: &str) -> FetchGuard<'_> {
        let lock = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let permit = lock.lock_owned().await;
        FetchGuard {
            owner: self,
            key: key.to_string(),
            _permit: permit,
        }
    }

    /// Number of keys currently held or awaited
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

/// Exclusive hold on a key; released on drop
pub struct FetchGuard<'a> {
    owner: &'a FetchCoalescer,
    key: String,
    _permit: OwnedMutexGuard<()>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        // One reference in the map and one in our permit means nobody waits.
        self.owner
            .inflight
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
    }
}
