//! Short-lived memo for the status endpoint.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::protocol::GameStatus;

/// Serves the same status snapshot to every caller within `ttl`.
#[derive(Debug)]
pub struct StatusCache {
    ttl: Duration,
    entry: Mutex<Option<(Instant, GameStatus)>>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        StatusCache {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Returns the cached status, or stores and returns `fresh()` once the entry expires.
    pub fn get_or_refresh(&self, fresh: impl FnOnce() -> GameStatus) -> GameStatus {
        let mut entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((stored_at, status)) = entry.as_ref() {
            if stored_at.elapsed() < self.ttl {
                return status.clone();
            }
        }
        let status = fresh();
        *entry = Some((Instant::now(), status.clone()));
        status
    }

    /// Drops the cached entry so the next read is fresh.
    pub fn invalidate(&self) {
        let mut entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *entry = None;
    }
}
