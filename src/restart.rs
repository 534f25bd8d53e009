//! The global restart counter that staggers `_restart` POSTs within a tick.
//!
//! A fresh `RestartScheduler` is created per tick (see `reconciler.rs`), so
//! spacing does not widen across the process lifetime the way it does in
//! the original (see `DESIGN.md` - resolved open question).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const INTER_RESTART_DELAY_SECS: u64 = 5;

#[derive(Default)]
pub struct RestartScheduler {
    counter: AtomicU64,
}

impl RestartScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delay the caller should wait before POSTing `_restart`.
    /// The N-th call (1-indexed) returns `N * 5s`.
    pub fn next_delay(&self) -> Duration {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Duration::from_secs(INTER_RESTART_DELAY_SECS * n)
    }
}
