//! C7 - the process-wide "update target URL" -> "last successful write" map.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful write. Last-writer-wins by URL; never pruned.
    pub fn record_write(&self, url: &str, at: DateTime<Utc>) {
        self.inner.write().insert(url.to_string(), at.to_rfc3339());
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().clone()
    }
}
