//! Whole-response cache for the global feed. Entries are served until their
//! TTL runs out, so posts created meanwhile may be missing from a cached page.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::infrastructure::clock::Clock;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    body: String,
    stored_at: DateTime<Utc>,
}

pub struct PageCache {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl PageCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero() && self.capacity > 0
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let now = self.clock.now();
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if now - entry.stored_at < self.ttl {
            debug!(key, "page cache hit");
            Some(entry.body.clone())
        } else {
            None
        }
    }

    pub async fn insert(&self, key: String, body: String) {
        if !self.is_enabled() {
            return;
        }
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| now - e.stored_at < self.ttl);
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Entry {
                body,
                stored_at: now,
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
