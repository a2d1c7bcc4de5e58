use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::store::KeyValueStore;
use crate::domain::store::KvError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local key-value store for development and tests.
///
/// Expired entries are dropped lazily when they are next touched.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, KvError> {
        let now = Instant::now();

        Ok(self
            .entries
            .remove(key)
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(_, entry)| entry.value))
    }
}
