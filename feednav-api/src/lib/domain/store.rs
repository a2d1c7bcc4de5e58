use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to the key-value store.
#[derive(Debug, Clone, Error)]
pub enum KvError {
    #[error("Key-value store unavailable: {0}")]
    Unavailable(String),

    #[error("Key-value operation failed: {0}")]
    OperationFailed(String),
}

/// Port for the key-value store holding refresh tokens, OAuth state and
/// rate-limit windows.
///
/// Semantics are last-write-wins per key with per-key TTL. No cross-key
/// transactions are assumed.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read a live value.
    ///
    /// # Returns
    /// `None` if the key is absent or its TTL has elapsed
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Write a value that expires after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Remove a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Read and remove a key.
    ///
    /// Adapters backed by a store with an atomic get-and-delete override this
    /// so that only one caller can ever observe a given value.
    async fn take(&self, key: &str) -> Result<Option<String>, KvError> {
        let value = self.get(key).await?;
        if value.is_some() {
            self.delete(key).await?;
        }
        Ok(value)
    }
}
