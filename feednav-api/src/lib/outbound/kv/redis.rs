use std::time::Duration;

use async_trait::async_trait;
use ::redis::aio::ConnectionManager;
use ::redis::Client;
use ::redis::RedisError;

use crate::domain::store::KeyValueStore;
use crate::domain::store::KvError;

/// Redis-backed key-value store shared across API instances.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    connection: ConnectionManager,
}

impl RedisKeyValueStore {
    /// Open a managed connection that reconnects on failure.
    ///
    /// # Errors
    /// * `Unavailable` - URL is invalid or the first connection failed
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = Client::open(url).map_err(|e| KvError::Unavailable(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| KvError::Unavailable(e.to_string()))?;

        Ok(Self { connection })
    }
}

fn kv_error(err: RedisError) -> KvError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
        KvError::Unavailable(err.to_string())
    } else {
        KvError::OperationFailed(err.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut connection = self.connection.clone();

        ::redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(kv_error)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let mut connection = self.connection.clone();
        // PX rejects zero.
        let ttl_ms = (ttl.as_millis() as u64).max(1);

        ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(kv_error)
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut connection = self.connection.clone();

        ::redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(kv_error)
    }

    async fn take(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut connection = self.connection.clone();

        ::redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(kv_error)
    }
}
