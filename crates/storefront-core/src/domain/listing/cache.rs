//! Response cache port

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Key-value store for serialized listing responses
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Stored value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value for `ttl`; last writer wins
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}
