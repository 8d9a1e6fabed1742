//! Redis-backed DID cache partition

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::DidCache;
use crate::types::{Result, ServiceError};

/// One Redis logical database holding URI -> DID strings
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so each
/// call works on a clone instead of locking a shared connection.
#[derive(Clone)]
pub struct RedisDidCache {
    conn: ConnectionManager,
    url: String,
}

impl RedisDidCache {
    /// Connect to `redis://host:port/db`
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis at {}", url);

        let client = redis::Client::open(url)
            .map_err(|e| ServiceError::Config(format!("Invalid Redis URL {}: {}", url, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ServiceError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl DidCache for RedisDidCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, uri: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let did: Option<String> = conn.get(uri).await?;
        debug!(uri = uri, hit = did.is_some(), "Redis lookup");
        Ok(did)
    }

    async fn set(&self, uri: &str, did: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(uri, did).await?;
        Ok(())
    }

    async fn set_many(&self, pairs: &[(String, String)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn.mset(pairs).await?;
        debug!(count = pairs.len(), url = %self.url, "Redis MSET");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_invalid_url() {
        let err = RedisDidCache::connect("not a redis url").await.err().unwrap();
        assert!(matches!(err, ServiceError::Config(_)));
    }
}
