//! In-memory DID cache
//!
//! DashMap-backed stand-in for a Redis partition. Entries never expire:
//! a URI keeps its DID for the lifetime of the process.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::DidCache;
use crate::types::Result;

/// In-memory URI -> DID cache
#[derive(Default)]
pub struct MemoryDidCache {
    entries: DashMap<String, String>,
}

impl MemoryDidCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated cache
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let cache = Self::new();
        for (k, v) in entries {
            cache.entries.insert(k.into(), v.into());
        }
        cache
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DidCache for MemoryDidCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, uri: &str) -> Result<Option<String>> {
        match self.entries.get(uri) {
            Some(did) => {
                debug!(uri = uri, "Cache hit");
                Ok(Some(did.clone()))
            }
            None => {
                debug!(uri = uri, "Cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, uri: &str, did: &str) -> Result<()> {
        debug!(uri = uri, did = did, "Cache set");
        self.entries.insert(uri.to_string(), did.to_string());
        Ok(())
    }

    async fn set_many(&self, pairs: &[(String, String)]) -> Result<()> {
        for (uri, did) in pairs {
            self.entries.insert(uri.clone(), did.clone());
        }
        debug!(count = pairs.len(), "Cache bulk set");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let cache = MemoryDidCache::new();
        let key = "http://example.org/vocab";

        assert!(cache.get(key).await.unwrap().is_none());

        cache.set(key, "did:oyd:abc").await.unwrap();
        assert_eq!(cache.get(key).await.unwrap().as_deref(), Some("did:oyd:abc"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_set_many_overwrites() {
        let cache = MemoryDidCache::with_entries([("u1", "stale"), ("u3", "keep")]);

        cache
            .set_many(&[
                ("u1".to_string(), "did:1".to_string()),
                ("u2".to_string(), "did:2".to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("u1").await.unwrap().as_deref(), Some("did:1"));
        assert_eq!(cache.get("u3").await.unwrap().as_deref(), Some("keep"));
    }
}
