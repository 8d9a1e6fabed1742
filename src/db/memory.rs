//! In-memory Document Store for dev mode and tests

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{DidRecord, DocumentStore};
use crate::types::Result;

/// Append-only record list
#[derive(Default)]
pub struct MemoryDocumentStore {
    records: RwLock<Vec<DidRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing records (oldest first)
    pub fn with_records(records: Vec<DidRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Snapshot of all stored records
    pub async fn records(&self) -> Vec<DidRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: DidRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn pairs(&self) -> Result<Vec<(String, String)>> {
        let records = self.records.read().await;
        Ok(records.iter().map(|r| (r.uri.clone(), r.did.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn record(uri: &str, did: &str) -> DidRecord {
        DidRecord {
            uri: uri.to_string(),
            did: did.to_string(),
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_pairs_keep_insertion_order() {
        let store = MemoryDocumentStore::with_records(vec![record("u1", "did:1")]);
        store.insert(record("u2", "did:2")).await.unwrap();
        store.insert(record("u1", "did:3")).await.unwrap();

        let pairs = store.pairs().await.unwrap();
        assert_eq!(
            pairs,
            vec![
                ("u1".to_string(), "did:1".to_string()),
                ("u2".to_string(), "did:2".to_string()),
                ("u1".to_string(), "did:3".to_string()),
            ]
        );
        assert_eq!(store.records().await.len(), 3);
    }
}
