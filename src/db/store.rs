//! Document Store abstraction
//!
//! The assignment service persists every minted DID through this trait and
//! reads the full URI/DID mapping back once at startup to rebuild the cache.

use async_trait::async_trait;
use bson::doc;
use futures_util::TryStreamExt;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::db::schemas::DidRecordDoc;
use crate::types::{Result, ServiceError};

/// A persisted URI/DID pair with its registered metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidRecord {
    pub uri: String,
    pub did: String,
    pub metadata: Map<String, Value>,
}

/// Persistent URI/DID records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Persist one record
    async fn insert(&self, record: DidRecord) -> Result<()>;

    /// Every stored `(uri, did)` pair, oldest first
    async fn pairs(&self) -> Result<Vec<(String, String)>>;
}

/// MongoDB-backed Document Store
pub struct MongoDocumentStore {
    records: Collection<DidRecordDoc>,
}

impl MongoDocumentStore {
    /// Connect, ping and index the record collection
    pub async fn connect(uri: &str, db_name: &str, collection_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast instead of hanging on an unreachable server
        let separator = if uri.contains('?') { '&' } else { '?' };
        let uri = format!(
            "{}{}serverSelectionTimeoutMS=3000&connectTimeoutMS=3000",
            uri, separator
        );

        let client = Client::with_uri_str(&uri)
            .await
            .map_err(|e| ServiceError::Database(format!("Failed to connect to MongoDB: {}", e)))?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ServiceError::Database(format!("MongoDB ping failed: {}", e)))?;

        let records = db.collection::<DidRecordDoc>(collection_name);
        records
            .create_indexes(DidRecordDoc::indexes())
            .await
            .map_err(|e| ServiceError::Database(format!("Failed to create indexes: {}", e)))?;

        info!(db = db_name, collection = collection_name, "DID record collection ready");
        Ok(Self { records })
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn insert(&self, record: DidRecord) -> Result<()> {
        let metadata = bson::to_document(&record.metadata)?;
        let result = self
            .records
            .insert_one(DidRecordDoc::new(record.uri, record.did, metadata))
            .await?;
        debug!(id = %result.inserted_id, "DID record stored");
        Ok(())
    }

    async fn pairs(&self) -> Result<Vec<(String, String)>> {
        let docs: Vec<DidRecordDoc> = self
            .records
            .find(doc! {})
            .sort(DidRecordDoc::chronological())
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(|d| (d.uri, d.did)).collect())
    }
}
