//! URI/DID record schema
//!
//! One document per DID minted by the registry. `metadata` holds the object
//! that was registered with the DID (`uri` plus any statistics supplied by
//! the summarizer). Older rows carry no `created_at`; their ObjectId orders
//! them instead.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{options::IndexOptions, IndexModel};
use serde::{Deserialize, Serialize};

/// URI/DID record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DidRecordDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Resource URI the DID was minted for
    pub uri: String,

    /// The DID returned by the registry
    pub did: String,

    /// Metadata registered alongside the DID
    #[serde(default)]
    pub metadata: Document,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl DidRecordDoc {
    pub fn new(uri: String, did: String, metadata: Document) -> Self {
        Self {
            _id: None,
            uri,
            did,
            metadata,
            created_at: Some(DateTime::now()),
        }
    }

    /// Oldest first, so later rows for the same URI win on rebuild
    pub fn chronological() -> Document {
        doc! { "created_at": 1, "_id": 1 }
    }

    pub fn indexes() -> Vec<IndexModel> {
        // Not unique: a URI minted again after a cache loss keeps both rows,
        // and the rebuild takes the newest.
        [("uri", "uri_index"), ("did", "did_index")]
            .into_iter()
            .map(|(field, name)| {
                let mut keys = Document::new();
                keys.insert(field, 1);
                IndexModel::builder()
                    .keys(keys)
                    .options(IndexOptions::builder().name(name.to_string()).build())
                    .build()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let record = DidRecordDoc::new(
            "http://example.org/v1".into(),
            "did:oyd:zQm1".into(),
            doc! { "uri": "http://example.org/v1", "statistics": { "format": "turtle" } },
        );
        let document = bson::to_document(&record).unwrap();

        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("uri").unwrap(), "http://example.org/v1");
        assert_eq!(document.get_str("did").unwrap(), "did:oyd:zQm1");
        let metadata = document.get_document("metadata").unwrap();
        assert_eq!(metadata.get_str("uri").unwrap(), "http://example.org/v1");
        assert!(metadata.contains_key("statistics"));
        assert!(document.get_datetime("created_at").is_ok());
    }

    #[test]
    fn test_reads_rows_without_timestamp() {
        let row = doc! {
            "_id": ObjectId::new(),
            "uri": "http://example.org/old",
            "did": "did:oyd:zQmOld",
            "metadata": { "uri": "http://example.org/old" },
        };
        let record: DidRecordDoc = bson::from_document(row).unwrap();

        assert_eq!(record.did, "did:oyd:zQmOld");
        assert_eq!(record.metadata.get_str("uri").unwrap(), "http://example.org/old");
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_indexes_are_not_unique() {
        let indexes = DidRecordDoc::indexes();
        assert_eq!(indexes.len(), 2);
        assert!(indexes
            .iter()
            .all(|index| index.options.as_ref().and_then(|o| o.unique).is_none()));
    }
}
