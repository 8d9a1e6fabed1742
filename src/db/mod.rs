//! Database layer
//!
//! The Document Store keeps every URI/DID record. MongoDB in production,
//! an in-memory list in dev mode and tests.

pub mod memory;
pub mod schemas;
pub mod store;

pub use memory::MemoryDocumentStore;
pub use schemas::DidRecordDoc;
pub use store::{DidRecord, DocumentStore, MongoDocumentStore};
