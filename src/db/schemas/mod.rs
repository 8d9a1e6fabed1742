//! Database schemas
//!
//! MongoDB document structures for URI/DID records.

mod did_record;

pub use did_record::DidRecordDoc;
