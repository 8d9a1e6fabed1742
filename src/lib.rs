//! did-summarizer - DID assignment cache and Linked Data vocabulary summarizer
//!
//! Assigns a decentralized identifier to every resource URI it is asked
//! about, minting it once through an external DID registry and caching it
//! in Redis, and summarizes the namespace usage of Linked Data vocabularies.
//!
//! ## Services
//!
//! - **Assignment**: cache-first URI -> DID lookup with at-most-once creation
//! - **Cache**: Redis partitions (in-memory in dev mode)
//! - **Document Store**: MongoDB record of every minted DID
//! - **Summarizer**: Turtle and RDF/XML namespace statistics
//! - **Recommender**: wrapper around the vocabulary recommender CLI

pub mod cache;
pub mod config;
pub mod db;
pub mod namespaces;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, serve, AppState};
pub use types::{Result, ServiceError};
