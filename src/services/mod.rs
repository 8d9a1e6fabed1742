//! Services layer
//!
//! Business logic that coordinates the cache, the document store and the
//! external collaborators.
//!
//! ## Services
//!
//! - **Assignment**: URI -> DID lookup with cache-first creation
//! - **Registry**: HTTP client for the external DID registrar
//! - **Summarizer**: vocabulary fetch and namespace summary
//! - **Recommender**: vocabulary recommender CLI wrapper

pub mod assignment;
pub mod recommender;
pub mod registry;
pub mod summarizer;

pub use assignment::{merge_metadata, AssignmentStats, DidAssignmentService};
pub use recommender::{
    extract_json_payload, to_pretty_json, CommandRecommender, RecommendQuery, Recommender,
    RecommenderConfig,
};
pub use registry::{
    extract_did, DidRegistry, HttpDidRegistry, RegistrationPayload, RegistryConfig,
    RegistrySecret,
};
pub use summarizer::{NamespaceSummarizer, Summarizer};
