//! URI -> DID key-value cache
//!
//! The cache sits in front of the DID registry: a URI that has a cached DID
//! never reaches the registry again. Production deployments use Redis with
//! one logical database per partition; development and tests use the
//! in-memory [`MemoryDidCache`].
//!
//! ## Partitions
//!
//! - **did**: URI -> DID entries, read and written by the assignment service
//! - **per**, **loc**, **org**: provisioned alongside, not written by any
//!   handler; reported by `/health`

pub mod memory;
pub mod redis_store;

pub use memory::MemoryDidCache;
pub use redis_store::RedisDidCache;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CacheArgs;
use crate::types::Result;

/// A string -> string cache keyed by URI
#[async_trait]
pub trait DidCache: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Look up the DID cached for `uri`
    async fn get(&self, uri: &str) -> Result<Option<String>>;

    /// Cache `uri -> did`
    async fn set(&self, uri: &str, did: &str) -> Result<()>;

    /// Write many pairs at once, overwriting existing keys
    async fn set_many(&self, pairs: &[(String, String)]) -> Result<()>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;
}

/// Logical cache partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePartition {
    Did,
    Per,
    Loc,
    Org,
}

impl CachePartition {
    pub const ALL: [CachePartition; 4] = [Self::Did, Self::Per, Self::Loc, Self::Org];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Did => "did",
            Self::Per => "per",
            Self::Loc => "loc",
            Self::Org => "org",
        }
    }

    /// Logical database index configured for this partition
    pub fn database(&self, args: &CacheArgs) -> i64 {
        match self {
            Self::Did => args.redis_db,
            Self::Per => args.redis_per,
            Self::Loc => args.redis_loc,
            Self::Org => args.redis_org,
        }
    }
}

async fn connect_partition(args: &CacheArgs, partition: CachePartition) -> Result<RedisDidCache> {
    RedisDidCache::connect(&args.redis_url(partition.database(args))).await
}

/// Reachability of one partition
#[derive(Debug, Clone, Serialize)]
pub struct PartitionHealth {
    pub partition: CachePartition,
    pub backend: &'static str,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The four cache partitions, constructed once at startup
#[derive(Clone)]
pub struct CachePartitions {
    pub did: Arc<dyn DidCache>,
    pub per: Arc<dyn DidCache>,
    pub loc: Arc<dyn DidCache>,
    pub org: Arc<dyn DidCache>,
}

impl CachePartitions {
    /// Connect all partitions to Redis
    pub async fn connect(args: &CacheArgs) -> Result<Self> {
        let did = connect_partition(args, CachePartition::Did).await?;
        let per = connect_partition(args, CachePartition::Per).await?;
        let loc = connect_partition(args, CachePartition::Loc).await?;
        let org = connect_partition(args, CachePartition::Org).await?;

        info!(
            host = %args.redis_host,
            port = args.redis_port,
            did_db = args.redis_db,
            "Redis cache partitions connected"
        );

        Ok(Self {
            did: Arc::new(did),
            per: Arc::new(per),
            loc: Arc::new(loc),
            org: Arc::new(org),
        })
    }

    /// In-memory partitions (dev mode and tests)
    pub fn in_memory() -> Self {
        Self {
            did: Arc::new(MemoryDidCache::new()),
            per: Arc::new(MemoryDidCache::new()),
            loc: Arc::new(MemoryDidCache::new()),
            org: Arc::new(MemoryDidCache::new()),
        }
    }

    /// In-memory partitions around an existing DID cache
    pub fn in_memory_with(did: Arc<dyn DidCache>) -> Self {
        Self {
            did,
            ..Self::in_memory()
        }
    }

    pub fn get(&self, partition: CachePartition) -> &Arc<dyn DidCache> {
        match partition {
            CachePartition::Did => &self.did,
            CachePartition::Per => &self.per,
            CachePartition::Loc => &self.loc,
            CachePartition::Org => &self.org,
        }
    }

    /// Ping every partition
    pub async fn health(&self) -> Vec<PartitionHealth> {
        let mut report = Vec::with_capacity(CachePartition::ALL.len());
        for partition in CachePartition::ALL {
            let cache = self.get(partition);
            let (reachable, error) = match cache.ping().await {
                Ok(()) => (true, None),
                Err(e) => {
                    warn!(partition = partition.as_str(), error = %e, "Cache partition unreachable");
                    (false, Some(e.to_string()))
                }
            };
            report.push(PartitionHealth {
                partition,
                backend: cache.backend(),
                reachable,
                error,
            });
        }
        report
    }
}
