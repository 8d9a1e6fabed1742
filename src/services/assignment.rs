//! DID Assignment Service
//!
//! Given a URI, returns its DID: from the cache when present, otherwise by
//! minting one through the registry, persisting the record and caching it.
//!
//! ## Miss path
//!
//! ```text
//! cache.get(uri) ── hit ──────────────────────────────▶ did
//!       │ miss
//!       ▼
//! lock(uri) → cache.get(uri) ── hit (another task won) ▶ did
//!       │ miss
//!       ▼
//! registry.create → store.insert → cache.set ─────────▶ did
//! ```
//!
//! The per-URI lock makes creation at-most-once per URI within one process.
//! Separate processes sharing one Redis can still each mint a DID for the
//! same URI; the last cache write wins.

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::DidCache;
use crate::db::{DidRecord, DocumentStore};
use crate::services::registry::{DidRegistry, RegistrationPayload, RegistrySecret};
use crate::types::{Result, ServiceError};

/// Assignment counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub dids_created: u64,
    pub store_failures: u64,
}

/// URI -> DID assignment with cache-first lookup
pub struct DidAssignmentService {
    cache: Arc<dyn DidCache>,
    store: Arc<dyn DocumentStore>,
    registry: Arc<dyn DidRegistry>,
    secret: RegistrySecret,
    /// Locks for URIs currently on the miss path
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    created: AtomicU64,
    store_failures: AtomicU64,
}

impl DidAssignmentService {
    pub fn new(
        cache: Arc<dyn DidCache>,
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn DidRegistry>,
        secret: RegistrySecret,
    ) -> Self {
        Self {
            cache,
            store,
            registry,
            secret,
            in_flight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            created: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
        }
    }

    /// Return the DID for `uri`, minting one on first sight.
    ///
    /// `extra_metadata` is merged into the registered metadata on a miss and
    /// ignored on a hit. Its `uri` key, if any, never overrides `uri`.
    pub async fn assign(&self, uri: &str, extra_metadata: Option<Map<String, Value>>) -> Result<String> {
        if uri.is_empty() {
            return Err(ServiceError::BadRequest("uri must not be empty".to_string()));
        }

        if let Some(did) = self.cache.get(uri).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(uri = uri, did = %did, "DID served from cache");
            return Ok(did);
        }

        let entry = InFlight::acquire(&self.in_flight, uri);
        let _guard = entry.lock.lock().await;

        // Double-check after acquiring lock
        match self.cache.get(uri).await? {
            Some(did) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(uri = uri, did = %did, "DID created by concurrent request");
                Ok(did)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.create(uri, extra_metadata).await
            }
        }
    }

    /// Assign DIDs to many URIs concurrently.
    ///
    /// Duplicates collapse to one entry. Any failure fails the whole batch.
    pub async fn assign_batch(&self, uris: &[String]) -> Result<BTreeMap<String, String>> {
        let mut unique: Vec<&String> = uris.iter().collect();
        unique.sort();
        unique.dedup();

        let dids = futures::future::try_join_all(
            unique.iter().map(|uri| self.assign(uri, None)),
        )
        .await?;

        Ok(unique.into_iter().cloned().zip(dids).collect())
    }

    /// Repopulate the cache from the Document Store.
    ///
    /// Pairs are written oldest first so the newest record for a URI wins.
    /// Only called at startup.
    pub async fn rebuild_cache(&self) -> Result<usize> {
        let pairs = self.store.pairs().await?;

        let mut latest: BTreeMap<String, String> = BTreeMap::new();
        for (uri, did) in pairs {
            latest.insert(uri, did);
        }
        let pairs: Vec<(String, String)> = latest.into_iter().collect();

        self.cache.set_many(&pairs).await?;
        info!(
            count = pairs.len(),
            store = self.store.backend(),
            cache = self.cache.backend(),
            "DID cache rebuilt from document store"
        );
        Ok(pairs.len())
    }

    pub fn stats(&self) -> AssignmentStats {
        AssignmentStats {
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
            dids_created: self.created.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    async fn create(&self, uri: &str, extra_metadata: Option<Map<String, Value>>) -> Result<String> {
        let metadata = merge_metadata(uri, extra_metadata);
        let payload = RegistrationPayload::new(uri, metadata.clone(), self.secret.clone());

        let did = self.registry.create(&payload).await?;
        self.created.fetch_add(1, Ordering::Relaxed);

        let record = DidRecord {
            uri: uri.to_string(),
            did: did.clone(),
            metadata,
        };
        if let Err(e) = self.store.insert(record).await {
            // The DID exists at the registry already; losing the record only
            // costs the next cache rebuild.
            self.store_failures.fetch_add(1, Ordering::Relaxed);
            warn!(uri = uri, did = %did, error = %e, "Failed to persist DID record");
        }

        self.cache.set(uri, &did).await?;
        info!(uri = uri, did = %did, "DID assigned");

        Ok(did)
    }
}

/// Lock entry for one URI on the miss path
///
/// Dropping it, including when the request future is cancelled, removes the
/// map entry once no other task holds the lock.
struct InFlight<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    uri: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn acquire(map: &'a DashMap<String, Arc<Mutex<()>>>, uri: &'a str) -> Self {
        let lock = map
            .entry(uri.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { map, uri, lock }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // The map's own reference plus ours
        self.map
            .remove_if(self.uri, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

/// `{uri: uri} ∪ extra`, with `uri` authoritative
pub fn merge_metadata(uri: &str, extra: Option<Map<String, Value>>) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("uri".to_string(), Value::String(uri.to_string()));
    if let Some(extra) = extra {
        for (key, value) in extra {
            if key != "uri" {
                metadata.insert(key, value);
            }
        }
    }
    metadata
}
