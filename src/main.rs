//! did-summarizer - DID assignment cache and vocabulary summarizer

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use did_summarizer::{
    cache::CachePartitions,
    config::Args,
    db::{DocumentStore, MemoryDocumentStore, MongoDocumentStore},
    server::{self, AppState},
    services::{
        CommandRecommender, DidAssignmentService, HttpDidRegistry, NamespaceSummarizer,
        RecommenderConfig, RegistryConfig, RegistrySecret,
    },
};

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("did_summarizer={},info", args.effective_log_level()).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  did-summarizer {}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Registry: {}", args.registry.registry_url);
    info!(
        "Redis: {}:{} (did={}, per={}, loc={}, org={})",
        args.cache.redis_host,
        args.cache.redis_port,
        args.cache.redis_db,
        args.cache.redis_per,
        args.cache.redis_loc,
        args.cache.redis_org
    );
    info!("MongoDB: {} / {}.{}", args.mongodb_uri, args.mongodb_db, args.mongodb_collection);
    info!("Time zone: {}", args.timezone);
    info!("Recommender: {} --cwd {}", args.recommender_bin, args.recommender_dir);
    info!("======================================");

    // Redis partitions (in-memory fallback in dev mode)
    let partitions = match CachePartitions::connect(&args.cache).await {
        Ok(partitions) => partitions,
        Err(e) if args.dev_mode => {
            warn!("Redis unavailable (dev mode, using in-memory cache): {}", e);
            CachePartitions::in_memory()
        }
        Err(e) => {
            error!("Redis connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Document Store (in-memory fallback in dev mode)
    let store: Arc<dyn DocumentStore> = match MongoDocumentStore::connect(
        &args.mongodb_uri,
        &args.mongodb_db,
        &args.mongodb_collection,
    )
    .await
    {
        Ok(store) => Arc::new(store),
        Err(e) if args.dev_mode => {
            warn!("MongoDB unavailable (dev mode, using in-memory store): {}", e);
            Arc::new(MemoryDocumentStore::new())
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let registry = Arc::new(HttpDidRegistry::new(RegistryConfig {
        base_url: args.registry.registry_url.clone(),
        request_timeout: args.request_timeout(),
    }));
    info!("DID registry endpoint: {}", registry.create_url());

    let secret = RegistrySecret::new(
        args.registry.doc_pwd.clone().unwrap_or_default(),
        args.registry.rev_pwd.clone().unwrap_or_default(),
    );

    let assignment = Arc::new(DidAssignmentService::new(
        Arc::clone(&partitions.did),
        store,
        registry,
        secret,
    ));

    // A cache missing known URIs would mint duplicate DIDs for them
    match assignment.rebuild_cache().await {
        Ok(count) => info!("DID cache rebuilt with {} entries", count),
        Err(e) if args.dev_mode => warn!("DID cache rebuild failed (dev mode, continuing): {}", e),
        Err(e) => {
            error!("DID cache rebuild failed: {}", e);
            std::process::exit(1);
        }
    }

    let summarizer = Arc::new(NamespaceSummarizer::new(args.request_timeout()));
    let recommender = Arc::new(CommandRecommender::new(RecommenderConfig {
        program: args.recommender_bin.clone(),
        working_dir: PathBuf::from(&args.recommender_dir),
        timeout: args.recommender_timeout(),
    }));

    let state = Arc::new(AppState::new(
        args,
        assignment,
        partitions,
        summarizer,
        recommender,
    )?);

    tokio::select! {
        result = server::run(state) => {
            if let Err(e) = result {
                error!("Server error: {:?}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
