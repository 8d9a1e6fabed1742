//! Configuration for did-summarizer
//!
//! CLI arguments and environment variable handling using clap.
//! Variable names match the existing deployment environment (`REDIS_*`,
//! `GENERICURI_DID`, `DID_PWD`, `DID_SECRET`, `TIMEZONE`, `DEBUG`).
//! Boolean variables are on for any value except an empty string or one of
//! `false`, `no`, `off`, `n`, `f`, `0`.

use clap::builder::FalseyValueParser;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use chrono_tz::Tz;

/// did-summarizer - DID assignment cache and vocabulary summarizer
#[derive(Parser, Debug, Clone)]
#[command(name = "did-summarizer")]
#[command(about = "Assigns cached DIDs to URIs and summarizes Linked Data vocabularies")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:9266")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory fallbacks for Redis and MongoDB)
    #[arg(
        long,
        env = "DEV_MODE",
        default_value = "false",
        value_parser = FalseyValueParser::new()
    )]
    pub dev_mode: bool,

    /// Verbose logging (forces debug level for this crate)
    #[arg(
        long,
        env = "DEBUG",
        default_value = "false",
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(
        long,
        env = "LOG_JSON",
        default_value = "false",
        value_parser = FalseyValueParser::new()
    )]
    pub log_json: bool,

    /// IANA time zone used for summary timestamps
    #[arg(long, env = "TIMEZONE", default_value = "UTC")]
    pub timezone: String,

    /// Timeout for outbound HTTP requests in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Redis cache configuration
    #[command(flatten)]
    pub cache: CacheArgs,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "did")]
    pub mongodb_db: String,

    /// MongoDB collection holding URI/DID records
    #[arg(long, env = "MONGODB_COLLECTION", default_value = "uri")]
    pub mongodb_collection: String,

    /// DID registry configuration
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Working directory of the vocabulary recommender
    #[arg(long, env = "RECOMMENDER_DIR", default_value = "/app/vocabulary-recommender")]
    pub recommender_dir: String,

    /// Program used to launch the recommender
    #[arg(long, env = "RECOMMENDER_BIN", default_value = "yarn")]
    pub recommender_bin: String,

    /// Recommender run time limit in seconds
    #[arg(long, env = "RECOMMENDER_TIMEOUT_SECS", default_value = "120")]
    pub recommender_timeout_secs: u64,
}

/// Redis connection configuration
///
/// One server, four logical databases. Only the DID partition is read and
/// written by the request handlers; the other three are connected and
/// health-checked.
#[derive(Parser, Debug, Clone)]
pub struct CacheArgs {
    /// Redis host
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    pub redis_host: String,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value = "6379")]
    pub redis_port: u16,

    /// Logical database for URI -> DID entries
    #[arg(long, env = "REDIS_DB", default_value = "0")]
    pub redis_db: i64,

    /// Logical database for the "per" partition
    #[arg(long, env = "REDIS_PER", default_value = "1")]
    pub redis_per: i64,

    /// Logical database for the "loc" partition
    #[arg(long, env = "REDIS_LOC", default_value = "2")]
    pub redis_loc: i64,

    /// Logical database for the "org" partition
    #[arg(long, env = "REDIS_ORG", default_value = "3")]
    pub redis_org: i64,
}

/// DID registry configuration
#[derive(Parser, Clone)]
pub struct RegistryArgs {
    /// Base URL of the DID registry (create endpoint is appended)
    #[arg(long, env = "GENERICURI_DID", default_value = "http://localhost:3000")]
    pub registry_url: String,

    /// Document password forwarded with every registration
    #[arg(long, env = "DID_PWD", hide_env_values = true)]
    pub doc_pwd: Option<String>,

    /// Revocation password forwarded with every registration
    #[arg(long, env = "DID_SECRET", hide_env_values = true)]
    pub rev_pwd: Option<String>,
}

impl std::fmt::Debug for RegistryArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryArgs")
            .field("registry_url", &self.registry_url)
            .field("doc_pwd", &self.doc_pwd.as_ref().map(|_| "<redacted>"))
            .field("rev_pwd", &self.rev_pwd.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CacheArgs {
    /// Redis URL for one logical database
    pub fn redis_url(&self, db: i64) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, db)
    }
}

impl Args {
    /// Effective log level (DEBUG overrides LOG_LEVEL)
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// Parsed display time zone
    pub fn time_zone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| format!("TIMEZONE '{}' is not a known IANA time zone", self.timezone))
    }

    /// Outbound HTTP timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn recommender_timeout(&self) -> Duration {
        Duration::from_secs(self.recommender_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.registry.doc_pwd.is_none() {
                return Err("DID_PWD is required in production mode".to_string());
            }
            if self.registry.rev_pwd.is_none() {
                return Err("DID_SECRET is required in production mode".to_string());
            }
        }

        if self.registry.registry_url.trim().is_empty() {
            return Err("GENERICURI_DID must not be empty".to_string());
        }

        self.time_zone()?;

        let c = &self.cache;
        let mut dbs = [c.redis_db, c.redis_per, c.redis_loc, c.redis_org];
        dbs.sort_unstable();
        if dbs.windows(2).any(|w| w[0] == w[1]) {
            return Err(
                "REDIS_DB, REDIS_PER, REDIS_LOC and REDIS_ORG must be distinct".to_string(),
            );
        }

        Ok(())
    }
}
