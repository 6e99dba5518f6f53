//! Run configuration
//!
//! Environment-driven settings for the ingestion binary. The pipeline
//! itself takes explicit values; this module only exists so the
//! orchestrating layer has one place to resolve them.

use std::path::PathBuf;

use crate::db::{StoreConfig, DEFAULT_DB_PATH, DEFAULT_MAX_CONNECTIONS};
use crate::pipeline::DEFAULT_CHECKPOINT_EVERY;

/// Default directory holding the extracted registry files
pub const DEFAULT_DATA_DIR: &str = "dados";

/// Ingestion run configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Store connection settings
    pub store: StoreConfig,
    /// Directory scanned by the `process` command
    pub data_dir: PathBuf,
    /// WAL checkpoint cadence, in committed batches (0 disables)
    pub checkpoint_every: u64,
    /// Batch size override applied to every entity (None = per-entity
    /// descriptor defaults)
    pub batch_size: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            batch_size: None,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `CNPJ_DB_PATH`: store file path (default `dados/cnpj.db`)
    /// - `CNPJ_DATA_DIR`: extracted-files directory (default `dados`)
    /// - `CNPJ_MAX_CONNECTIONS`: pool size
    /// - `CNPJ_CHECKPOINT_EVERY`: batches per WAL checkpoint
    /// - `CNPJ_BATCH_SIZE`: batch size override for every entity
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let db_path = std::env::var("CNPJ_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let max_connections = std::env::var("CNPJ_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let data_dir = std::env::var("CNPJ_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let checkpoint_every = std::env::var("CNPJ_CHECKPOINT_EVERY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CHECKPOINT_EVERY);

        let batch_size = std::env::var("CNPJ_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(Self {
            store: StoreConfig::new(db_path).with_max_connections(max_connections),
            data_dir,
            checkpoint_every,
            batch_size,
        })
    }
}
