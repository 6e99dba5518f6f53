//! CNPJ Ingest - bulk loader for the national business registry extracts

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cnpj_common::logging::{init_logging, LogConfig, LogLevel};
use cnpj_ingest::config::IngestConfig;
use cnpj_ingest::entities::Entity;
use cnpj_ingest::models::IngestReport;
use cnpj_ingest::pipeline::IngestPipeline;
use cnpj_ingest::{db, schema};
use sqlx::SqlitePool;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cnpj-ingest")]
#[command(author, version, about = "CNPJ open-data bulk ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store schema and search indices
    Schema,

    /// Ingest one extracted file into one entity's table
    File {
        /// Entity name (empresas, estabelecimentos, socios, simples,
        /// cnae, motivos, municipios, naturezas, paises, qualificacoes)
        #[arg(short, long)]
        entity: Entity,

        /// Path to the extracted file
        path: PathBuf,
    },

    /// Process every extracted file found in the data directory, in
    /// dependency order (reference tables first)
    Process {
        /// Directory with extracted files (default: CNPJ_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::new()
        .with_level(log_level)
        .with_file_prefix("cnpj-ingest");

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    let config = IngestConfig::load()?;
    let pool = db::open_store(&config.store).await?;

    let result = run(&cli.command, &pool, &config).await;
    pool.close().await;
    result
}

async fn run(command: &Command, pool: &SqlitePool, config: &IngestConfig) -> Result<()> {
    match command {
        Command::Schema => {
            schema::create_schema(pool).await?;
            schema::create_indices(pool).await?;
        },
        Command::File { entity, path } => {
            let report = build_pipeline(pool, config)
                .ingest_file(path, &entity.descriptor())
                .await?;
            info!(entity = entity.as_str(), "Done: {}", report.summary());
        },
        Command::Process { data_dir } => {
            let data_dir = data_dir.as_deref().unwrap_or(&config.data_dir);
            process_all(pool, config, data_dir).await?;
        },
    }

    Ok(())
}

fn build_pipeline(pool: &SqlitePool, config: &IngestConfig) -> IngestPipeline {
    let mut pipeline =
        IngestPipeline::new(pool.clone()).with_checkpoint_every(config.checkpoint_every);
    if let Some(batch_size) = config.batch_size {
        pipeline = pipeline.with_batch_size(batch_size);
    }
    pipeline
}

/// Ingest every recognized file under `data_dir`, reference tables first
/// so code lookups resolve while the large tables load.
async fn process_all(pool: &SqlitePool, config: &IngestConfig, data_dir: &Path) -> Result<()> {
    info!(data_dir = %data_dir.display(), "Starting full processing run");

    schema::create_schema(pool).await?;

    let pipeline = build_pipeline(pool, config);
    let mut total = IngestReport::default();

    for entity in Entity::ALL {
        let files = find_entity_files(data_dir, entity)?;
        if files.is_empty() {
            info!(entity = entity.as_str(), "No extracted files found, skipping");
            continue;
        }

        for file in files {
            let report = pipeline.ingest_file(&file, &entity.descriptor()).await?;
            total.absorb(&report);
        }
    }

    // Indices go in after the bulk load so they are built once, not
    // maintained row by row.
    schema::create_indices(pool).await?;

    info!("Processing run complete: {}", total.summary());
    Ok(())
}

/// Extracted files belonging to `entity`, in name order
fn find_entity_files(data_dir: &Path, entity: Entity) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.to_lowercase().ends_with(".zip") {
            continue;
        }
        if entity.matches_file_name(&name) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
