//! CNPJ Ingest Library
//!
//! Bulk ingestion pipeline for the Brazilian national business-registry
//! open-data extracts: semicolon-delimited, Windows-1252 encoded flat
//! files loaded into a SQLite store through batched transactional upserts.
//!
//! One generic pipeline handles every entity; the per-entity differences
//! (field order, normalization, natural key, batch size) live in
//! declarative [`entities::EntityDescriptor`]s.
//!
//! # Example
//!
//! ```no_run
//! use cnpj_ingest::{db, entities::Entity, pipeline::IngestPipeline, schema};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::open_store(&db::StoreConfig::default()).await?;
//!     schema::create_schema(&pool).await?;
//!
//!     let pipeline = IngestPipeline::new(pool);
//!     let report = pipeline
//!         .ingest_file(
//!             "dados/K3241.K03200Y0.D50412.EMPRECSV".as_ref(),
//!             &Entity::Empresas.descriptor(),
//!         )
//!         .await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod txn;
pub mod writer;

// Re-export commonly used types
pub use batch::BatchAccumulator;
pub use entities::{Column, Entity, EntityDescriptor, FieldKind};
pub use models::{FieldValue, IngestReport, Record};
pub use pipeline::IngestPipeline;
pub use reader::RecordReader;
pub use txn::{TxnController, TxnState};
pub use writer::UpsertWriter;
