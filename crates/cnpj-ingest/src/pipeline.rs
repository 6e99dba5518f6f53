//! Ingestion pipeline driver
//!
//! Wires reader, parser, accumulator, writer and transaction controller
//! for one source file: drains the stream to its natural end, flushes the
//! trailing partial batch, finalizes the transaction, and reports what was
//! committed. On any stream or write error the open transaction is rolled
//! back and the error surfaces to the caller; batches committed before the
//! failure stay committed, and a restart of the same file is safe because
//! every write is an upsert on the entity's natural key.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use crate::batch::BatchAccumulator;
use crate::entities::EntityDescriptor;
use crate::models::IngestReport;
use crate::parser::RecordParser;
use crate::reader::RecordReader;
use crate::txn::TxnController;
use crate::writer::UpsertWriter;

/// Default WAL checkpoint cadence, in committed batches
pub const DEFAULT_CHECKPOINT_EVERY: u64 = 1;

/// Generic ingestion pipeline, parameterized per file by an entity
/// descriptor
pub struct IngestPipeline {
    pool: SqlitePool,
    checkpoint_every: u64,
    batch_size_override: Option<usize>,
}

impl IngestPipeline {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            batch_size_override: None,
        }
    }

    /// Override the WAL checkpoint cadence (0 disables checkpoints)
    pub fn with_checkpoint_every(mut self, every: u64) -> Self {
        self.checkpoint_every = every;
        self
    }

    /// Override every descriptor's batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size_override = Some(batch_size);
        self
    }

    /// Ingest one source stream into the descriptor's table
    pub async fn ingest<R>(
        &self,
        source: R,
        descriptor: &EntityDescriptor,
    ) -> Result<IngestReport>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut controller = TxnController::new(self.pool.clone(), self.checkpoint_every);
        controller.begin().await?;

        match self.drain(source, descriptor, &mut controller).await {
            Ok(report) => Ok(report),
            Err(error) => {
                if let Err(rollback_err) = controller.rollback().await {
                    warn!(
                        entity = descriptor.entity.as_str(),
                        error = %rollback_err,
                        "Rollback failed after ingestion error"
                    );
                }
                Err(error)
            },
        }
    }

    /// Ingest one extracted file from disk
    pub async fn ingest_file(
        &self,
        path: &Path,
        descriptor: &EntityDescriptor,
    ) -> Result<IngestReport> {
        info!(
            entity = descriptor.entity.as_str(),
            file = %path.display(),
            "Processing file"
        );

        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let report = self.ingest(file, descriptor).await?;

        info!(
            entity = descriptor.entity.as_str(),
            file = %path.display(),
            "File processed: {}",
            report.summary()
        );
        Ok(report)
    }

    async fn drain<R>(
        &self,
        source: R,
        descriptor: &EntityDescriptor,
        controller: &mut TxnController,
    ) -> Result<IngestReport>
    where
        R: AsyncRead + Unpin + Send,
    {
        let batch_size = self.batch_size_override.unwrap_or(descriptor.batch_size);
        let parser = RecordParser::new(descriptor);
        let writer = UpsertWriter::new(descriptor);
        let mut reader = RecordReader::new(source);
        let mut accumulator = BatchAccumulator::new(batch_size);
        let mut report = IngestReport::default();

        // The next row is only pulled after the previous batch has fully
        // committed, so memory stays bounded by one batch.
        while let Some(fields) = reader.next_record().await? {
            let Some(row) = parser.parse(&fields) else {
                report.skipped += 1;
                continue;
            };

            if let Some(batch) = accumulator.push(row) {
                let outcome = writer.write_batch(controller.tx()?, &batch).await?;
                controller.commit_batch().await?;

                report.committed += outcome.accepted;
                report.rejected += outcome.rejected;
                report.batches += 1;

                info!(
                    entity = descriptor.entity.as_str(),
                    committed = report.committed,
                    "Committed batch"
                );
            }
        }

        // Trailing partial batch, then the final commit
        if let Some(batch) = accumulator.finish() {
            let outcome = writer.write_batch(controller.tx()?, &batch).await?;
            controller.finish().await?;

            report.committed += outcome.accepted;
            report.rejected += outcome.rejected;
            report.batches += 1;
        } else {
            controller.finish().await?;
        }

        info!(
            entity = descriptor.entity.as_str(),
            "Ingestion finished: {}",
            report.summary()
        );
        Ok(report)
    }
}
