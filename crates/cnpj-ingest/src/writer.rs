//! Upsert writer
//!
//! Executes an accumulated batch against the currently open transaction,
//! one upsert per row on the entity's generated statement (sqlx's
//! statement cache keeps it prepared across rows). A batch is never left
//! partially visible: it either commits as a whole at the transaction
//! boundary or rolls back as a whole.
//!
//! Per-row constraint violations are absorbed only for entities that opt
//! in (the reference-table loaders): the offending key is logged and the
//! row dropped. Everything else propagates to the transaction controller.

use anyhow::{Context, Result};
use sqlx::error::ErrorKind;
use sqlx::{Sqlite, Transaction};
use tracing::warn;

use crate::batch::Batch;
use crate::entities::EntityDescriptor;
use crate::models::FieldValue;

/// Result of writing one batch
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOutcome {
    /// Rows accepted into the open transaction
    pub accepted: u64,
    /// Rows rejected by a per-row constraint violation and dropped
    pub rejected: u64,
}

/// Writer executing one entity's upsert statement
pub struct UpsertWriter<'a> {
    descriptor: &'a EntityDescriptor,
    sql: String,
}

impl<'a> UpsertWriter<'a> {
    pub fn new(descriptor: &'a EntityDescriptor) -> Self {
        Self {
            sql: descriptor.upsert_sql(),
            descriptor,
        }
    }

    /// Execute a batch inside the open transaction.
    ///
    /// Zero-row batches are a no-op. Fatal execution errors (broken
    /// connection, aborting violations) propagate so the controller can
    /// roll back.
    pub async fn write_batch(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        batch: &Batch,
    ) -> Result<WriteOutcome> {
        let mut outcome = WriteOutcome::default();

        for row in batch {
            let mut query = sqlx::query(&self.sql);
            for value in row {
                query = match value {
                    FieldValue::Text(s) => query.bind(s.as_str()),
                    FieldValue::Real(v) => query.bind(*v),
                    FieldValue::Integer(v) => query.bind(*v),
                    FieldValue::Null => query.bind(None::<String>),
                };
            }

            match query.execute(&mut **tx).await {
                Ok(_) => outcome.accepted += 1,
                Err(sqlx::Error::Database(db_err))
                    if self.descriptor.skip_row_errors
                        && is_constraint_violation(db_err.kind()) =>
                {
                    warn!(
                        entity = self.descriptor.entity.as_str(),
                        key = %self.descriptor.key_display(row),
                        error = %db_err,
                        "Row rejected by constraint, skipping"
                    );
                    outcome.rejected += 1;
                },
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to upsert row {} into {}",
                            self.descriptor.key_display(row),
                            self.descriptor.table
                        )
                    });
                },
            }
        }

        Ok(outcome)
    }
}

/// Violations the store reports per row without invalidating the
/// transaction; anything else is treated as batch-fatal.
fn is_constraint_violation(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    )
}
