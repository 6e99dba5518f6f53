//! Transaction and checkpoint controller
//!
//! Wraps groups of batches in transactions: a transaction is open before
//! the first batch, each commit immediately reopens the next one, and
//! every `checkpoint_every` committed batches a WAL checkpoint flushes
//! write-ahead data into the main store file, bounding log growth and
//! recovery time on multi-gigabyte ingests.
//!
//! There is no retry at this layer; on a writer failure the open
//! transaction is rolled back and the error re-raised.

use anyhow::{Context, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;

/// Controller lifecycle:
/// `Idle -> TxOpen -> (commit -> TxOpen)* -> FinalCommitted`,
/// with `RolledBack` terminal reachable from `TxOpen` on any writer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Idle,
    TxOpen,
    FinalCommitted,
    RolledBack,
}

impl TxnState {
    pub fn as_str(&self) -> &str {
        match self {
            TxnState::Idle => "idle",
            TxnState::TxOpen => "tx_open",
            TxnState::FinalCommitted => "final_committed",
            TxnState::RolledBack => "rolled_back",
        }
    }
}

/// Transaction controller for one file's ingestion
pub struct TxnController {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    state: TxnState,
    committed_batches: u64,
    checkpoint_every: u64,
}

impl TxnController {
    /// Create a controller checkpointing every `checkpoint_every`
    /// committed batches (0 disables checkpoints)
    pub fn new(pool: SqlitePool, checkpoint_every: u64) -> Self {
        Self {
            pool,
            tx: None,
            state: TxnState::Idle,
            committed_batches: 0,
            checkpoint_every,
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    pub fn committed_batches(&self) -> u64 {
        self.committed_batches
    }

    /// Open the first transaction
    pub async fn begin(&mut self) -> Result<()> {
        anyhow::ensure!(
            self.state == TxnState::Idle,
            "controller already started (state: {})",
            self.state.as_str()
        );
        self.open_tx().await
    }

    /// The currently open transaction, for the writer to execute against
    pub fn tx(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        self.tx
            .as_mut()
            .with_context(|| format!("No open transaction (state: {})", self.state.as_str()))
    }

    /// Commit the current batch and immediately open the next
    /// transaction, issuing a WAL checkpoint when one is due
    pub async fn commit_batch(&mut self) -> Result<()> {
        let tx = self.take_open_tx()?;

        if let Err(e) = tx.commit().await {
            self.state = TxnState::RolledBack;
            return Err(e).context("Failed to commit batch");
        }
        self.committed_batches += 1;

        if self.checkpoint_every > 0 && self.committed_batches % self.checkpoint_every == 0 {
            self.checkpoint().await;
        }

        self.open_tx().await
    }

    /// Commit the final batch without reopening
    pub async fn finish(&mut self) -> Result<()> {
        let tx = self.take_open_tx()?;

        if let Err(e) = tx.commit().await {
            self.state = TxnState::RolledBack;
            return Err(e).context("Failed to commit final batch");
        }
        self.committed_batches += 1;
        self.state = TxnState::FinalCommitted;

        self.checkpoint().await;
        Ok(())
    }

    /// Roll back the open transaction after a writer failure.
    ///
    /// Tolerates being called with no transaction open, so the driver can
    /// use it unconditionally on its error path.
    pub async fn rollback(&mut self) -> Result<()> {
        let result = match self.tx.take() {
            Some(tx) => tx.rollback().await.context("Failed to roll back transaction"),
            None => Ok(()),
        };
        self.state = TxnState::RolledBack;
        result
    }

    async fn open_tx(&mut self) -> Result<()> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction")?;
        self.tx = Some(tx);
        self.state = TxnState::TxOpen;
        Ok(())
    }

    fn take_open_tx(&mut self) -> Result<Transaction<'static, Sqlite>> {
        self.tx
            .take()
            .with_context(|| format!("No open transaction (state: {})", self.state.as_str()))
    }

    /// Flush write-ahead data into the main store file. Failure here is
    /// logged, not fatal: the committed data is already durable in the log.
    async fn checkpoint(&self) {
        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(PASSIVE)")
            .execute(&self.pool)
            .await
        {
            warn!(error = %e, "WAL checkpoint failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_store;

    #[tokio::test]
    async fn test_commit_reopens_transaction() {
        let pool = open_memory_store().await.unwrap();
        let mut ctrl = TxnController::new(pool, 1);

        ctrl.begin().await.unwrap();
        assert_eq!(ctrl.state(), TxnState::TxOpen);

        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&mut **ctrl.tx().unwrap())
            .await
            .unwrap();

        ctrl.commit_batch().await.unwrap();
        assert_eq!(ctrl.state(), TxnState::TxOpen);
        assert_eq!(ctrl.committed_batches(), 1);

        ctrl.finish().await.unwrap();
        assert_eq!(ctrl.state(), TxnState::FinalCommitted);
        assert_eq!(ctrl.committed_batches(), 2);
    }

    #[tokio::test]
    async fn test_rollback_discards_open_work() {
        let pool = open_memory_store().await.unwrap();

        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        let mut ctrl = TxnController::new(pool.clone(), 0);
        ctrl.begin().await.unwrap();

        sqlx::query("INSERT INTO t (id) VALUES (1)")
            .execute(&mut **ctrl.tx().unwrap())
            .await
            .unwrap();

        ctrl.rollback().await.unwrap();
        assert_eq!(ctrl.state(), TxnState::RolledBack);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_begin_twice_is_an_error() {
        let pool = open_memory_store().await.unwrap();
        let mut ctrl = TxnController::new(pool, 0);

        ctrl.begin().await.unwrap();
        assert!(ctrl.begin().await.is_err());
    }

    #[tokio::test]
    async fn test_rollback_without_open_tx_is_tolerated() {
        let pool = open_memory_store().await.unwrap();
        let mut ctrl = TxnController::new(pool, 0);

        ctrl.rollback().await.unwrap();
        assert_eq!(ctrl.state(), TxnState::RolledBack);
    }
}
