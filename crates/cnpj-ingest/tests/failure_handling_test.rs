//! Failure-path behavior: rollback scope, per-row rejection, stream errors

mod common;

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use common::{bare_store, count};

use cnpj_ingest::entities::Entity;
use cnpj_ingest::pipeline::IngestPipeline;
use sqlx::SqlitePool;
use tokio::io::{AsyncRead, ReadBuf};

/// Reference table with a constraint the standard schema does not carry,
/// so write failures can be provoked deterministically
async fn store_with_checked_motivos() -> SqlitePool {
    let pool = bare_store().await;
    sqlx::query(
        "CREATE TABLE motivos (\
             codigo TEXT PRIMARY KEY, \
             descricao TEXT NOT NULL CHECK (length(descricao) > 0)\
         )",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool
}

#[tokio::test]
async fn test_mid_batch_failure_rolls_back_only_the_failing_batch() {
    let pool = store_with_checked_motivos().await;
    let pipeline = IngestPipeline::new(pool.clone()).with_batch_size(2);

    let mut descriptor = Entity::Motivos.descriptor();
    descriptor.skip_row_errors = false;

    // Five batches of two; row 03 (batch 2) violates the check constraint
    let source = b"01;Primeira\n02;Segunda\n03;\n04;Quarta\n05;Quinta\n\
                   06;Sexta\n07;Setima\n08;Oitava\n09;Nona\n10;Decima\n";

    let result = pipeline.ingest(&source[..], &descriptor).await;
    assert!(result.is_err());

    // Batch 1 stays committed; batch 2 rolled back whole; batches 3-5
    // were never attempted
    assert_eq!(count(&pool, "motivos").await, 2);

    let survivors: Vec<String> =
        sqlx::query_scalar("SELECT codigo FROM motivos ORDER BY codigo")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(survivors, vec!["01", "02"]);
}

#[tokio::test]
async fn test_per_row_rejection_keeps_the_batch_going() {
    let pool = store_with_checked_motivos().await;
    let pipeline = IngestPipeline::new(pool.clone());

    // skip_row_errors is the reference-table default
    let descriptor = Entity::Motivos.descriptor();
    assert!(descriptor.skip_row_errors);

    let source = b"01;Primeira\n02;Segunda\n03;\n04;Quarta\n";
    let report = pipeline.ingest(&source[..], &descriptor).await.unwrap();

    assert_eq!(report.committed, 3);
    assert_eq!(report.rejected, 1);
    assert_eq!(count(&pool, "motivos").await, 3);
}

/// Yields one chunk of valid rows, then fails like an interrupted stream
struct FailingReader {
    sent: bool,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.sent {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "stream interrupted",
            )));
        }
        this.sent = true;
        buf.put_slice(b"01;Primeira\n02;Segunda\n");
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_stream_error_aborts_but_keeps_committed_batches() {
    let pool = store_with_checked_motivos().await;
    let pipeline = IngestPipeline::new(pool.clone()).with_batch_size(1);

    let result = pipeline
        .ingest(FailingReader { sent: false }, &Entity::Motivos.descriptor())
        .await;
    assert!(result.is_err());

    // Both rows committed as single-row batches before the stream died
    assert_eq!(count(&pool, "motivos").await, 2);
}

#[tokio::test]
async fn test_zero_row_source_on_checked_table_is_a_noop() {
    let pool = store_with_checked_motivos().await;
    let pipeline = IngestPipeline::new(pool.clone());

    let report = pipeline
        .ingest(&b"\n\n"[..], &Entity::Motivos.descriptor())
        .await
        .unwrap();

    assert_eq!(report.committed, 0);
    assert_eq!(count(&pool, "motivos").await, 0);
}
