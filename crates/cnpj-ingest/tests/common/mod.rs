//! Shared helpers for store-backed integration tests
#![allow(dead_code)]

use cnpj_ingest::{db, schema};
use sqlx::SqlitePool;

/// In-memory store with the full target schema
pub async fn store_with_schema() -> SqlitePool {
    let pool = db::open_memory_store().await.expect("open in-memory store");
    schema::create_schema(&pool).await.expect("create schema");
    pool
}

/// Bare in-memory store, for tests that create their own tables
pub async fn bare_store() -> SqlitePool {
    db::open_memory_store().await.expect("open in-memory store")
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count rows")
}
