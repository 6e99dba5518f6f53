//! CNPJ Loader Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the CNPJ loader workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: `tracing` subscriber initialization with env overrides

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CnpjError, Result};
