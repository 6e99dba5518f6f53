//! Error types for the CNPJ loader

use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, CnpjError>;

/// Main error type for the CNPJ loader
#[derive(Error, Debug)]
pub enum CnpjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
