use thiserror::Error;

/// Errors surfaced by the loan core, the stores and the CLI front end.
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Loan not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, LoanError>;
