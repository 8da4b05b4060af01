use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("invalid engine option {key}={value}")]
    InvalidOption { key: String, value: String },

    #[error("unsupported engine type: {0}")]
    UnsupportedEngine(String),

    #[error("invalid value {value} in column {column}")]
    InvalidValue { column: &'static str, value: i64 },
}
