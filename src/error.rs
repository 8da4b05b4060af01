use sensorstore_core::StoreError;
use thiserror::Error;

/// Errors surfaced by the generator, the aggregator and the trigger handlers.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// A numeric argument was missing, non-numeric or not positive.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A request body or record could not be decoded.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The reading collection was empty.
    #[error("no readings found")]
    NoData,

    /// Anything unexpected; the detail is logged, never returned to callers.
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

impl From<StoreError> for WeatherError {
    fn from(err: StoreError) -> Self {
        WeatherError::InternalFailure(err.to_string())
    }
}
