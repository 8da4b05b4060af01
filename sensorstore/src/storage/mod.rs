//! Storage backends for sensor row persistence.
//!
//! This module provides the `StorageBackend` trait and its DuckDB
//! implementation:
//! - `duckdb`: embedded analytical database, in-memory or file backed
//!
//! Every backend publishes a [`StoreChange`] on its change feed after each
//! committed insert, so watchers can react to new data without polling.

pub mod duckdb;

use crate::aggregation::SensorAggregate;
use crate::config::EngineConfig;
use crate::error::StoreError;
use crate::row::SensorRow;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the change feed channel.
pub const CHANGE_FEED_CAPACITY: usize = 64;

/// Notification sent after rows were committed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreChange {
    /// Number of rows in the committed insert
    pub rows_inserted: usize,
    /// Number of rows in the table after the insert
    pub total_rows: u64,
}

/// Storage backend trait for sensor rows.
///
/// This trait defines the interface that all storage backends must implement.
/// It provides methods for:
/// - Initialization of the `SensorData` table
/// - Appending rows
/// - Reading rows back in insertion order
/// - SQL-side per-sensor summaries
/// - Subscribing to the change feed
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Initialize the storage backend.
    async fn init(&self) -> Result<(), StoreError>;

    /// Append rows in one transaction, returning the number written.
    /// An empty batch is a no-op and publishes no change.
    async fn insert_rows(&self, rows: Vec<SensorRow>) -> Result<usize, StoreError>;

    /// Read every row in insertion order.
    async fn query_rows(&self) -> Result<Vec<SensorRow>, StoreError>;

    /// Count persisted rows.
    async fn row_count(&self) -> Result<u64, StoreError>;

    /// Summarize every measured column per sensor inside the database.
    async fn summarize(&self) -> Result<Vec<SensorAggregate>, StoreError>;

    /// Subscribe to change notifications published after each insert.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Opens the backend named by the engine configuration.
pub fn open_backend(config: &EngineConfig) -> Result<Arc<dyn StorageBackend>, StoreError> {
    match config.engine.as_str() {
        "duckdb" => Ok(Arc::new(self::duckdb::DuckDbBackend::new_with_options(
            &config.connection,
            &config.options,
        )?)),
        other => Err(StoreError::UnsupportedEngine(other.to_string())),
    }
}
