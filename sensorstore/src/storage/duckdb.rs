//! DuckDB storage backend implementation.
//!
//! This module provides the sensor row store on top of DuckDB, an embedded
//! analytical database. The implementation supports:
//! - In-memory and persistent storage options
//! - Transactional batch inserts
//! - SQL-side per-sensor summaries
//! - A broadcast change feed fired after each committed insert
//!
//! # Configuration
//!
//! ```toml
//! [engine]
//! engine = "duckdb"
//! connection = ":memory:"  # Use ":memory:" for in-memory or file path
//! options = {
//!     threads = "4",      # Optional: Number of threads
//!     read_only = "false" # Optional: Read-only mode (default: false)
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use ::duckdb::{params, AccessMode, Config, Connection, Row};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use crate::aggregation::{build_summary_query, ColumnAggregate, SensorAggregate};
use crate::error::StoreError;
use crate::row::{create_table_sql, insert_sql, SensorRow, MEASURE_COLUMNS, SENSOR_ID_COLUMN, SENSOR_TABLE};
use crate::storage::{StorageBackend, StoreChange, CHANGE_FEED_CAPACITY};
use async_trait::async_trait;

/// DuckDB-based storage backend for sensor rows.
#[derive(Clone)]
pub struct DuckDbBackend {
    conn: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<StoreChange>,
}

impl DuckDbBackend {
    /// Opens a DuckDB database with the given options.
    ///
    /// Recognised options are `threads` (positive integer) and `read_only`
    /// (`true` or `false`). Other keys are ignored.
    pub fn new_with_options(
        connection_string: &str,
        options: &HashMap<String, String>,
    ) -> Result<Self, StoreError> {
        let mut config = Config::default();

        if let Some(threads) = options.get("threads") {
            let count = threads
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| StoreError::InvalidOption {
                    key: "threads".to_string(),
                    value: threads.clone(),
                })?;
            config = config.threads(count)?;
        }

        if let Some(read_only) = options.get("read_only") {
            let mode = match read_only.as_str() {
                "true" => AccessMode::ReadOnly,
                "false" => AccessMode::ReadWrite,
                _ => {
                    return Err(StoreError::InvalidOption {
                        key: "read_only".to_string(),
                        value: read_only.clone(),
                    })
                }
            };
            config = config.access_mode(mode)?;
        }

        let conn = Connection::open_with_flags(connection_string, config)?;
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
        })
    }

    /// Creates a new DuckDB backend with an in-memory database.
    pub fn new_in_memory() -> Result<Self, StoreError> {
        Self::new_with_options(":memory:", &HashMap::new())
    }

    fn count_rows(conn: &Connection) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", SENSOR_TABLE);
        let count: i64 = conn.query_row(&sql, params![], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn sensor_id(value: i32) -> Result<u32, StoreError> {
        u32::try_from(value).map_err(|_| StoreError::InvalidValue {
            column: SENSOR_ID_COLUMN,
            value: value as i64,
        })
    }

    /// Reads one column summary starting at `offset` in a summary row.
    fn column_aggregate(row: &Row<'_>, offset: usize) -> Result<ColumnAggregate, ::duckdb::Error> {
        Ok(ColumnAggregate {
            min: row.get(offset)?,
            max: row.get(offset + 1)?,
            avg: row.get(offset + 2)?,
            count: row.get(offset + 3)?,
        })
    }
}

#[async_trait]
impl StorageBackend for DuckDbBackend {
    async fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute_batch(&create_table_sql())?;
        Ok(())
    }

    async fn insert_rows(&self, rows: Vec<SensorRow>) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().await;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert_sql())?;
            for row in &rows {
                stmt.execute(params![
                    i64::from(row.sensor_id),
                    row.temperature,
                    row.wind_speed,
                    row.relative_humidity,
                    row.co2,
                ])?;
            }
        }
        tx.commit()?;

        let total_rows = Self::count_rows(&conn)?;
        drop(conn);

        let change = StoreChange {
            rows_inserted: rows.len(),
            total_rows,
        };
        if self.changes.send(change).is_err() {
            debug!(rows = rows.len(), "no change feed subscribers");
        }

        Ok(rows.len())
    }

    async fn query_rows(&self) -> Result<Vec<SensorRow>, StoreError> {
        let query = format!(
            "SELECT {}, {} FROM {} ORDER BY rowid",
            SENSOR_ID_COLUMN,
            MEASURE_COLUMNS.join(", "),
            SENSOR_TABLE
        );
        debug!(%query, "querying sensor rows");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&query)?;
        let mut rows = stmt.query(params![])?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(SensorRow {
                sensor_id: Self::sensor_id(row.get(0)?)?,
                temperature: row.get(1)?,
                wind_speed: row.get(2)?,
                relative_humidity: row.get(3)?,
                co2: row.get(4)?,
            });
        }

        Ok(result)
    }

    async fn row_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().await;
        Self::count_rows(&conn)
    }

    async fn summarize(&self) -> Result<Vec<SensorAggregate>, StoreError> {
        let query = build_summary_query(SENSOR_TABLE, SENSOR_ID_COLUMN, &MEASURE_COLUMNS);
        debug!(%query, "summarizing sensor rows");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&query)?;
        let mut rows = stmt.query(params![])?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(SensorAggregate {
                sensor_id: Self::sensor_id(row.get(0)?)?,
                temperature: Self::column_aggregate(row, 1)?,
                wind_speed: Self::column_aggregate(row, 5)?,
                relative_humidity: Self::column_aggregate(row, 9)?,
                co2: Self::column_aggregate(row, 13)?,
            });
        }

        Ok(result)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
