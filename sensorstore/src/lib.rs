/*!
# Sensorstore: persisted rows for the Leeds weather sensors

Sensorstore owns the `SensorData` table that simulated sensor readings are
written to. It is built on DuckDB and offers:

- Append-only, transactional inserts of [`SensorRow`] values
- Reads in insertion order
- SQL-side per-sensor summaries (min, max, average, count)
- A change feed that notifies subscribers after each committed insert

## Usage

```rust,no_run
use sensorstore_core::{open_backend, EngineConfig, SensorRow};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend(&EngineConfig::default())?;
    backend.init().await?;

    let mut changes = backend.subscribe();
    backend
        .insert_rows(vec![SensorRow {
            sensor_id: 1,
            temperature: 11,
            wind_speed: 17,
            relative_humidity: 42,
            co2: 950,
        }])
        .await?;

    let change = changes.recv().await?;
    println!("{} rows stored", change.total_rows);
    Ok(())
}
```
*/

pub mod aggregation;
pub mod config;
pub mod error;
pub mod row;
pub mod storage;

pub use aggregation::{AggregateFunction, ColumnAggregate, SensorAggregate};
pub use config::EngineConfig;
pub use error::StoreError;
pub use row::SensorRow;
pub use storage::{open_backend, StorageBackend, StoreChange};
