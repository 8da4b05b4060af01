//! Leeds weather sensors: simulation, persistence and statistics.
//!
//! This library simulates readings from a fixed set of weather sensors,
//! persists them through `sensorstore_core`, and computes per-sensor
//! min/max/average statistics. Three triggers drive it: HTTP requests, a
//! periodic timer, and the store's change feed.
//!
//! # Example
//!
//! ```rust
//! use leeds_weather::{simulator, stats, WeatherError};
//!
//! let readings = simulator::generate(3)?;
//! let summary = stats::aggregate(&readings)?;
//! assert_eq!(summary.len(), 3);
//!
//! let single = &summary["Sensor_1"].temperature;
//! assert_eq!(single.min, single.max);
//! # Ok::<(), WeatherError>(())
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod simulator;
pub mod sink;
pub mod stats;
pub mod tests;
pub mod triggers;

pub use config::{CliArgs, WeatherSettings};
pub use error::WeatherError;
pub use service::{router, AppContext, SimulationReport};
pub use simulator::{generate, generate_cycles, Reading};
pub use sink::{from_row, to_row, FieldMapping};
pub use stats::{aggregate, SensorStats, SensorSummary, StatBlock};
