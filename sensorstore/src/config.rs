//! Storage engine configuration.
//!
//! The engine section is usually embedded in a larger settings file:
//!
//! ```toml
//! [engine]
//! engine = "duckdb"          # Only "duckdb" is supported
//! connection = ":memory:"    # ":memory:" or a database file path
//! options = { threads = "2", read_only = "false" }
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Engine configuration.
///
/// Specifies the storage engine holding the `SensorData` table.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Engine type ("duckdb")
    pub engine: String,
    /// Connection string for the engine
    pub connection: String,
    /// Engine-specific options
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: "duckdb".to_string(),
            connection: ":memory:".to_string(),
            options: HashMap::new(),
        }
    }
}
