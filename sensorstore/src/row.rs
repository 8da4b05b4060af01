use serde::{Deserialize, Serialize};

/// Name of the persisted table holding sensor rows.
pub const SENSOR_TABLE: &str = "SensorData";

/// Column holding the sensor identifier.
pub const SENSOR_ID_COLUMN: &str = "SensorId";

/// Measured columns, in the order they appear in the table.
pub const MEASURE_COLUMNS: [&str; 4] = ["Temperature", "WindSpeed", "RelativeHumidity", "CO2"];

/// A single persisted sensor row.
///
/// Field names on the wire and in the table are the column names of
/// `SensorData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRow {
    #[serde(rename = "SensorId")]
    pub sensor_id: u32,
    #[serde(rename = "Temperature")]
    pub temperature: i32,
    #[serde(rename = "WindSpeed")]
    pub wind_speed: i32,
    #[serde(rename = "RelativeHumidity")]
    pub relative_humidity: i32,
    #[serde(rename = "CO2")]
    pub co2: i32,
}

/// Returns the DDL creating the sensor table.
pub fn create_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {} INTEGER NOT NULL,\n{}\n);",
        SENSOR_TABLE,
        SENSOR_ID_COLUMN,
        MEASURE_COLUMNS
            .iter()
            .map(|c| format!("    {} INTEGER NOT NULL", c))
            .collect::<Vec<_>>()
            .join(",\n")
    )
}

/// Returns the parameterized insert statement for one row.
pub fn insert_sql() -> String {
    format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?, ?, ?, ?)",
        SENSOR_TABLE,
        SENSOR_ID_COLUMN,
        MEASURE_COLUMNS.join(", ")
    )
}
