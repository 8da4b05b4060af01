//! Mapping between generated readings and persisted rows.
//!
//! Readings and `SensorData` rows carry the same values under different
//! names. The conversions here are pure renames; [`FieldMapping`] is the
//! explicit key table used to decode loosely-typed JSON records of either
//! shape.

use crate::error::WeatherError;
use crate::simulator::Reading;
use sensorstore_core::SensorRow;
use serde_json::Value;

/// Converts a reading into the persisted row shape.
pub fn to_row(reading: &Reading) -> SensorRow {
    SensorRow {
        sensor_id: reading.sensor_id,
        temperature: reading.temperature_c,
        wind_speed: reading.wind_mph,
        relative_humidity: reading.humidity_percent,
        co2: reading.co2_ppm,
    }
}

/// Converts a persisted row back into a reading.
pub fn from_row(row: &SensorRow) -> Reading {
    Reading {
        sensor_id: row.sensor_id,
        temperature_c: row.temperature,
        wind_mph: row.wind_speed,
        humidity_percent: row.relative_humidity,
        co2_ppm: row.co2,
    }
}

impl From<Reading> for SensorRow {
    fn from(reading: Reading) -> Self {
        to_row(&reading)
    }
}

impl From<SensorRow> for Reading {
    fn from(row: SensorRow) -> Self {
        from_row(&row)
    }
}

/// Key names of one record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub sensor_id: &'static str,
    pub temperature: &'static str,
    pub wind_speed: &'static str,
    pub humidity: &'static str,
    pub co2: &'static str,
}

impl FieldMapping {
    /// Keys of a serialized [`Reading`].
    pub const READING: FieldMapping = FieldMapping {
        sensor_id: "sensor_id",
        temperature: "temperature_c",
        wind_speed: "wind_mph",
        humidity: "humidity_percent",
        co2: "co2_ppm",
    };

    /// Keys of a serialized [`SensorRow`], i.e. the `SensorData` columns.
    pub const ROW: FieldMapping = FieldMapping {
        sensor_id: "SensorId",
        temperature: "Temperature",
        wind_speed: "WindSpeed",
        humidity: "RelativeHumidity",
        co2: "CO2",
    };

    /// Decodes one JSON object into a reading using these keys.
    pub fn decode(&self, record: &Value) -> Result<Reading, WeatherError> {
        let sensor_id = self.field(record, self.sensor_id)?;
        let sensor_id = u32::try_from(sensor_id).map_err(|_| {
            WeatherError::MalformedInput(format!("{} must be a non-negative integer", self.sensor_id))
        })?;

        Ok(Reading {
            sensor_id,
            temperature_c: self.measure(record, self.temperature)?,
            wind_mph: self.measure(record, self.wind_speed)?,
            humidity_percent: self.measure(record, self.humidity)?,
            co2_ppm: self.measure(record, self.co2)?,
        })
    }

    fn field(&self, record: &Value, key: &str) -> Result<i64, WeatherError> {
        let value = record
            .get(key)
            .ok_or_else(|| WeatherError::MalformedInput(format!("missing field {}", key)))?;
        value
            .as_i64()
            .ok_or_else(|| WeatherError::MalformedInput(format!("{} must be an integer, got {}", key, value)))
    }

    fn measure(&self, record: &Value, key: &str) -> Result<i32, WeatherError> {
        let value = self.field(record, key)?;
        i32::try_from(value)
            .map_err(|_| WeatherError::MalformedInput(format!("{} is out of range: {}", key, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading() -> Reading {
        Reading {
            sensor_id: 3,
            temperature_c: 9,
            wind_mph: 20,
            humidity_percent: 51,
            co2_ppm: 1200,
        }
    }

    #[test]
    fn test_row_conversion_renames_fields() {
        let row = to_row(&reading());
        assert_eq!(row.sensor_id, 3);
        assert_eq!(row.temperature, 9);
        assert_eq!(row.wind_speed, 20);
        assert_eq!(row.relative_humidity, 51);
        assert_eq!(row.co2, 1200);
        assert_eq!(from_row(&row), reading());
        assert_eq!(Reading::from(SensorRow::from(reading())), reading());
    }

    #[test]
    fn test_mappings_match_serialized_shapes() {
        let as_reading = serde_json::to_value(reading()).unwrap();
        let as_row = serde_json::to_value(to_row(&reading())).unwrap();
        assert_eq!(FieldMapping::READING.decode(&as_reading).unwrap(), reading());
        assert_eq!(FieldMapping::ROW.decode(&as_row).unwrap(), reading());
    }

    #[test]
    fn test_decode_rejects_missing_and_mistyped_fields() {
        let missing = json!({"sensor_id": 1, "temperature_c": 10, "wind_mph": 12, "humidity_percent": 40});
        assert!(matches!(
            FieldMapping::READING.decode(&missing),
            Err(WeatherError::MalformedInput(msg)) if msg.contains("co2_ppm")
        ));

        let mistyped = json!({"SensorId": 1, "Temperature": "warm", "WindSpeed": 12, "RelativeHumidity": 40, "CO2": 500});
        assert!(matches!(
            FieldMapping::ROW.decode(&mistyped),
            Err(WeatherError::MalformedInput(_))
        ));

        let negative = json!({"sensor_id": -1, "temperature_c": 10, "wind_mph": 12, "humidity_percent": 40, "co2_ppm": 500});
        assert!(FieldMapping::READING.decode(&negative).is_err());
    }
}
