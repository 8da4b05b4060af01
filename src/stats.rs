//! Per-sensor descriptive statistics.
//!
//! Records are grouped by sensor id in a single pass; each group keeps a
//! running sum, count, minimum and maximum for every measured field. Averages
//! are rounded to two decimal places, halves away from zero.
//!
//! The aggregator works over anything implementing [`Observation`], so
//! freshly generated readings and rows read back from the store produce the
//! same statistics.

use crate::error::WeatherError;
use crate::simulator::Reading;
use crate::sink::FieldMapping;
use indexmap::IndexMap;
use sensorstore_core::{ColumnAggregate, SensorAggregate, SensorRow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of the sensor labels keying [`SensorStats`].
pub const SENSOR_LABEL_PREFIX: &str = "Sensor_";

/// Typed access to the values the aggregator reads.
pub trait Observation {
    fn sensor_id(&self) -> u32;
    fn temperature(&self) -> i32;
    fn wind_speed(&self) -> i32;
    fn humidity(&self) -> i32;
    fn co2(&self) -> i32;
}

impl Observation for Reading {
    fn sensor_id(&self) -> u32 {
        self.sensor_id
    }
    fn temperature(&self) -> i32 {
        self.temperature_c
    }
    fn wind_speed(&self) -> i32 {
        self.wind_mph
    }
    fn humidity(&self) -> i32 {
        self.humidity_percent
    }
    fn co2(&self) -> i32 {
        self.co2_ppm
    }
}

impl Observation for SensorRow {
    fn sensor_id(&self) -> u32 {
        self.sensor_id
    }
    fn temperature(&self) -> i32 {
        self.temperature
    }
    fn wind_speed(&self) -> i32 {
        self.wind_speed
    }
    fn humidity(&self) -> i32 {
        self.relative_humidity
    }
    fn co2(&self) -> i32 {
        self.co2
    }
}

/// Min, max and rounded average of one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub min: i32,
    pub max: i32,
    pub average: f64,
}

/// Statistics of every measured field for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub temperature: StatBlock,
    pub wind_speed: StatBlock,
    pub humidity: StatBlock,
    pub co2: StatBlock,
}

/// Sensor label to summary, in order of first occurrence.
pub type SensorStats = IndexMap<String, SensorSummary>;

/// Label under which a sensor's summary is reported.
pub fn sensor_label(sensor_id: u32) -> String {
    format!("{}{}", SENSOR_LABEL_PREFIX, sensor_id)
}

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Running state for one field of one sensor.
#[derive(Debug, Clone, Copy)]
struct FieldAggregation {
    running_sum: i64,
    running_count: i64,
    min_value: i32,
    max_value: i32,
}

impl FieldAggregation {
    fn new(value: i32) -> Self {
        Self {
            running_sum: value as i64,
            running_count: 1,
            min_value: value,
            max_value: value,
        }
    }

    fn update(&mut self, value: i32) {
        self.running_sum += value as i64;
        self.running_count += 1;
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);
    }

    fn finish(&self) -> StatBlock {
        StatBlock {
            min: self.min_value,
            max: self.max_value,
            average: round2(self.running_sum as f64 / self.running_count as f64),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SensorAggregation([FieldAggregation; 4]);

impl SensorAggregation {
    fn values<T: Observation>(record: &T) -> [i32; 4] {
        [record.temperature(), record.wind_speed(), record.humidity(), record.co2()]
    }

    fn new<T: Observation>(record: &T) -> Self {
        Self(Self::values(record).map(FieldAggregation::new))
    }

    fn update<T: Observation>(&mut self, record: &T) {
        for (field, value) in self.0.iter_mut().zip(Self::values(record)) {
            field.update(value);
        }
    }

    fn finish(&self) -> SensorSummary {
        let [temperature, wind_speed, humidity, co2] = self.0.map(|f| f.finish());
        SensorSummary {
            temperature,
            wind_speed,
            humidity,
            co2,
        }
    }
}

/// Computes per-sensor statistics over `records`.
///
/// Fails with [`WeatherError::NoData`] when `records` is empty.
pub fn aggregate<T: Observation>(records: &[T]) -> Result<SensorStats, WeatherError> {
    if records.is_empty() {
        return Err(WeatherError::NoData);
    }

    let mut groups: IndexMap<u32, SensorAggregation> = IndexMap::new();
    for record in records {
        groups
            .entry(record.sensor_id())
            .and_modify(|agg| agg.update(record))
            .or_insert_with(|| SensorAggregation::new(record));
    }

    Ok(groups
        .into_iter()
        .map(|(sensor_id, agg)| (sensor_label(sensor_id), agg.finish()))
        .collect())
}

/// Decodes loosely-typed records with `mapping` and aggregates them.
pub fn aggregate_json(records: &[Value], mapping: &FieldMapping) -> Result<SensorStats, WeatherError> {
    let readings = records
        .iter()
        .map(|record| mapping.decode(record))
        .collect::<Result<Vec<_>, _>>()?;
    aggregate(&readings)
}

fn from_column(column: &ColumnAggregate) -> StatBlock {
    StatBlock {
        min: column.min,
        max: column.max,
        average: round2(column.avg),
    }
}

/// Converts summaries computed inside the store into [`SensorStats`].
pub fn from_store_summaries(summaries: &[SensorAggregate]) -> Result<SensorStats, WeatherError> {
    if summaries.is_empty() {
        return Err(WeatherError::NoData);
    }

    Ok(summaries
        .iter()
        .map(|s| {
            (
                sensor_label(s.sensor_id),
                SensorSummary {
                    temperature: from_column(&s.temperature),
                    wind_speed: from_column(&s.wind_speed),
                    humidity: from_column(&s.relative_humidity),
                    co2: from_column(&s.co2),
                },
            )
        })
        .collect())
}
