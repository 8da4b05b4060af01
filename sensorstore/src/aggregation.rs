//! SQL-side aggregation over persisted sensor rows.
//!
//! This module defines the aggregation functions the store can push down to
//! the database and the query builder producing a per-sensor summary of
//! every measured column. The result is a list of [`SensorAggregate`] values,
//! one per sensor, in the order each sensor was first inserted.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Aggregation functions that can be pushed down to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    /// Count the number of values
    Count,
    /// Calculate the average
    Avg,
    /// Find the minimum value
    Min,
    /// Find the maximum value
    Max,
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "COUNT"),
            AggregateFunction::Avg => write!(f, "AVG"),
            AggregateFunction::Min => write!(f, "MIN"),
            AggregateFunction::Max => write!(f, "MAX"),
        }
    }
}

impl AggregateFunction {
    /// Functions computed for every column of a summary, in select order.
    pub const SUMMARY: [AggregateFunction; 4] = [
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Avg,
        AggregateFunction::Count,
    ];

    /// Generates SQL for the aggregation function
    pub fn to_sql(&self, column: &str) -> String {
        format!("{}({})", self, column)
    }
}

/// Summary of one measured column for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnAggregate {
    pub min: i32,
    pub max: i32,
    pub avg: f64,
    pub count: i64,
}

/// Summary of every measured column for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorAggregate {
    pub sensor_id: u32,
    pub temperature: ColumnAggregate,
    pub wind_speed: ColumnAggregate,
    pub relative_humidity: ColumnAggregate,
    pub co2: ColumnAggregate,
}

/// Builds a SQL query summarizing `columns` per value of `group_column`.
///
/// Each column contributes one select expression per entry of
/// [`AggregateFunction::SUMMARY`], so the result row is the group column
/// followed by `columns.len() * 4` values. Groups are ordered by their
/// earliest `rowid`, i.e. by first insertion.
///
/// # Arguments
///
/// * `table_name` - The source table name
/// * `group_column` - The column to group by
/// * `columns` - The columns to summarize
pub fn build_summary_query(table_name: &str, group_column: &str, columns: &[&str]) -> String {
    let mut query = String::new();

    query.push_str("SELECT ");
    query.push_str(group_column);

    for column in columns {
        for function in AggregateFunction::SUMMARY {
            query.push_str(", ");
            query.push_str(&function.to_sql(column));
        }
    }

    query.push_str(&format!(" FROM {}", table_name));
    query.push_str(&format!(" GROUP BY {}", group_column));
    query.push_str(" ORDER BY MIN(rowid)");

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_sql() {
        assert_eq!(AggregateFunction::Avg.to_sql("CO2"), "AVG(CO2)");
        assert_eq!(AggregateFunction::Count.to_string(), "COUNT");
    }

    #[test]
    fn test_summary_query() {
        let query = build_summary_query("SensorData", "SensorId", &["Temperature", "CO2"]);
        assert_eq!(
            query,
            "SELECT SensorId, MIN(Temperature), MAX(Temperature), AVG(Temperature), COUNT(Temperature), \
             MIN(CO2), MAX(CO2), AVG(CO2), COUNT(CO2) FROM SensorData GROUP BY SensorId ORDER BY MIN(rowid)"
        );
    }
}
