//! Simulated weather sensor readings.
//!
//! Every reading draws its four measurements independently and uniformly from
//! fixed inclusive ranges. Sensors are numbered densely from 1.

use crate::error::WeatherError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Temperature range in °C.
pub const TEMPERATURE_RANGE: RangeInclusive<i32> = 5..=18;
/// Wind speed range in mph.
pub const WIND_RANGE: RangeInclusive<i32> = 12..=24;
/// Relative humidity range in %.
pub const HUMIDITY_RANGE: RangeInclusive<i32> = 30..=60;
/// CO2 concentration range in ppm.
pub const CO2_RANGE: RangeInclusive<i32> = 400..=1600;

/// One simulated observation from one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: u32,
    pub temperature_c: i32,
    pub wind_mph: i32,
    pub humidity_percent: i32,
    pub co2_ppm: i32,
}

impl Reading {
    /// Draws a fresh reading for `sensor_id`.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, sensor_id: u32) -> Self {
        Self {
            sensor_id,
            temperature_c: rng.random_range(TEMPERATURE_RANGE),
            wind_mph: rng.random_range(WIND_RANGE),
            humidity_percent: rng.random_range(HUMIDITY_RANGE),
            co2_ppm: rng.random_range(CO2_RANGE),
        }
    }
}

/// Generates one reading per sensor, ids `1..=sensor_count` ascending.
pub fn generate(sensor_count: i64) -> Result<Vec<Reading>, WeatherError> {
    generate_cycles(sensor_count, 1)
}

/// Generates `cycles` readings per sensor.
///
/// Cycles form the outer loop and sensors the inner one, so the output runs
/// `1..=N` once per cycle. Persisted row order depends on this interleaving.
pub fn generate_cycles(sensor_count: i64, cycles: i64) -> Result<Vec<Reading>, WeatherError> {
    generate_with(&mut rand::rng(), sensor_count, cycles)
}

/// Same as [`generate_cycles`], drawing from the given random source.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    sensor_count: i64,
    cycles: i64,
) -> Result<Vec<Reading>, WeatherError> {
    let sensor_count = positive("sensor_count", sensor_count)?;
    let cycles = positive("cycles", cycles)?;

    let mut readings = Vec::with_capacity(capacity_hint(sensor_count, cycles));
    for _ in 0..cycles {
        for sensor_id in 1..=sensor_count {
            readings.push(Reading::sample(rng, sensor_id));
        }
    }
    Ok(readings)
}

/// Readings reserved up front; larger requests grow the vector as they fill.
const MAX_RESERVED_READINGS: usize = 1 << 16;

fn capacity_hint(sensor_count: u32, cycles: u32) -> usize {
    (sensor_count as usize)
        .saturating_mul(cycles as usize)
        .min(MAX_RESERVED_READINGS)
}

fn positive(name: &str, value: i64) -> Result<u32, WeatherError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            WeatherError::InvalidArgument(format!("{} must be a positive integer, got {}", name, value))
        })
}

/// Parses a count query parameter.
///
/// An absent or empty value yields `default`. Anything else must be a string
/// of ASCII digits denoting a positive number.
pub fn parse_count(raw: Option<&str>, default: u32) -> Result<u32, WeatherError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(default),
    };

    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(WeatherError::InvalidArgument(format!("{:?} is not a positive integer", raw)));
    }

    raw.parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| WeatherError::InvalidArgument(format!("{:?} is not a positive integer", raw)))
}
