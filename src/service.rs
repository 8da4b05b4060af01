//! HTTP trigger handlers.
//!
//! - `GET /api/LeedsWeatherSimulator` simulates readings
//! - `POST /api/LeedsWeatherStats` computes statistics over readings in the body
//! - `GET /api/LeedsWeatherStats` computes statistics over persisted rows
//! - `GET /health` liveness check
//!
//! Every handler receives the same [`AppContext`], built once at startup.

use crate::config::WeatherSettings;
use crate::error::WeatherError;
use crate::simulator::{self, parse_count, Reading};
use crate::sink::{to_row, FieldMapping};
use crate::stats::{self, SensorStats};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use sensorstore_core::StorageBackend;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Generic message returned for internal failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred while processing sensor data.";

/// Shared state handed to every trigger handler.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<WeatherSettings>,
    pub store: Arc<dyn StorageBackend>,
}

impl AppContext {
    pub fn new(settings: WeatherSettings, store: Arc<dyn StorageBackend>) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
        }
    }
}

/// Response body of the simulation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub timestamp_utc: String,
    pub city: String,
    pub sensor_count: u32,
    pub time_ms: f64,
    pub readings: Vec<Reading>,
}

/// Failure of one HTTP invocation.
#[derive(Debug)]
pub struct ApiError(pub WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            WeatherError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            WeatherError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            WeatherError::NoData => (StatusCode::BAD_REQUEST, "No readings found.").into_response(),
            WeatherError::InternalFailure(detail) => {
                error!(%detail, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
            }
        }
    }
}

fn invalid_parameter(name: &str) -> WeatherError {
    WeatherError::InvalidArgument(format!(
        "Invalid '{}' parameter. Please provide a positive integer.",
        name
    ))
}

/// Builds the router with every HTTP trigger.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/LeedsWeatherSimulator", get(simulate))
        .route("/api/LeedsWeatherStats", get(stored_stats).post(posted_stats))
        .route("/health", get(health))
        .with_state(ctx)
}

async fn health() -> &'static str {
    "ok"
}

/// Simulates readings.
///
/// `count` selects the number of sensors and `number_of_records` the number
/// of readings per sensor.
pub async fn simulate(
    State(ctx): State<AppContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SimulationReport>, ApiError> {
    info!("simulation triggered");
    let sim = &ctx.settings.simulator;

    let sensor_count = parse_count(params.get("count").map(String::as_str), sim.default_sensor_count)
        .map_err(|_| invalid_parameter("count"))?;
    let cycles = parse_count(params.get("number_of_records").map(String::as_str), 1)
        .map_err(|_| invalid_parameter("number_of_records"))?;

    let total = sensor_count as u64 * cycles as u64;
    if total > sim.max_readings {
        return Err(WeatherError::InvalidArgument(format!(
            "Requested {} readings; at most {} are allowed.",
            total, sim.max_readings
        ))
        .into());
    }

    let start = Instant::now();
    let readings = simulator::generate_cycles(sensor_count as i64, cycles as i64)
        .map_err(|e| WeatherError::InternalFailure(e.to_string()))?;
    let time_ms = (start.elapsed().as_secs_f64() * 1000.0 * 1000.0).round() / 1000.0;

    if sim.persist_on_simulate {
        let rows = readings.iter().map(to_row).collect();
        let written = ctx.store.insert_rows(rows).await.map_err(WeatherError::from)?;
        info!(rows = written, "simulated readings persisted");
    }

    info!(sensor_count, readings = readings.len(), time_ms, "simulation complete");

    Ok(Json(SimulationReport {
        timestamp_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        city: sim.city.clone(),
        sensor_count,
        time_ms,
        readings,
    }))
}

/// Computes statistics over the readings in the request body.
///
/// The body is `{"readings": [...]}`. Records use the reading field names,
/// or the `SensorData` column names when `shape=row` is given.
pub async fn posted_stats(
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<SensorStats>, ApiError> {
    info!("statistics triggered");

    let mapping = match params.get("shape").map(String::as_str) {
        None | Some("reading") => FieldMapping::READING,
        Some("row") => FieldMapping::ROW,
        Some(other) => {
            return Err(WeatherError::InvalidArgument(format!(
                "Invalid 'shape' parameter {:?}. Expected \"reading\" or \"row\".",
                other
            ))
            .into())
        }
    };

    let data: Value = serde_json::from_slice(&body)
        .map_err(|_| WeatherError::MalformedInput("Invalid JSON.".to_string()))?;

    let readings = match data.get("readings") {
        Some(Value::Array(readings)) if !readings.is_empty() => readings,
        _ => return Err(WeatherError::NoData.into()),
    };

    let stats = stats::aggregate_json(readings, &mapping)?;
    info!(sensors = stats.len(), records = readings.len(), "statistics computed");
    Ok(Json(stats))
}

/// Computes statistics over every persisted row.
///
/// An empty store is reported with 200 and an informative message.
pub async fn stored_stats(State(ctx): State<AppContext>) -> Result<Response, ApiError> {
    info!("stored statistics triggered");

    match compute_stored_stats(&ctx).await {
        Ok(stats) => Ok(Json(stats).into_response()),
        Err(WeatherError::NoData) => {
            info!("no persisted readings");
            Ok(Json(json!({ "message": "No readings found in SensorData." })).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Statistics over persisted rows, honouring `stats.pushdown`.
pub async fn compute_stored_stats(ctx: &AppContext) -> Result<SensorStats, WeatherError> {
    if ctx.settings.stats.pushdown {
        let summaries = ctx.store.summarize().await?;
        stats::from_store_summaries(&summaries)
    } else {
        let rows = ctx.store.query_rows().await?;
        stats::aggregate(&rows)
    }
}
