//! Timer and store-change triggers.
//!
//! The timer writes one reading per sensor to the store every
//! `timer.interval_secs`. The change watcher recomputes statistics over all
//! persisted rows whenever the store reports a committed insert and writes
//! them to the log.

use crate::error::WeatherError;
use crate::service::{compute_stored_stats, AppContext};
use crate::simulator;
use crate::sink::to_row;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

/// Runs one timer invocation, returning the number of rows written.
pub async fn run_timer_once(ctx: &AppContext) -> Result<usize, WeatherError> {
    let sensor_count = ctx.settings.simulator.default_sensor_count;
    let readings = simulator::generate(sensor_count as i64)?;
    let rows = readings.iter().map(to_row).collect();
    let written = ctx.store.insert_rows(rows).await?;
    info!(rows = written, "timer inserted rows into SensorData");
    Ok(written)
}

/// Runs one change-feed invocation, returning the logged statistics as JSON.
///
/// An empty store yields `Ok(None)`.
pub async fn run_change_once(ctx: &AppContext) -> Result<Option<String>, WeatherError> {
    match compute_stored_stats(ctx).await {
        Ok(stats) => {
            let rendered = serde_json::to_string(&stats)
                .map_err(|e| WeatherError::InternalFailure(e.to_string()))?;
            info!(sensors = stats.len(), stats = %rendered, "statistics after store change");
            Ok(Some(rendered))
        }
        Err(WeatherError::NoData) => {
            info!("store changed but holds no readings");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Spawns the periodic generation timer.
///
/// The first tick fires one full period after start.
pub fn spawn_timer(ctx: AppContext) -> JoinHandle<()> {
    let period = Duration::from_secs(ctx.settings.timer.interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = run_timer_once(&ctx).await {
                error!(error = %e, "timer invocation failed");
            }
        }
    })
}

/// Spawns the store-change watcher.
///
/// The subscription is taken before the task starts, so no insert committed
/// after this call returns is missed. The task runs until it is aborted.
pub fn spawn_change_watcher(ctx: AppContext) -> JoinHandle<()> {
    let mut changes = BroadcastStream::new(ctx.store.subscribe());
    tokio::spawn(async move {
        while let Some(change) = changes.next().await {
            match change {
                Ok(change) => {
                    info!(
                        rows_inserted = change.rows_inserted,
                        total_rows = change.total_rows,
                        "store change received"
                    );
                    if let Err(e) = run_change_once(&ctx).await {
                        error!(error = %e, "change invocation failed");
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "change watcher lagged behind the store");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherSettings;
    use sensorstore_core::storage::duckdb::DuckDbBackend;
    use sensorstore_core::StorageBackend;
    use std::sync::Arc;

    async fn context() -> AppContext {
        let store = DuckDbBackend::new_in_memory().unwrap();
        store.init().await.unwrap();
        AppContext::new(WeatherSettings::default(), Arc::new(store))
    }

    #[tokio::test]
    async fn test_timer_writes_one_row_per_sensor() {
        let ctx = context().await;
        assert_eq!(run_timer_once(&ctx).await.unwrap(), 20);
        assert_eq!(run_timer_once(&ctx).await.unwrap(), 20);

        let rows = ctx.store.query_rows().await.unwrap();
        assert_eq!(rows.len(), 40);
        let ids: Vec<u32> = rows.iter().map(|r| r.sensor_id).collect();
        let expected: Vec<u32> = (1..=20).chain(1..=20).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_change_on_empty_store() {
        let ctx = context().await;
        assert_eq!(run_change_once(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_change_logs_stats_for_every_sensor() {
        let ctx = context().await;
        run_timer_once(&ctx).await.unwrap();
        let rendered = run_change_once(&ctx).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 20);
        assert!(value["Sensor_20"]["co2"]["average"].is_number());
    }
}
