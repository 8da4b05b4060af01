#[cfg(test)]
mod tests {
    use crate::config::WeatherSettings;
    use crate::error::WeatherError;
    use crate::service::{self, AppContext, INTERNAL_ERROR_MESSAGE};
    use crate::triggers::{run_change_once, run_timer_once, spawn_change_watcher};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use mockall::*;
    use sensorstore_core::{ColumnAggregate, SensorAggregate, SensorRow, StorageBackend, StoreChange, StoreError};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{broadcast, oneshot};
    use tokio::time::timeout;
    use tokio_test::{assert_err, assert_ok, block_on};

    mock! {
        pub Store {}
        #[async_trait]
        impl StorageBackend for Store {
            async fn init(&self) -> Result<(), StoreError>;
            async fn insert_rows(&self, rows: Vec<SensorRow>) -> Result<usize, StoreError>;
            async fn query_rows(&self) -> Result<Vec<SensorRow>, StoreError>;
            async fn row_count(&self) -> Result<u64, StoreError>;
            async fn summarize(&self) -> Result<Vec<SensorAggregate>, StoreError>;
            fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
        }
    }

    fn store_failure() -> StoreError {
        StoreError::InvalidValue {
            column: "SensorId",
            value: -7,
        }
    }

    fn context(store: MockStore, settings: WeatherSettings) -> AppContext {
        AppContext::new(settings, Arc::new(store))
    }

    fn sample_row(sensor_id: u32) -> SensorRow {
        SensorRow { sensor_id, temperature: 12, wind_speed: 15, relative_humidity: 45, co2: 900 }
    }

    /// A store whose change feed is driven by the returned sender and whose
    /// single `query_rows` call completes the returned signal.
    fn watched_store(
        capacity: usize,
    ) -> (MockStore, broadcast::Sender<StoreChange>, oneshot::Receiver<()>) {
        let (changes, receiver) = broadcast::channel(capacity);
        let (done_tx, done_rx) = oneshot::channel();

        let mut store = MockStore::new();
        store.expect_subscribe()
            .times(1)
            .return_once(move || receiver);
        store.expect_query_rows()
            .times(1)
            .return_once(move || {
                let _ = done_tx.send(());
                Ok(vec![sample_row(1)])
            });
        (store, changes, done_rx)
    }

    #[tokio::test]
    async fn test_store_failure_is_hidden_behind_500() {
        let mut store = MockStore::new();
        store.expect_query_rows()
            .times(1)
            .return_once(|| Err(store_failure()));

        let ctx = context(store, WeatherSettings::default());
        let err = service::stored_stats(State(ctx)).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text, INTERNAL_ERROR_MESSAGE);
        assert!(!text.contains("SensorId"));
    }

    #[tokio::test]
    async fn test_persisting_simulation_failure() {
        let mut store = MockStore::new();
        store.expect_insert_rows()
            .times(1)
            .return_once(|_| Err(store_failure()));

        let ctx = context(store, WeatherSettings::default());

        let err = service::simulate(State(ctx), Query(HashMap::new())).await.unwrap_err();
        assert!(matches!(err.0, WeatherError::InternalFailure(_)));
    }

    #[tokio::test]
    async fn test_simulation_skips_store_when_not_persisting() {
        let mut store = MockStore::new();
        store.expect_insert_rows().never();

        let mut settings = WeatherSettings::default();
        settings.simulator.persist_on_simulate = false;
        let ctx = context(store, settings);
        let result = service::simulate(State(ctx), Query(HashMap::new())).await;
        assert_ok!(result);
    }

    #[tokio::test]
    async fn test_timer_sends_rows_in_sensor_order() {
        let mut store = MockStore::new();
        store.expect_insert_rows()
            .times(1)
            .withf(|rows| {
                rows.len() == 20
                    && rows.iter().enumerate().all(|(i, r)| r.sensor_id == i as u32 + 1)
            })
            .returning(|rows| Ok(rows.len()));

        let ctx = context(store, WeatherSettings::default());
        assert_eq!(run_timer_once(&ctx).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_timer_propagates_store_errors() {
        let mut store = MockStore::new();
        store.expect_insert_rows()
            .times(1)
            .return_once(|_| Err(store_failure()));

        let ctx = context(store, WeatherSettings::default());
        let result = run_timer_once(&ctx).await;
        assert!(matches!(result, Err(WeatherError::InternalFailure(_))));
    }

    #[tokio::test]
    async fn test_change_uses_pushdown_when_enabled() {
        let column = ColumnAggregate { min: 5, max: 18, avg: 11.5, count: 2 };
        let mut store = MockStore::new();
        store.expect_query_rows().never();
        store.expect_summarize()
            .times(1)
            .return_once(move || {
                Ok(vec![SensorAggregate {
                    sensor_id: 1,
                    temperature: column,
                    wind_speed: column,
                    relative_humidity: column,
                    co2: column,
                }])
            });

        let mut settings = WeatherSettings::default();
        settings.stats.pushdown = true;
        let ctx = context(store, settings);

        let rendered = run_change_once(&ctx).await.unwrap().unwrap();
        assert!(rendered.contains("Sensor_1"));
        assert!(rendered.contains("11.5"));
    }

    #[tokio::test]
    async fn test_change_reads_rows_by_default() {
        let mut store = MockStore::new();
        store.expect_summarize().never();
        store.expect_query_rows()
            .times(1)
            .return_once(|| {
                Ok(vec![
                    SensorRow { sensor_id: 2, temperature: 10, wind_speed: 12, relative_humidity: 30, co2: 400 },
                    SensorRow { sensor_id: 2, temperature: 20, wind_speed: 14, relative_humidity: 40, co2: 600 },
                ])
            });

        let ctx = context(store, WeatherSettings::default());
        let rendered = run_change_once(&ctx).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["Sensor_2"]["temperature"]["average"], 15.0);
        assert_eq!(value["Sensor_2"]["co2"]["max"], 600);
    }

    #[tokio::test]
    async fn test_change_failure_is_reported() {
        let mut store = MockStore::new();
        store.expect_query_rows()
            .times(1)
            .return_once(|| Err(store_failure()));

        let ctx = context(store, WeatherSettings::default());
        assert_err!(run_change_once(&ctx).await);
    }

    #[test]
    fn test_change_on_empty_rows_outside_runtime() {
        let mut store = MockStore::new();
        store.expect_query_rows()
            .times(1)
            .return_once(|| Ok(Vec::new()));

        let ctx = context(store, WeatherSettings::default());
        let logged = assert_ok!(block_on(run_change_once(&ctx)));
        assert_eq!(logged, None);
    }

    #[tokio::test]
    async fn test_watcher_recomputes_stats_on_change() {
        let (store, changes, done) = watched_store(8);
        let handle = spawn_change_watcher(context(store, WeatherSettings::default()));

        changes.send(StoreChange { rows_inserted: 1, total_rows: 1 }).unwrap();
        assert_ok!(assert_ok!(timeout(Duration::from_secs(5), done).await));

        handle.abort();
    }

    #[tokio::test]
    async fn test_watcher_survives_lagging() {
        let (store, changes, done) = watched_store(1);

        // Overflow the one-slot feed before the watcher starts reading.
        changes.send(StoreChange { rows_inserted: 1, total_rows: 1 }).unwrap();
        changes.send(StoreChange { rows_inserted: 1, total_rows: 2 }).unwrap();

        let handle = spawn_change_watcher(context(store, WeatherSettings::default()));
        assert_ok!(assert_ok!(timeout(Duration::from_secs(5), done).await));

        handle.abort();
    }
}
