//! Leeds weather server binary.
//!
//! Starts the HTTP triggers, the periodic generation timer and the
//! store-change watcher around one shared [`AppContext`].
//!
//! # Configuration
//!
//! Configuration can be provided through multiple sources, in order of precedence:
//!
//! 1. Command-line arguments (highest precedence)
//! 2. Environment variables (prefixed with `LEEDS_WEATHER_`, `__` between sections and keys)
//! 3. User-specified configuration file (via `--config`)
//! 4. System-wide configuration (`/etc/leeds-weather/config.toml`)
//! 5. Default configuration (embedded in binary)
//!
//! ```text
//! Options:
//!   -c, --config <FILE>               Path to configuration file
//!       --host <HOST>                 Server host address
//!       --port <PORT>                 Server port
//!       --engine-connection <STR>     Store connection (":memory:" or file path)
//!       --engine-options <KEY=VAL>    Store options (threads, read_only)
//!       --timer-interval <SECS>       Seconds between timer generations
//!       --disable-timer               Do not start the generation timer
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Run with an on-disk store and a one-minute timer
//! leeds-weather --engine-connection sensor_data.duckdb --timer-interval 60
//!
//! # Compute statistics inside the store
//! LEEDS_WEATHER_STATS__PUSHDOWN=true leeds-weather
//! ```

use clap::Parser;
use leeds_weather::{
    config::{CliArgs, WeatherSettings},
    service::{router, AppContext},
    triggers::{spawn_change_watcher, spawn_timer},
};
use sensorstore_core::open_backend;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli_args = CliArgs::parse();

    // Load settings from config files, environment and CLI args
    let settings = WeatherSettings::new(&cli_args)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create and initialize the store
    let store = open_backend(&settings.engine)?;
    store.init().await?;
    info!(
        engine = %settings.engine.engine,
        connection = %settings.engine.connection,
        rows = store.row_count().await?,
        "store ready"
    );

    let ctx = AppContext::new(settings, store);

    let watcher = if ctx.settings.change_feed.enabled {
        Some(spawn_change_watcher(ctx.clone()))
    } else {
        None
    };
    let timer = if ctx.settings.timer.enabled {
        info!(interval_secs = ctx.settings.timer.interval_secs, "generation timer started");
        Some(spawn_timer(ctx.clone()))
    } else {
        None
    };

    let addr = ctx.settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    for handle in [timer, watcher].into_iter().flatten() {
        handle.abort();
    }
    info!("server stopped");

    Ok(())
}
