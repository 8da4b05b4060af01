//! Configuration management for the weather service.
//!
//! Settings are layered from these sources, later ones overriding earlier:
//! 1. Default configuration (embedded in binary)
//! 2. System-wide configuration file (`/etc/leeds-weather/config.toml`)
//! 3. User-specified configuration file (`--config`)
//! 4. Environment variables (prefixed with `LEEDS_WEATHER_`, nested keys
//!    separated by `__`, e.g. `LEEDS_WEATHER_SERVER__PORT=8080`)
//! 5. Command-line arguments

use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat};
use sensorstore_core::EngineConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
const DEFAULT_CONFIG_PATH: &str = "/etc/leeds-weather/config.toml";
const ENV_PREFIX: &str = "LEEDS_WEATHER";

/// Command-line arguments parser.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage engine connection string (":memory:" or a file path)
    #[arg(long)]
    pub engine_connection: Option<String>,

    /// Storage engine options (key=value pairs)
    #[arg(long)]
    pub engine_options: Option<Vec<String>>,

    /// Seconds between timer-triggered generations
    #[arg(long)]
    pub timer_interval: Option<u64>,

    /// Disable the periodic generation timer
    #[arg(long)]
    pub disable_timer: bool,
}

/// Complete service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSettings {
    pub server: ServerConfig,
    pub simulator: SimulatorConfig,
    pub timer: TimerConfig,
    pub change_feed: ChangeFeedConfig,
    pub stats: StatsConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Network interface and port of the HTTP service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Reading generator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// City reported in simulation responses
    pub city: String,
    /// Sensor count used when a request does not name one
    pub default_sensor_count: u32,
    /// Upper bound on readings produced by one request
    pub max_readings: u64,
    /// Also write readings produced over HTTP to the store
    pub persist_on_simulate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeFeedConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Compute persisted-row statistics inside the store
    #[serde(default)]
    pub pushdown: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    pub filter: String,
}

fn parse_options(options: &[String]) -> HashMap<String, String> {
    options
        .iter()
        .filter_map(|opt| {
            let (key, value) = opt.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

impl WeatherSettings {
    /// Loads configuration from all available sources.
    pub fn new(cli: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if Path::new(DEFAULT_CONFIG_PATH).is_file() {
            builder = builder.add_source(File::from(PathBuf::from(DEFAULT_CONFIG_PATH)));
        }

        if let Some(ref config_path) = cli.config {
            builder = builder.add_source(File::from(config_path.clone()));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        if let Some(ref host) = cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(ref connection) = cli.engine_connection {
            builder = builder.set_override("engine.connection", connection.as_str())?;
        }
        if let Some(ref options) = cli.engine_options {
            builder = builder.set_override("engine.options", parse_options(options))?;
        }
        if let Some(interval) = cli.timer_interval {
            builder = builder.set_override("timer.interval_secs", interval)?;
        }
        if cli.disable_timer {
            builder = builder.set_override("timer.enabled", false)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 7071,
            },
            simulator: SimulatorConfig {
                city: "Leeds".to_string(),
                default_sensor_count: 20,
                max_readings: 100_000,
                persist_on_simulate: true,
            },
            timer: TimerConfig {
                enabled: true,
                interval_secs: 300,
            },
            change_feed: ChangeFeedConfig { enabled: true },
            stats: StatsConfig { pushdown: false },
            engine: EngineConfig::default(),
            logging: LoggingConfig {
                filter: "info".to_string(),
            },
        }
    }
}
