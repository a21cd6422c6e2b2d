use std::time::Duration;

use config::{Config, File};
use fleet_cluster::ClusterOptions;
use fleet_state::ReconcilePolicy;
use serde::Deserialize;
use snafu::ResultExt;
use strum::{Display, EnumString};

use crate::error::{
    Result,
    error::{ConfigSnafu, InvalidEnvironmentSnafu, MissingEnvironmentSnafu},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Environment {
    Local,
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub log_level: LogLevel,
    pub environment: Environment,
    /// How long decoded events are buffered before they are handed to the store together.
    #[serde(with = "humantime_serde")]
    pub commit_interval: Duration,
    pub channel_capacity: usize,
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
    #[serde(default)]
    pub clustering: ClusterOptions,
    #[serde(default = "default_view_max_zoom")]
    pub view_max_zoom: u8,
}

fn default_view_max_zoom() -> u8 {
    18
}

impl Settings {
    /// Reads `config/<environment>.yml` overlaid with `FLEET_CONSUMER__*` variables, the
    /// environment itself comes from `APP_ENVIRONMENT`.
    pub fn new() -> Result<Settings> {
        let value = std::env::var("APP_ENVIRONMENT").context(MissingEnvironmentSnafu)?;
        let environment: Environment = value
            .parse()
            .context(InvalidEnvironmentSnafu { value: &value })?;

        Config::builder()
            .add_source(
                File::with_name(&format!("config/{}", environment.to_string().to_lowercase()))
                    .required(true),
            )
            .add_source(config::Environment::with_prefix("FLEET_CONSUMER").separator("__"))
            .set_override("environment", environment.to_string())
            .context(ConfigSnafu)?
            .build()
            .context(ConfigSnafu)?
            .try_deserialize()
            .context(ConfigSnafu)
    }
}
