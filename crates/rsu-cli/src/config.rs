//! Configuration – reads `~/.rsu/config.toml`.
//!
//! Every field has a default taken from the reference roadside deployment, so
//! a missing file or a partial file is fine.  `RSU_*` environment variables
//! override the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rsu_middleware::MqttSettings;
use rsu_runtime::Timing;
use rsu_signal::{HeadLines, IntersectionLayout};
use rsu_types::RsuError;
use serde::{Deserialize, Serialize};

/// Which event sources feed the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Mqtt,
    Manual,
    Both,
}

impl EventSource {
    pub fn uses_mqtt(self) -> bool {
        matches!(self, EventSource::Mqtt | EventSource::Both)
    }

    pub fn uses_manual(self) -> bool {
        matches!(self, EventSource::Manual | EventSource::Both)
    }
}

impl FromStr for EventSource {
    type Err = RsuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mqtt" => Ok(EventSource::Mqtt),
            "manual" => Ok(EventSource::Manual),
            "both" => Ok(EventSource::Both),
            other => Err(RsuError::Config(format!("unknown event source `{other}`"))),
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Mqtt => write!(f, "mqtt"),
            EventSource::Manual => write!(f, "manual"),
            EventSource::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
        }
    }
}

/// Settings stored in `~/.rsu/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_broker")]
    pub mqtt_broker: String,

    #[serde(default = "default_port")]
    pub mqtt_port: u16,

    #[serde(default = "default_client_id")]
    pub mqtt_client_id: String,

    #[serde(default = "default_keep_alive")]
    pub mqtt_keep_alive_secs: u64,

    /// Topic the dispatch system publishes this intersection's events on.
    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default)]
    pub source: EventSource,

    /// Yellow dwell, in seconds.
    #[serde(default = "default_dwell")]
    pub dwell_secs: f64,

    /// Pause before returning to default after `passed`, in seconds.
    #[serde(default = "default_settle")]
    pub settle_secs: f64,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default = "default_head1")]
    pub head1: HeadLines,

    #[serde(default = "default_head2")]
    pub head2: HeadLines,
}

fn default_broker() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "rsu-crossroad-1552".to_string()
}
fn default_keep_alive() -> u64 {
    60
}
fn default_topic() -> String {
    "ambulance/web/crossroad/1552".to_string()
}
fn default_dwell() -> f64 {
    1.0
}
fn default_settle() -> f64 {
    0.2
}
fn default_columns() -> usize {
    16
}
fn default_rows() -> usize {
    2
}
fn default_head1() -> HeadLines {
    IntersectionLayout::default().head1
}
fn default_head2() -> HeadLines {
    IntersectionLayout::default().head2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_broker: default_broker(),
            mqtt_port: default_port(),
            mqtt_client_id: default_client_id(),
            mqtt_keep_alive_secs: default_keep_alive(),
            topic: default_topic(),
            source: EventSource::default(),
            dwell_secs: default_dwell(),
            settle_secs: default_settle(),
            display: DisplayConfig::default(),
            head1: default_head1(),
            head2: default_head2(),
        }
    }
}

impl Config {
    /// Reject settings the controller cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`RsuError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), RsuError> {
        delay("dwell_secs", self.dwell_secs)?;
        delay("settle_secs", self.settle_secs)?;
        if self.display.columns < 1 || self.display.rows < 2 {
            return Err(RsuError::Config(format!(
                "display must be at least 1x2, got {}x{}",
                self.display.columns, self.display.rows
            )));
        }
        if self.topic.trim().is_empty() {
            return Err(RsuError::Config("topic must not be empty".to_string()));
        }
        if self.mqtt_keep_alive_secs == 0 {
            return Err(RsuError::Config(
                "mqtt_keep_alive_secs must be positive".to_string(),
            ));
        }
        self.layout().validate()
    }

    pub fn layout(&self) -> IntersectionLayout {
        IntersectionLayout {
            head1: self.head1,
            head2: self.head2,
        }
    }

    /// # Errors
    ///
    /// Returns [`RsuError::Config`] for delays that are not valid durations.
    pub fn timing(&self) -> Result<Timing, RsuError> {
        Ok(Timing {
            dwell: delay("dwell_secs", self.dwell_secs)?,
            settle: delay("settle_secs", self.settle_secs)?,
        })
    }

    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings {
            broker: self.mqtt_broker.clone(),
            port: self.mqtt_port,
            client_id: self.mqtt_client_id.clone(),
            keep_alive: Duration::from_secs(self.mqtt_keep_alive_secs),
            ..MqttSettings::default()
        }
    }
}

fn delay(field: &str, secs: f64) -> Result<Duration, RsuError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| RsuError::Config(format!("{field} must be a finite, non-negative number, got {secs}")))
}

/// `RSU_CONFIG` if set, otherwise `~/.rsu/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("RSU_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".rsu").join("config.toml")
}

/// Load the config file (or defaults when it is absent), then apply
/// environment overrides.
///
/// # Errors
///
/// Returns [`RsuError::Config`] when the file exists but cannot be read or
/// parsed.
pub fn load() -> Result<Config, RsuError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Parse the config at `path`.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, RsuError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        RsuError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| RsuError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `RSU_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `RSU_MQTT_BROKER` | `mqtt_broker` |
/// | `RSU_MQTT_PORT` | `mqtt_port` |
/// | `RSU_TOPIC` | `topic` |
/// | `RSU_SOURCE` | `source` |
/// | `RSU_DWELL_SECS` | `dwell_secs` |
/// | `RSU_SETTLE_SECS` | `settle_secs` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("RSU_MQTT_BROKER") {
        cfg.mqtt_broker = v;
    }
    if let Ok(v) = std::env::var("RSU_MQTT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.mqtt_port = port;
    }
    if let Ok(v) = std::env::var("RSU_TOPIC") {
        cfg.topic = v;
    }
    if let Ok(v) = std::env::var("RSU_SOURCE")
        && let Ok(source) = v.parse::<EventSource>()
    {
        cfg.source = source;
    }
    if let Ok(v) = std::env::var("RSU_DWELL_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        cfg.dwell_secs = secs;
    }
    if let Ok(v) = std::env::var("RSU_SETTLE_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        cfg.settle_secs = secs;
    }
}
