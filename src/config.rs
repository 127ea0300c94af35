//! Application-level configuration loading for timeouts and collaborators.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DARTCLUB_BACK_CONFIG_PATH";

const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 15;
const DEFAULT_HEARTBEAT_TIMEOUT_SECS: u64 = 45;
const DEFAULT_IDENTIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Interval between server-initiated pings on live connections.
    pub heartbeat_interval: Duration,
    /// Silence window after which an unresponsive connection is dropped.
    pub heartbeat_timeout: Duration,
    /// How long a fresh connection gets to send its `identify` message.
    pub identify_timeout: Duration,
    /// Endpoint the HTTP finalization sink posts completed matches to.
    pub finalizer_url: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to
    /// built-in defaults on any read or parse failure.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            heartbeat_timeout: Duration::from_secs(DEFAULT_HEARTBEAT_TIMEOUT_SECS),
            identify_timeout: Duration::from_secs(DEFAULT_IDENTIFY_TIMEOUT_SECS),
            finalizer_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file.
struct RawConfig {
    heartbeat_interval_secs: Option<u64>,
    heartbeat_timeout_secs: Option<u64>,
    identify_timeout_secs: Option<u64>,
    finalizer_url: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            heartbeat_interval: raw
                .heartbeat_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_interval),
            heartbeat_timeout: raw
                .heartbeat_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_timeout),
            identify_timeout: raw
                .identify_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.identify_timeout),
            finalizer_url: raw.finalizer_url,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
