use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "xray-diagnosis";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATABASE_PATH: &str = "data/xray.sqlite3";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MODEL_PATH: &str = "trained_models/imageclassifier.json";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_SESSION_DAYS: i64 = 14;
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

/// `RUST_LOG` fallback for both binaries.
pub fn default_log_filter() -> &'static str {
    "info,xray_diagnosis=debug"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid { var: &'static str, value: String, expected: &'static str },
}

/// Server settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
    pub session_days: i64,
    pub password_iterations: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_path: DEFAULT_DATABASE_PATH.into(),
            media_root: DEFAULT_MEDIA_ROOT.into(),
            model_path: DEFAULT_MODEL_PATH.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_days: DEFAULT_SESSION_DAYS,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<ServerConfig, ConfigError> {
        ServerConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source; unset or blank values keep
    /// their defaults.
    pub fn from_lookup<F>(get: F) -> Result<ServerConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let mut config = ServerConfig::default();

        if let Some(v) = get("XRAY_BIND_ADDR") {
            config.bind_addr = v;
        }
        if let Some(v) = get("XRAY_DATABASE_PATH") {
            config.database_path = v.into();
        }
        if let Some(v) = get("XRAY_MEDIA_ROOT") {
            config.media_root = v.into();
        }
        if let Some(v) = get("XRAY_MODEL_PATH") {
            config.model_path = v.into();
        }
        if let Some(v) = get("XRAY_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_var("XRAY_MAX_UPLOAD_BYTES", &v, "byte count")?;
        }
        if let Some(v) = get("XRAY_SESSION_DAYS") {
            config.session_days = parse_var("XRAY_SESSION_DAYS", &v, "number of days")?;
            if config.session_days < 1 {
                return Err(ConfigError::Invalid {
                    var: "XRAY_SESSION_DAYS",
                    value: v,
                    expected: "number of days",
                });
            }
        }
        if let Some(v) = get("XRAY_PASSWORD_ITERATIONS") {
            config.password_iterations = parse_var("XRAY_PASSWORD_ITERATIONS", &v, "iteration count")?;
            if config.password_iterations == 0 {
                return Err(ConfigError::Invalid {
                    var: "XRAY_PASSWORD_ITERATIONS",
                    value: v,
                    expected: "iteration count",
                });
            }
        }
        Ok(config)
    }
}

/// Parses one variable, reporting its name on failure.
pub fn parse_var<T: FromStr>(var: &'static str, value: &str, expected: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { var, value: value.to_owned(), expected })
}
