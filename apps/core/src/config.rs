use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::models::DEFAULT_CATEGORY;
use crate::telemetry::LogFormat;

const DEFAULT_RATE_LIMIT: usize = 60;
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// JSON array of website records to serve (`SITECHAT_DATA_FILE`).
    pub data_file: Option<PathBuf>,
    /// Log output format (`SITECHAT_LOG_FORMAT`).
    pub log_format: LogFormat,
    /// Run the personality pass even without per-request overrides (`SITECHAT_PERSONALITY`).
    pub personality_enabled: bool,
    /// Category used for websites that have none (`SITECHAT_DEFAULT_CATEGORY`).
    pub default_category: String,
    /// Chat requests allowed per API key per minute, 0 disables (`SITECHAT_RATE_LIMIT`).
    pub rate_limit: usize,
    pub rate_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            log_format: LogFormat::Text,
            personality_enabled: false,
            default_category: DEFAULT_CATEGORY.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: RATE_WINDOW,
        }
    }
}

impl AppConfig {
    /// Load configuration, reading a `.env` file first when one exists.
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        Ok(Self {
            data_file: var("SITECHAT_DATA_FILE").map(PathBuf::from),
            log_format: match var("SITECHAT_LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => defaults.log_format,
            },
            personality_enabled: match var("SITECHAT_PERSONALITY") {
                Some(v) => parse_bool("SITECHAT_PERSONALITY", &v)?,
                None => defaults.personality_enabled,
            },
            default_category: var("SITECHAT_DEFAULT_CATEGORY").unwrap_or(defaults.default_category),
            rate_limit: match var("SITECHAT_RATE_LIMIT") {
                Some(v) => v.parse().map_err(|_| {
                    AppError::Config(format!("SITECHAT_RATE_LIMIT must be a number, got '{}'", v))
                })?,
                None => defaults.rate_limit,
            },
            rate_window: defaults.rate_window,
        })
    }
}

/// Trimmed value, treating blank as unset.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}
