use crate::client::RetryPolicy;
use crate::constants::{CURRENCY_CODE_PATTERN, DEFAULT_START_DATE, ECB_BASE_URL, RESUME_LOOKBACK_DAYS};
use crate::errors::{AppError, AppResult};
use crate::models::ResponseFormat;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

static CURRENCY_REGEX: OnceLock<Regex> = OnceLock::new();

/// Tap settings with every optional value filled in.
///
/// Deserialized from one or more Singer config files. Unknown keys are rejected
/// so that typos do not silently fall back to defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TapConfig {
    /// ISO 4217 codes to extract (must be published by the ECB)
    pub currencies: Vec<String>,
    /// First day to request; defaults to 2000-01-01
    pub start_date: Option<NaiveDate>,
    /// Last day to request and fill up to; defaults to today
    pub end_date: Option<NaiveDate>,
    /// SDMX data endpoint for the EXR dataflow
    pub base_url: String,
    /// Wire format requested from the API
    pub response_format: ResponseFormat,
    /// Days re-fetched before the bookmark when resuming from state
    pub lookback_days: u32,
    /// Carry the last known rate over weekends and holidays
    pub fill_missing_dates: bool,

    // Requests
    /// Total attempts per request, including the first one
    pub max_tries: u32,
    /// Stop retrying once this many seconds have elapsed
    pub max_time_secs: u64,
    /// Initial delay in milliseconds before the first retry
    pub retry_initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries
    pub retry_max_delay_ms: u64,
    /// Timeout for a single HTTP request
    pub request_timeout_secs: u64,
    /// Number of currencies fetched in parallel
    pub concurrent_requests: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            currencies: Vec::new(),
            start_date: None,
            end_date: None,
            base_url: ECB_BASE_URL.to_string(),
            response_format: ResponseFormat::default(),
            lookback_days: RESUME_LOOKBACK_DAYS,
            fill_missing_dates: true,
            max_tries: 5,
            max_time_secs: 60,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 10000,
            request_timeout_secs: 30,
            concurrent_requests: 4,
        }
    }
}

impl TapConfig {
    /// Loads, merges and validates one or more config files.
    ///
    /// Files are merged key by key in the given order, so later files override
    /// earlier ones. Files with a `.toml` extension are parsed as TOML, anything
    /// else as JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no path is given, `IoError` if a file cannot be read,
    /// and `ConfigError` if a file is malformed or the merged settings fail validation.
    pub fn from_files(paths: &[PathBuf]) -> AppResult<Self> {
        if paths.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one --config file is required".into(),
            ));
        }

        let mut merged = Map::new();
        for path in paths {
            debug!(path = %path.display(), "Loading config file");
            match read_config_file(path)? {
                Value::Object(map) => merged.extend(map),
                _ => {
                    return Err(AppError::ConfigError(format!(
                        "{} must contain an object at the top level",
                        path.display()
                    )))
                }
            }
        }

        Self::from_value(Value::Object(merged))
    }

    /// Deserializes and validates settings from a JSON value.
    pub fn from_value(value: Value) -> AppResult<Self> {
        let mut config: TapConfig = serde_json::from_value(value)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Normalizes currency codes and checks value ranges.
    fn validate(&mut self) -> AppResult<()> {
        let currency_regex = match CURRENCY_REGEX.get() {
            Some(regex) => regex,
            None => {
                let regex = Regex::new(CURRENCY_CODE_PATTERN)?;
                CURRENCY_REGEX.get_or_init(|| regex)
            }
        };

        let mut currencies: Vec<String> = Vec::with_capacity(self.currencies.len());
        for raw in &self.currencies {
            let code = raw.trim().to_uppercase();
            if !currency_regex.is_match(&code) {
                return Err(AppError::ConfigError(format!(
                    "Currency must be a three letter ISO 4217 code, got: {raw:?}"
                )));
            }
            if !currencies.contains(&code) {
                currencies.push(code);
            }
        }
        if currencies.is_empty() {
            return Err(AppError::ConfigError(
                "currencies is required and must not be empty".into(),
            ));
        }
        self.currencies = currencies;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::ConfigError(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        if self.max_tries == 0 {
            return Err(AppError::ConfigError(
                "max_tries must be greater than 0".into(),
            ));
        }
        if self.concurrent_requests == 0 {
            return Err(AppError::ConfigError(
                "concurrent_requests must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(AppError::ConfigError(
                "retry_initial_delay_ms must not exceed retry_max_delay_ms".into(),
            ));
        }

        Ok(())
    }

    /// First day requested on a fresh sync.
    pub fn effective_start_date(&self) -> NaiveDate {
        self.start_date.unwrap_or_else(default_start_date)
    }

    /// Last day requested; `today` when no `end_date` is configured.
    pub fn effective_end_date(&self, today: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(today)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_tries: self.max_tries,
            max_time: Duration::from_secs(self.max_time_secs),
            initial_delay_ms: self.retry_initial_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}

fn read_config_file(path: &Path) -> AppResult<Value> {
    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::IoError(format!("Failed to read config {}: {e}", path.display()))
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        Ok(toml_to_json(toml::from_str::<toml::Value>(&contents)?))
    } else {
        serde_json::from_str(&contents).map_err(|e| {
            AppError::ConfigError(format!("Failed to parse config {}: {e}", path.display()))
        })
    }
}

/// Converts a TOML document to JSON; TOML dates become their `YYYY-MM-DD` text.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::parse_from_str(DEFAULT_START_DATE, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

/// JSON schema of the accepted settings, reported by `--about`.
pub fn config_schema() -> Value {
    json!({
        "type": "object",
        "required": ["currencies"],
        "properties": {
            "currencies": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Array of currencies in ISO 4217 format (must be supported by ECB)"
            },
            "start_date": {
                "type": "string",
                "format": "date",
                "description": "Date to start from (defaults to 2000-01-01)"
            },
            "end_date": {
                "type": "string",
                "format": "date",
                "description": "End date (defaults to today)"
            },
            "base_url": {
                "type": "string",
                "description": "SDMX data endpoint of the EXR dataflow"
            },
            "response_format": {
                "type": "string",
                "enum": ["jsondata", "structurespecificdata"],
                "description": "Format requested from the API"
            },
            "lookback_days": {
                "type": "integer",
                "description": "Days re-fetched before the bookmark when resuming (defaults to 7)"
            },
            "fill_missing_dates": {
                "type": "boolean",
                "description": "Carry the last known rate over weekends and holidays (defaults to true)"
            },
            "max_tries": {
                "type": "integer",
                "description": "Attempts per request before giving up (defaults to 5)"
            },
            "max_time_secs": {
                "type": "integer",
                "description": "Seconds after which retrying stops (defaults to 60)"
            },
            "retry_initial_delay_ms": {
                "type": "integer",
                "description": "First backoff delay in milliseconds (defaults to 1000)"
            },
            "retry_max_delay_ms": {
                "type": "integer",
                "description": "Backoff delay cap in milliseconds (defaults to 10000)"
            },
            "request_timeout_secs": {
                "type": "integer",
                "description": "Timeout of a single request (defaults to 30)"
            },
            "concurrent_requests": {
                "type": "integer",
                "description": "Currencies fetched in parallel (defaults to 4)"
            }
        }
    })
}
