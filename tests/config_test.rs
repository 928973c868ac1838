//! Tests for config module

use tap_ecbexchangerates::config::TapConfig;
use tap_ecbexchangerates::models::ResponseFormat;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");

    let config_content = r#"
{
    "currencies": ["USD", "gbp", "JPY"],
    "start_date": "2023-01-01",
    "end_date": "2023-12-31",
    "max_tries": 3,
    "concurrent_requests": 2,
    "response_format": "structurespecificdata"
}
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = TapConfig::from_files(&[config_path]).unwrap();

    assert_eq!(config.currencies, vec!["USD", "GBP", "JPY"]);
    assert_eq!(config.effective_start_date().to_string(), "2023-01-01");
    assert_eq!(config.end_date.unwrap().to_string(), "2023-12-31");
    assert_eq!(config.max_tries, 3);
    assert_eq!(config.concurrent_requests, 2);
    assert_eq!(config.response_format, ResponseFormat::StructureSpecificData);
    // Should use defaults for other values
    assert_eq!(config.lookback_days, 7);
    assert_eq!(config.retry_max_delay_ms, 10000);
}

#[test]
fn test_config_toml_overrides_json() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("config.json");
    let toml_path = temp_dir.path().join("overrides.toml");

    fs::write(&json_path, r#"{"currencies": ["USD"], "lookback_days": 3}"#).unwrap();
    fs::write(&toml_path, "lookback_days = 10\nfill_missing_dates = false\n").unwrap();

    let config = TapConfig::from_files(&[json_path, toml_path]).unwrap();

    assert_eq!(config.currencies, vec!["USD"]);
    assert_eq!(config.lookback_days, 10);
    assert!(!config.fill_missing_dates);
}

#[test]
fn test_config_retry_policy() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"currencies": ["CHF"], "max_tries": 2, "max_time_secs": 5, "retry_initial_delay_ms": 10, "retry_max_delay_ms": 20}"#,
    )
    .unwrap();

    let policy = TapConfig::from_files(&[config_path]).unwrap().retry_policy();
    assert_eq!(policy.max_tries, 2);
    assert_eq!(policy.max_time.as_secs(), 5);
    assert_eq!(policy.initial_delay_ms, 10);
    assert_eq!(policy.max_delay_ms, 20);
}

#[test]
fn test_config_invalid_json() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");

    fs::write(&config_path, r#"{"currencies": ["USD"]"#).unwrap();

    let result = TapConfig::from_files(&[config_path]);
    assert!(result.is_err());
}

#[test]
fn test_config_non_object_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");

    fs::write(&config_path, r#"["USD"]"#).unwrap();

    assert!(TapConfig::from_files(&[config_path]).is_err());
}

#[test]
fn test_config_nonexistent_file() {
    let result = TapConfig::from_files(&["nonexistent.json".into()]);
    assert!(result.is_err());
}
