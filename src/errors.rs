use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request could not be sent or the connection dropped
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Server answered with a non-success status code
    #[error("HTTP {status} returned by {url}")]
    HttpStatus { status: u16, url: String },
    /// Failed to parse an API response
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Configuration file is malformed or fails validation
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Rate could not be converted to another base currency
    #[error("Conversion error: {0}")]
    ConversionError(String),
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    JsonError(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => AppError::NetworkError(err.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
