//! tap-ecbexchangerates library
//!
//! This crate provides the core functionality for the `tap-ecbexchangerates` binary,
//! a Singer tap extracting the foreign exchange reference rates published by the
//! European Central Bank.
//!
//! ## Overview
//!
//! - [`client`] - Requests ECB series with retry/backoff and parses SDMX responses
//! - [`calculator`] - Derives inverted and cross rates from EUR based rates
//! - [`stream`] - The `exchange_rates` stream: schema, sync window and records
//! - [`tap`] - Discovery and sync orchestration
//! - [`singer`] - Messages, catalog, state and `--about` output of the Singer protocol
//! - [`cli`] - Command-line interface
//! - [`config`] - Tap settings
//! - [`models`] - Exchange rate record and wire format types
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use tap_ecbexchangerates::client::EcbClient;
//! use tap_ecbexchangerates::config::TapConfig;
//! use tap_ecbexchangerates::errors::AppResult;
//! use tap_ecbexchangerates::singer::{SingerWriter, State};
//! use tap_ecbexchangerates::tap::Tap;
//!
//! # async fn example() -> AppResult<()> {
//! let config = TapConfig::from_value(serde_json::json!({"currencies": ["USD", "GBP"]}))?;
//! let client = EcbClient::new(&config)?;
//! let mut tap = Tap::new(config, State::default(), None);
//!
//! let mut writer = SingerWriter::new(std::io::stdout().lock());
//! tap.sync(&client, &mut writer, chrono::Utc::now().date_naive()).await?;
//! # Ok(())
//! # }
//! ```

pub mod calculator;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod singer;
pub mod stream;
pub mod tap;
pub mod utils;
