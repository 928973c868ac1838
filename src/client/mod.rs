//! Access to the ECB SDMX data API.
//!
//! This module builds series requests for the EXR (exchange rates) dataflow, retries
//! transient failures with exponential backoff and parses the returned observations
//! into [`ExchangeRate`](crate::models::ExchangeRate) values. The main entry point is
//! [`EcbClient::get_exchange_rates`].

mod ecb_client;
mod gap_fill;
mod retry;
mod sdmx;

// Re-export public API
pub use ecb_client::{series_key, EcbClient};
pub use gap_fill::fill_missing_dates;
pub use retry::{calculate_backoff, should_retry, RetryPolicy};
pub use sdmx::{parse_observations, parse_sdmx_json, parse_structure_specific_xml, Observation};
