//! The `exchange_rates` stream.

use crate::calculator::RateCalculator;
use crate::client::EcbClient;
use crate::config::TapConfig;
use crate::constants::{BASE_CURRENCY, PRIMARY_KEYS, STREAM_NAME};
use crate::errors::{AppError, AppResult};
use crate::models::ExchangeRate;
use crate::singer::{CatalogEntry, State};
use chrono::{Days, NaiveDate};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Daily EUR reference rates of the configured currencies, with their inversions
/// and cross rates between the configured currencies.
pub struct ExchangeRatesStream<'a> {
    config: &'a TapConfig,
}

impl<'a> ExchangeRatesStream<'a> {
    pub const NAME: &'static str = STREAM_NAME;

    pub fn new(config: &'a TapConfig) -> Self {
        Self { config }
    }

    pub fn primary_keys() -> Vec<String> {
        PRIMARY_KEYS.iter().map(|k| k.to_string()).collect()
    }

    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": ["string", "null"],
                    "format": "date-time"
                },
                "base_currency": {
                    "type": ["string", "null"],
                    "description": "The currency 'from'"
                },
                "target_currency": {
                    "type": ["string", "null"],
                    "description": "The currency 'to'"
                },
                "exchange_rate": {
                    "type": ["number", "null"],
                    "description": "The exchange rate"
                }
            }
        })
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::discovered(Self::NAME, Self::schema(), PRIMARY_KEYS)
    }

    /// Returns the inclusive date range to request.
    ///
    /// A previous sync's `end_date` bookmark moves the start back by the configured
    /// look-back, so rates published late (weekends, holidays) are picked up again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the bookmark is malformed or the window is empty.
    pub fn sync_window(&self, state: &State, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
        let start_date = match state.end_date(Self::NAME)? {
            Some(previous_end_date) => {
                info!(previous_end_date = %previous_end_date, "Resuming download from bookmark");
                let start = previous_end_date
                    .checked_sub_days(Days::new(u64::from(self.config.lookback_days)))
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!(
                            "Can't look back {} days from {previous_end_date}",
                            self.config.lookback_days
                        ))
                    })?;
                info!(
                    start_date = %start,
                    "New start date to cover missing weekend and holiday data"
                );
                start
            }
            None => self.config.effective_start_date(),
        };
        let end_date = self.config.effective_end_date(today);

        if start_date > end_date {
            return Err(AppError::InvalidInput(format!(
                "Start date {start_date} is after end date {end_date}"
            )));
        }

        Ok((start_date, end_date))
    }

    /// Fetches every configured currency and expands the result into all records.
    ///
    /// Requests run with bounded concurrency; results keep the configured currency order.
    /// On success the stream bookmark is moved to the end of the window.
    pub async fn get_records(
        &self,
        client: &EcbClient,
        state: &mut State,
        today: NaiveDate,
    ) -> AppResult<Vec<ExchangeRate>> {
        let (start_date, end_date) = self.sync_window(state, today)?;

        let currencies: Vec<&str> = self
            .config
            .currencies
            .iter()
            .map(String::as_str)
            .filter(|currency| {
                if *currency == BASE_CURRENCY {
                    warn!(currency = *currency, "Skipping base currency, rates are quoted against it");
                    false
                } else {
                    true
                }
            })
            .collect();

        let per_currency: Vec<Vec<ExchangeRate>> = stream::iter(currencies)
            .map(|currency| client.get_exchange_rates(currency, start_date, end_date))
            .buffered(self.config.concurrent_requests)
            .try_collect()
            .await?;
        let rates: Vec<ExchangeRate> = per_currency.into_iter().flatten().collect();

        state.set_end_date(Self::NAME, end_date);

        let calculator = RateCalculator::new(rates);
        Ok(calculator.calculate_rebased_rates(&self.config.currencies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn config(value: Value) -> TapConfig {
        TapConfig::from_value(value).unwrap()
    }

    #[test]
    fn fresh_sync_uses_configured_window() {
        let config = config(json!({
            "currencies": ["USD"],
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        }));
        let stream = ExchangeRatesStream::new(&config);
        let window = stream
            .sync_window(&State::default(), date("2024-06-01"))
            .unwrap();
        assert_eq!(window, (date("2024-01-01"), date("2024-01-31")));
    }

    #[test]
    fn defaults_to_2000_until_today() {
        let config = config(json!({"currencies": ["USD"]}));
        let stream = ExchangeRatesStream::new(&config);
        let window = stream
            .sync_window(&State::default(), date("2024-06-01"))
            .unwrap();
        assert_eq!(window, (date("2000-01-01"), date("2024-06-01")));
    }

    #[test]
    fn resume_looks_back_a_week() {
        let config = config(json!({"currencies": ["USD"], "start_date": "2020-01-01"}));
        let stream = ExchangeRatesStream::new(&config);
        let state = State::from_value(json!({
            "bookmarks": {"exchange_rates": {"end_date": "2024-03-10"}}
        }))
        .unwrap();

        let (start, end) = stream.sync_window(&state, date("2024-03-15")).unwrap();
        assert_eq!(start, date("2024-03-03"));
        assert_eq!(end, date("2024-03-15"));
    }

    #[test]
    fn custom_lookback_is_applied() {
        let config = config(json!({"currencies": ["USD"], "lookback_days": 2}));
        let stream = ExchangeRatesStream::new(&config);
        let state = State::from_value(json!({
            "bookmarks": {"exchange_rates": {"end_date": "2024-03-10"}}
        }))
        .unwrap();

        let (start, _) = stream.sync_window(&state, date("2024-03-15")).unwrap();
        assert_eq!(start, date("2024-03-08"));
    }

    #[test]
    fn bookmark_after_end_date_errors() {
        let config = config(json!({"currencies": ["USD"], "end_date": "2024-01-01"}));
        let stream = ExchangeRatesStream::new(&config);
        let state = State::from_value(json!({
            "bookmarks": {"exchange_rates": {"end_date": "2024-03-10"}}
        }))
        .unwrap();
        assert!(stream.sync_window(&state, date("2024-03-15")).is_err());
    }

    #[test]
    fn catalog_entry_describes_stream() {
        let entry = ExchangeRatesStream::catalog_entry();
        assert_eq!(entry.tap_stream_id, "exchange_rates");
        assert_eq!(
            entry.key_properties,
            vec!["date", "base_currency", "target_currency"]
        );
        assert_eq!(entry.schema["properties"]["date"]["format"], "date-time");
        assert!(entry.is_selected());
    }
}
