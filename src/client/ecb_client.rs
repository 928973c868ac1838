use super::gap_fill::fill_missing_dates;
use super::retry::{with_retry, RetryPolicy};
use super::sdmx::parse_observations;
use crate::config::TapConfig;
use crate::constants::{
    AVERAGE_VARIATION, BASE_CURRENCY, DAILY_FREQUENCY, DATE_FORMAT, REFERENCE_RATE_TYPE, TAP_NAME,
};
use crate::errors::{AppError, AppResult};
use crate::models::{ExchangeRate, ResponseFormat};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// Builds the series key identifying one exchange rate series in the EXR dataflow.
///
/// The key is made of five dimensions:
/// - the frequency at which rates are measured (e.g. daily, `D`);
/// - the currency being measured (e.g. US dollar, `USD`);
/// - the currency it is measured against (always euro, `EUR`);
/// - the type of rate (foreign exchange reference rates, `SP00`);
/// - the series variation (average or standardised measure, `A`).
pub fn series_key(target_currency: &str, frequency: &str) -> String {
    format!("{frequency}.{target_currency}.{BASE_CURRENCY}.{REFERENCE_RATE_TYPE}.{AVERAGE_VARIATION}")
}

/// HTTP client for the ECB data API.
#[derive(Debug, Clone)]
pub struct EcbClient {
    http: reqwest::Client,
    base_url: Url,
    format: ResponseFormat,
    retry_policy: RetryPolicy,
    fill_missing_dates: bool,
}

impl EcbClient {
    /// Creates a client from the tap configuration.
    ///
    /// # Errors
    ///
    /// Returns `UrlError` if `base_url` is not a valid URL and `NetworkError` if the
    /// underlying HTTP client cannot be built.
    pub fn new(config: &TapConfig) -> AppResult<Self> {
        let mut base = config.base_url.clone();
        // Url::join replaces the last segment unless the base ends with a slash
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(format!("{TAP_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            format: config.response_format,
            retry_policy: config.retry_policy(),
            fill_missing_dates: config.fill_missing_dates,
        })
    }

    /// Returns the request URL of the daily series for `target_currency`.
    pub fn request_url(
        &self,
        target_currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(&series_key(target_currency, DAILY_FREQUENCY))?;
        url.query_pairs_mut()
            .append_pair("startPeriod", &start_date.format(DATE_FORMAT).to_string())
            .append_pair("endPeriod", &end_date.format(DATE_FORMAT).to_string())
            .append_pair("detail", "dataonly")
            .append_pair("includeHistory", "false")
            .append_pair("format", self.format.query_value());
        Ok(url)
    }

    /// Fetches the EUR based daily rates of `target_currency` between both dates (inclusive).
    ///
    /// Transient failures are retried according to the configured policy. When gap
    /// filling is enabled, weekends and holidays up to `end_date` carry the last known rate.
    ///
    /// # Errors
    ///
    /// Returns `HttpStatus` for a non-success response (after retries for 5xx and 429),
    /// `NetworkError` if the server cannot be reached, and `ParseError` for an
    /// unreadable body.
    pub async fn get_exchange_rates(
        &self,
        target_currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<ExchangeRate>> {
        let url = self.request_url(target_currency, start_date, end_date)?;
        let label = series_key(target_currency, DAILY_FREQUENCY);

        let body = with_retry(&self.retry_policy, &label, || self.fetch_body(&url)).await?;
        let observations = parse_observations(&body, self.format)?;

        info!(
            currency = target_currency,
            observations = observations.len(),
            start_date = %start_date,
            end_date = %end_date,
            "Exchange rates fetched"
        );

        let rates: Vec<ExchangeRate> = observations
            .into_iter()
            .map(|o| ExchangeRate::new(o.date, BASE_CURRENCY, target_currency, o.value))
            .collect();

        if self.fill_missing_dates {
            Ok(fill_missing_dates(&rates, end_date))
        } else {
            Ok(rates)
        }
    }

    /// Performs a single GET and returns the body of a successful response.
    async fn fetch_body(&self, url: &Url) -> AppResult<String> {
        debug!(url = %url, "Requesting series");
        let response = self.http.get(url.clone()).send().await.map_err(|e| {
            // No response at all: connection or timeout problem
            AppError::NetworkError(format!("Failed to request {url}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if !(status.is_server_error() || status.as_u16() == 429) {
                error!(status = status.as_u16(), body = %body, "Request rejected by the API");
            }
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to read response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_with(base_url: &str) -> EcbClient {
        let config = TapConfig::from_value(json!({
            "currencies": ["USD"],
            "base_url": base_url
        }))
        .unwrap();
        EcbClient::new(&config).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn series_key_has_five_dimensions() {
        assert_eq!(series_key("USD", "D"), "D.USD.EUR.SP00.A");
        assert_eq!(series_key("JPY", "M"), "M.JPY.EUR.SP00.A");
    }

    #[test]
    fn request_url_contains_series_and_period() {
        let client = client_with("https://data-api.ecb.europa.eu/service/data/EXR/");
        let url = client
            .request_url("USD", date("2024-01-01"), date("2024-01-31"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://data-api.ecb.europa.eu/service/data/EXR/D.USD.EUR.SP00.A?startPeriod=2024-01-01&endPeriod=2024-01-31&detail=dataonly&includeHistory=false&format=jsondata"
        );
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_last_segment() {
        let client = client_with("http://localhost:8080/service/data/EXR");
        let url = client
            .request_url("GBP", date("2024-01-01"), date("2024-01-02"))
            .unwrap();
        assert!(url
            .as_str()
            .starts_with("http://localhost:8080/service/data/EXR/D.GBP.EUR.SP00.A?"));
    }

    #[test]
    fn invalid_base_url_errors() {
        let config = TapConfig::from_value(json!({
            "currencies": ["USD"],
            "base_url": "not a url"
        }))
        .unwrap();
        assert!(matches!(
            EcbClient::new(&config),
            Err(AppError::UrlError(_))
        ));
    }
}
