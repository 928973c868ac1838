use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A single reference rate: one unit of `base_currency` buys `exchange_rate`
/// units of `target_currency` on `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    #[serde(serialize_with = "serialize_date_time")]
    pub date: NaiveDate,
    pub base_currency: String,
    pub target_currency: String,
    pub exchange_rate: f64,
}

impl ExchangeRate {
    pub fn new(
        date: NaiveDate,
        base_currency: impl Into<String>,
        target_currency: impl Into<String>,
        exchange_rate: f64,
    ) -> Self {
        Self {
            date,
            base_currency: base_currency.into(),
            target_currency: target_currency.into(),
            exchange_rate,
        }
    }

    /// Returns the rate inverted.
    pub fn invert(&self) -> Self {
        Self {
            date: self.date,
            base_currency: self.target_currency.clone(),
            target_currency: self.base_currency.clone(),
            exchange_rate: 1.0 / self.exchange_rate,
        }
    }

    /// Returns the rate expressed against `new_base_currency`.
    ///
    /// `lookup_rate` must convert from this rate's base into `new_base_currency`
    /// (e.g. `EUR => USD` to rebase `EUR => GBP` into `USD => GBP`).
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if `lookup_rate` does not target `new_base_currency`
    /// or is not based on the same currency as `self`.
    pub fn rebase(&self, new_base_currency: &str, lookup_rate: &ExchangeRate) -> AppResult<Self> {
        if new_base_currency == self.base_currency {
            return Ok(self.clone());
        }
        if new_base_currency != lookup_rate.target_currency {
            return Err(AppError::ConversionError(format!(
                "Cannot convert to {new_base_currency} using {}",
                lookup_rate.target_currency
            )));
        }
        if self.base_currency != lookup_rate.base_currency {
            return Err(AppError::ConversionError(format!(
                "Cannot convert rate based on {} using rate based on {}",
                self.base_currency, lookup_rate.base_currency
            )));
        }
        Ok(Self {
            date: self.date,
            base_currency: new_base_currency.to_string(),
            target_currency: self.target_currency.clone(),
            exchange_rate: 1.0 / lookup_rate.exchange_rate * self.exchange_rate,
        })
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} => {} @{} ({})>",
            self.base_currency,
            self.target_currency,
            self.date.format("%Y-%m-%d"),
            self.exchange_rate
        )
    }
}

/// Dates are declared as `date-time` in the stream schema, so they are emitted at midnight UTC.
fn serialize_date_time<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}T00:00:00+00:00", date.format("%Y-%m-%d")))
}

/// Wire format requested from the SDMX API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ResponseFormat {
    /// SDMX-JSON
    #[default]
    #[serde(rename = "jsondata")]
    JsonData,
    /// SDMX-ML 2.1 structure-specific data
    #[serde(rename = "structurespecificdata")]
    StructureSpecificData,
}

impl ResponseFormat {
    /// Value of the `format` query parameter.
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::JsonData => "jsondata",
            Self::StructureSpecificData => "structurespecificdata",
        }
    }
}
