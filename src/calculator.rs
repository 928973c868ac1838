//! Derivation of cross rates from EUR based reference rates.

use crate::constants::BASE_CURRENCY;
use crate::models::ExchangeRate;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Expands EUR based rates into inverted and rebased rates.
pub struct RateCalculator {
    rates: Vec<ExchangeRate>,
    base_currency: String,
    by_date: BTreeMap<NaiveDate, Vec<ExchangeRate>>,
}

impl RateCalculator {
    /// Uses the ECB base currency (EUR).
    pub fn new(rates: Vec<ExchangeRate>) -> Self {
        Self::with_base(rates, BASE_CURRENCY)
    }

    /// Holds `rates` plus the inversion of every rate based on `base_currency`.
    pub fn with_base(mut rates: Vec<ExchangeRate>, base_currency: &str) -> Self {
        let inverted: Vec<ExchangeRate> = rates
            .iter()
            .filter(|rate| rate.base_currency == base_currency)
            .map(ExchangeRate::invert)
            .collect();
        rates.extend(inverted);

        let mut by_date: BTreeMap<NaiveDate, Vec<ExchangeRate>> = BTreeMap::new();
        for rate in &rates {
            by_date.entry(rate.date).or_default().push(rate.clone());
        }

        Self {
            rates,
            base_currency: base_currency.to_string(),
            by_date,
        }
    }

    /// Returns the held rates followed by every rate re-expressed against each of `currencies`.
    ///
    /// For each date, every rate based on the calculator base is rebased onto each
    /// requested currency using that date's `base => currency` rate. Dates without
    /// such a lookup rate are skipped; one warning per currency reports how many.
    pub fn calculate_rebased_rates<S: AsRef<str>>(&self, currencies: &[S]) -> Vec<ExchangeRate> {
        let (exchange_rates, missing) = self.rebase_all(currencies);
        for (currency, days) in missing {
            warn!(
                currency = currency.as_str(),
                days, "No lookup rate found on some dates, cannot create conversion"
            );
        }
        exchange_rates
    }

    /// Rebases every date, returning the rates and the number of dates each currency lacked a lookup rate.
    fn rebase_all<S: AsRef<str>>(&self, currencies: &[S]) -> (Vec<ExchangeRate>, BTreeMap<String, usize>) {
        let mut exchange_rates = self.rates.clone();
        let mut missing: BTreeMap<String, usize> = BTreeMap::new();

        for (date, rates) in &self.by_date {
            let base_rates: HashMap<&str, &ExchangeRate> = rates
                .iter()
                .filter(|rate| rate.base_currency == self.base_currency)
                .map(|rate| (rate.target_currency.as_str(), rate))
                .collect();

            for currency in currencies {
                let new_base: &str = currency.as_ref();
                if new_base == self.base_currency {
                    debug!(currency = new_base, "Skipping currency, it is already a base");
                    continue;
                }
                let Some(lookup_rate) = base_rates.get(new_base) else {
                    debug!(currency = new_base, date = %date, "No lookup rate found");
                    *missing.entry(new_base.to_string()).or_default() += 1;
                    continue;
                };
                debug!(currency = new_base, date = %date, "Converting rates");

                for rate in rates {
                    // Inverted rates are never rebased, and the lookup pair itself
                    // already exists as an inversion
                    if rate.base_currency != self.base_currency || rate.target_currency == new_base
                    {
                        continue;
                    }
                    match rate.rebase(new_base, lookup_rate) {
                        Ok(rebased) => exchange_rates.push(rebased),
                        Err(e) => warn!(rate = %rate, error = %e, "Skipping rate"),
                    }
                }
            }
        }

        (exchange_rates, missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pairs(rates: &[ExchangeRate]) -> Vec<(String, String, String)> {
        rates
            .iter()
            .map(|r| {
                (
                    r.date.to_string(),
                    r.base_currency.clone(),
                    r.target_currency.clone(),
                )
            })
            .collect()
    }

    fn triple(day: &str, base: &str, target: &str) -> (String, String, String) {
        (day.to_string(), base.to_string(), target.to_string())
    }

    #[test]
    fn inversions_are_appended() {
        let rates = vec![ExchangeRate::new(date("2024-01-02"), "EUR", "USD", 2.0)];
        let calculator = RateCalculator::new(rates);
        let result = calculator.calculate_rebased_rates::<&str>(&[]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].base_currency, "USD");
        assert_eq!(result[1].target_currency, "EUR");
        assert_eq!(result[1].exchange_rate, 0.5);
    }

    #[test]
    fn cross_rates_are_derived() {
        let day = date("2024-01-02");
        let rates = vec![
            ExchangeRate::new(day, "EUR", "USD", 2.0),
            ExchangeRate::new(day, "EUR", "GBP", 0.5),
        ];
        let result = RateCalculator::new(rates).calculate_rebased_rates(&["USD", "GBP"]);

        assert_eq!(
            pairs(&result),
            vec![
                triple("2024-01-02", "EUR", "USD"),
                triple("2024-01-02", "EUR", "GBP"),
                triple("2024-01-02", "USD", "EUR"),
                triple("2024-01-02", "GBP", "EUR"),
                triple("2024-01-02", "USD", "GBP"),
                triple("2024-01-02", "GBP", "USD"),
            ]
        );
        // 1 USD = 0.5 EUR = 0.25 GBP
        assert!((result[4].exchange_rate - 0.25).abs() < 1e-12);
        // 1 GBP = 2 EUR = 4 USD
        assert!((result[5].exchange_rate - 4.0).abs() < 1e-12);
    }

    #[test]
    fn base_currency_is_not_rebased() {
        let day = date("2024-01-02");
        let rates = vec![ExchangeRate::new(day, "EUR", "USD", 2.0)];
        let result = RateCalculator::new(rates).calculate_rebased_rates(&["EUR", "USD"]);
        // Only the original and its inversion: USD => USD is never produced
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn missing_lookup_rate_skips_date() {
        let rates = vec![
            ExchangeRate::new(date("2024-01-02"), "EUR", "USD", 2.0),
            ExchangeRate::new(date("2024-01-02"), "EUR", "GBP", 0.5),
            ExchangeRate::new(date("2024-01-03"), "EUR", "GBP", 0.6),
        ];
        let result = RateCalculator::new(rates).calculate_rebased_rates(&["USD"]);

        let rebased: Vec<_> = result
            .iter()
            .filter(|r| r.base_currency == "USD" && r.target_currency != "EUR")
            .collect();
        assert_eq!(rebased.len(), 1);
        assert_eq!(rebased[0].date, date("2024-01-02"));
        assert_eq!(rebased[0].target_currency, "GBP");
    }

    #[test]
    fn missing_lookups_are_counted_per_currency() {
        let rates = vec![
            ExchangeRate::new(date("2024-01-02"), "EUR", "GBP", 0.5),
            ExchangeRate::new(date("2024-01-03"), "EUR", "GBP", 0.6),
            ExchangeRate::new(date("2024-01-04"), "EUR", "GBP", 0.7),
            ExchangeRate::new(date("2024-01-04"), "EUR", "USD", 1.1),
        ];
        let (_, missing) = RateCalculator::new(rates).rebase_all(&["USD", "GBP"]);

        assert_eq!(missing.len(), 1);
        assert_eq!(missing.get("USD"), Some(&2));
    }

    #[test]
    fn custom_base_only_inverts_matching_rates() {
        let day = date("2024-01-02");
        let rates = vec![
            ExchangeRate::new(day, "USD", "JPY", 150.0),
            ExchangeRate::new(day, "EUR", "USD", 1.1),
        ];
        let calculator = RateCalculator::with_base(rates, "USD");
        let result = calculator.calculate_rebased_rates::<&str>(&[]);
        assert_eq!(result.len(), 3);
        assert_eq!(result[2].base_currency, "JPY");
        assert_eq!(result[2].target_currency, "USD");
    }
}
