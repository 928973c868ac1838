use crate::models::ExchangeRate;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

/// Fills missing days with the last known rate, typically during weekends and holidays.
///
/// Expects the rates of a single currency pair. Produces one rate per day from the
/// earliest observation up to and including `end_date`; a later observation for the
/// same day replaces an earlier one. If `end_date` precedes the earliest observation
/// nothing is produced.
pub fn fill_missing_dates(data: &[ExchangeRate], end_date: NaiveDate) -> Vec<ExchangeRate> {
    let all_dates: BTreeMap<NaiveDate, &ExchangeRate> =
        data.iter().map(|entry| (entry.date, entry)).collect();

    let Some(&first_date) = all_dates.keys().next() else {
        warn!(
            end_date = %end_date,
            "No exchange rates to fill, try using an older start date"
        );
        return Vec::new();
    };

    let mut complete_data = Vec::new();
    let mut last_conversion: Option<&ExchangeRate> = None;

    for current_date in first_date.iter_days().take_while(|d| *d <= end_date) {
        if let Some(entry) = all_dates.get(&current_date) {
            last_conversion = Some(entry);
        }

        if let Some(last) = last_conversion {
            complete_data.push(ExchangeRate {
                date: current_date,
                ..last.clone()
            });
        }
    }

    complete_data
}
