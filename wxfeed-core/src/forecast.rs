use serde_json::Value;
use tracing::warn;

use crate::{
    error::WeatherError,
    model::{DayForecast, FORECAST_DAYS, Units},
    provider::ProviderId,
};

/// Turn a provider's daily forecast array into exactly [`FORECAST_DAYS`] entries.
///
/// Entries that `parse_entry` rejects become [`DayForecast::dummy`], missing
/// days are padded with dummies and surplus days are dropped. Only an empty
/// array fails.
pub fn parse_forecasts<F>(
    provider: ProviderId,
    entries: &[Value],
    units: Units,
    mut parse_entry: F,
) -> Result<Vec<DayForecast>, WeatherError>
where
    F: FnMut(&Value) -> Result<DayForecast, serde_json::Error>,
{
    if entries.is_empty() {
        return Err(WeatherError::EmptyForecast);
    }

    let mut result: Vec<DayForecast> = entries
        .iter()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(day, entry)| {
            parse_entry(entry).unwrap_or_else(|err| {
                warn!(%provider, day, error = %err, "invalid forecast, creating dummy");
                DayForecast::dummy(units)
            })
        })
        .collect();

    for day in result.len()..FORECAST_DAYS {
        warn!(%provider, day, "missing forecast, creating dummy");
        result.push(DayForecast::dummy(units));
    }

    Ok(result)
}
