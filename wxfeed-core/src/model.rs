use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::UNKNOWN_CONDITION;

/// Number of forecast days every `WeatherInfo` carries.
pub const FORECAST_DAYS: usize = 5;

/// Unit system requested from a provider and reported back in the record.
///
/// Metric means °C and km/h, imperial means °F and mph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn is_metric(self) -> bool {
        matches!(self, Units::Metric)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// `lat`/`lon` query pairs with six decimals.
    pub(crate) fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("lat", format!("{:.6}", self.latitude)),
            ("lon", format!("{:.6}", self.longitude)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub low: f64,
    pub high: f64,
    pub condition: String,
    pub condition_code: i32,
    pub date: String,
    pub units: Units,
}

impl DayForecast {
    /// Placeholder for a day the provider did not deliver or delivered broken.
    pub fn dummy(units: Units) -> Self {
        Self {
            low: 0.0,
            high: 0.0,
            condition: String::new(),
            condition_code: UNKNOWN_CONDITION,
            date: String::new(),
            units,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.condition_code == UNKNOWN_CONDITION && self.condition.is_empty()
    }
}

/// Normalized weather record produced by every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub city_id: String,
    pub city: String,
    pub condition: String,
    pub condition_code: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub units: Units,
    pub forecasts: Vec<DayForecast>,
    pub timestamp: DateTime<Utc>,
}

/// A location search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub id: String,
    pub city: String,
    pub country_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_format_with_six_decimals() {
        let pairs = Coordinates::new(52.52, -13.4).query_pairs();
        assert_eq!(pairs[0], ("lat", "52.520000".to_string()));
        assert_eq!(pairs[1], ("lon", "-13.400000".to_string()));
    }

    #[test]
    fn dummy_forecast_is_recognizable() {
        let day = DayForecast::dummy(Units::Imperial);
        assert!(day.is_dummy());
        assert_eq!(day.condition_code, -1);
        assert_eq!(day.units, Units::Imperial);
    }

    #[test]
    fn units_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Units::Imperial).unwrap(), "\"imperial\"");
        assert!(Units::default().is_metric());
    }
}
