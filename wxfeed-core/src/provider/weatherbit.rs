use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    condition::map_condition_icon_to_code,
    error::WeatherError,
    forecast::parse_forecasts,
    language::LanguageMapping,
    model::{Coordinates, DayForecast, FORECAST_DAYS, Units, WeatherInfo, WeatherLocation},
    provider::{ProviderId, first_element, int_or_numeric_string, retrieve, string_or_number},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.weatherbit.io";

const LANGUAGE_CODE_MAPPING: LanguageMapping = &[
    ("bg-", "bg"),
    ("de-", "de"),
    ("fi-", "fi"),
    ("fr-", "fr"),
    ("it-", "it"),
    ("nl-", "nl"),
    ("pl-", "pl"),
    ("pt-", "pt"),
    ("ro-", "ro"),
    ("ru-", "ru"),
    ("se-", "se"),
    ("tr-", "tr"),
    ("uk-", "ua"),
    ("zh-CN", "zh"),
    ("zh-TW", "zh-tw"),
];

/// Weatherbit only answers coordinate queries.
#[derive(Debug, Clone)]
pub struct WeatherbitProvider {
    api_key: String,
    locale: String,
    base_url: String,
    http: Client,
}

impl WeatherbitProvider {
    pub fn new(api_key: String, locale: String) -> Self {
        Self {
            api_key,
            locale,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn handle_weather_request(
        &self,
        location: Coordinates,
        units: Units,
    ) -> Result<WeatherInfo, WeatherError> {
        if self.api_key.trim().is_empty() {
            return Err(WeatherError::MissingApiKey(ProviderId::Weatherbit));
        }

        let lang = self.language_code();
        let mut query = location.query_pairs().to_vec();
        query.extend([
            ("units", units_param(units).to_string()),
            ("lang", lang.to_string()),
            ("key", self.api_key.clone()),
        ]);

        let mut forecast_query = query.clone();
        forecast_query.push(("days", FORECAST_DAYS.to_string()));
        let forecast_body = retrieve(
            &self.http,
            ProviderId::Weatherbit,
            "forecast",
            &format!("{}/v2.0/forecast/daily", self.base_url),
            &forecast_query,
        )
        .await?;

        let current_body = retrieve(
            &self.http,
            ProviderId::Weatherbit,
            "current",
            &format!("{}/v2.0/current", self.base_url),
            &query,
        )
        .await?;

        let info = parse_weather(&current_body, &forecast_body, units, Utc::now())
            .inspect_err(|err| warn!(lang, error = %err, "malformed json, weather parsing failed"))?;

        debug!(city = %info.city, condition = %info.condition, "weather updated");
        Ok(info)
    }
}

#[async_trait]
impl WeatherProvider for WeatherbitProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Weatherbit
    }

    async fn get_custom_weather(&self, _id: &str, _units: Units) -> Result<WeatherInfo, WeatherError> {
        Err(WeatherError::Unsupported {
            provider: ProviderId::Weatherbit,
            operation: "weather by city id",
        })
    }

    async fn get_location_weather(
        &self,
        location: Coordinates,
        units: Units,
    ) -> Result<WeatherInfo, WeatherError> {
        self.handle_weather_request(location, units).await
    }

    async fn get_locations(&self, _input: &str) -> Result<Vec<WeatherLocation>, WeatherError> {
        Err(WeatherError::Unsupported {
            provider: ProviderId::Weatherbit,
            operation: "location search",
        })
    }

    fn language_mapping(&self) -> LanguageMapping {
        LANGUAGE_CODE_MAPPING
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn should_retry(&self) -> bool {
        false
    }
}

fn units_param(units: Units) -> &'static str {
    match units {
        Units::Metric => "M",
        Units::Imperial => "I",
    }
}

#[derive(Debug, Deserialize)]
struct WbWeather {
    #[serde(deserialize_with = "int_or_numeric_string")]
    code: i32,
    description: String,
    icon: String,
}

impl WbWeather {
    fn condition_code(&self) -> i32 {
        map_condition_icon_to_code(&self.icon, self.code)
    }
}

#[derive(Debug, Deserialize)]
struct WbCurrent {
    #[serde(deserialize_with = "string_or_number")]
    ts: String,
    city_name: String,
    weather: WbWeather,
    temp: f64,
    rh: f64,
    wind_spd: f64,
    wind_dir: f64,
}

#[derive(Debug, Deserialize)]
struct WbCurrentResponse {
    #[serde(deserialize_with = "first_element")]
    data: WbCurrent,
}

#[derive(Debug, Deserialize)]
struct WbForecastResponse {
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WbForecastDay {
    min_temp: f64,
    max_temp: f64,
    weather: WbWeather,
    valid_date: String,
}

fn parse_weather(
    current_body: &str,
    forecast_body: &str,
    units: Units,
    timestamp: DateTime<Utc>,
) -> Result<WeatherInfo, WeatherError> {
    let forecast: WbForecastResponse = serde_json::from_str(forecast_body)
        .map_err(WeatherError::malformed(ProviderId::Weatherbit, "forecast"))?;
    let forecasts = parse_forecasts(ProviderId::Weatherbit, &forecast.data, units, |entry| {
        parse_day(entry, units)
    })?;

    let current = serde_json::from_str::<WbCurrentResponse>(current_body)
        .map_err(WeatherError::malformed(ProviderId::Weatherbit, "current weather"))?
        .data;

    // m/s in metric mode, converted to km/h
    let wind_speed = if units.is_metric() {
        current.wind_spd * 3.6
    } else {
        current.wind_spd
    };

    Ok(WeatherInfo {
        city_id: current.ts,
        city: current.city_name,
        condition_code: current.weather.condition_code(),
        condition: current.weather.description,
        temperature: current.temp,
        humidity: current.rh,
        wind_speed,
        wind_direction: current.wind_dir as i32,
        units,
        forecasts,
        timestamp,
    })
}

fn parse_day(entry: &Value, units: Units) -> Result<DayForecast, serde_json::Error> {
    let day = WbForecastDay::deserialize(entry)?;

    Ok(DayForecast {
        low: day.min_temp,
        high: day.max_temp,
        condition_code: day.weather.condition_code(),
        condition: day.weather.description,
        date: day.valid_date,
        units,
    })
}
