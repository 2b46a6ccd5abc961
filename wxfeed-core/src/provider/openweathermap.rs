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

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const LANGUAGE_CODE_MAPPING: LanguageMapping = &[
    ("bg-", "bg"),
    ("de-", "de"),
    ("es-", "sp"),
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
    ("zh-CN", "zh_cn"),
    ("zh-TW", "zh_tw"),
];

#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    api_key: String,
    locale: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherMapProvider {
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
        selection: Vec<(&'static str, String)>,
        units: Units,
    ) -> Result<WeatherInfo, WeatherError> {
        if self.api_key.trim().is_empty() {
            return Err(WeatherError::MissingApiKey(ProviderId::OpenWeatherMap));
        }

        let lang = self.language_code();
        let mut query = selection;
        query.extend([
            ("mode", "json".to_string()),
            ("units", units_param(units).to_string()),
            ("lang", lang.to_string()),
        ]);

        let mut condition_query = query.clone();
        condition_query.push(("appid", self.api_key.clone()));
        let condition_body = retrieve(
            &self.http,
            ProviderId::OpenWeatherMap,
            "weather",
            &format!("{}/data/2.5/weather", self.base_url),
            &condition_query,
        )
        .await?;

        let mut forecast_query = query;
        forecast_query.extend([
            ("cnt", FORECAST_DAYS.to_string()),
            ("appid", self.api_key.clone()),
        ]);
        let forecast_body = retrieve(
            &self.http,
            ProviderId::OpenWeatherMap,
            "forecast",
            &format!("{}/data/2.5/forecast/daily", self.base_url),
            &forecast_query,
        )
        .await?;

        let info = parse_weather(&condition_body, &forecast_body, units, Utc::now())
            .inspect_err(|err| warn!(lang, error = %err, "received malformed weather data"))?;

        debug!(city = %info.city, condition = %info.condition, "weather updated");
        Ok(info)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherMap
    }

    async fn get_custom_weather(&self, id: &str, units: Units) -> Result<WeatherInfo, WeatherError> {
        self.handle_weather_request(vec![("id", id.to_string())], units).await
    }

    async fn get_location_weather(
        &self,
        location: Coordinates,
        units: Units,
    ) -> Result<WeatherInfo, WeatherError> {
        self.handle_weather_request(location.query_pairs().to_vec(), units).await
    }

    async fn get_locations(&self, input: &str) -> Result<Vec<WeatherLocation>, WeatherError> {
        if self.api_key.trim().is_empty() {
            return Err(WeatherError::MissingApiKey(ProviderId::OpenWeatherMap));
        }

        let query = [
            ("q", input.to_string()),
            ("mode", "json".to_string()),
            ("lang", self.language_code().to_string()),
            ("appid", self.api_key.clone()),
        ];
        let body = retrieve(
            &self.http,
            ProviderId::OpenWeatherMap,
            "find",
            &format!("{}/data/2.5/find", self.base_url),
            &query,
        )
        .await?;

        parse_locations(&body)
            .inspect_err(|err| warn!(input, error = %err, "received malformed location data"))
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

/// Undo the occasional Kelvin reading OpenWeatherMap sends despite a °C/°F request.
///
/// Anything above 170 is taken as Kelvin; 170 °F is hotter than any place on earth.
pub fn sanitize_temperature(value: f64, units: Units) -> f64 {
    if value <= 170.0 {
        return value;
    }

    let celsius = value - 273.15;
    match units {
        Units::Metric => celsius,
        Units::Imperial => celsius * 1.8 + 32.0,
    }
}

fn units_param(units: Units) -> &'static str {
    match units {
        Units::Metric => "metric",
        Units::Imperial => "imperial",
    }
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    #[serde(deserialize_with = "int_or_numeric_string")]
    id: i32,
    main: String,
    icon: String,
}

impl OwmWeather {
    fn condition_code(&self) -> i32 {
        map_condition_icon_to_code(&self.icon, self.id)
    }
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(deserialize_with = "first_element")]
    weather: OwmWeather,
    main: OwmMain,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OwmDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwmDailyEntry {
    #[serde(default)]
    dt: Option<i64>,
    temp: OwmDailyTemp,
    #[serde(deserialize_with = "first_element")]
    weather: OwmWeather,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmFindEntry {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    sys: OwmSys,
}

#[derive(Debug, Deserialize)]
struct OwmFindResponse {
    list: Vec<OwmFindEntry>,
}

fn parse_weather(
    condition_body: &str,
    forecast_body: &str,
    units: Units,
    timestamp: DateTime<Utc>,
) -> Result<WeatherInfo, WeatherError> {
    let current: OwmCurrentResponse = serde_json::from_str(condition_body)
        .map_err(WeatherError::malformed(ProviderId::OpenWeatherMap, "weather"))?;
    let forecast: OwmForecastResponse = serde_json::from_str(forecast_body)
        .map_err(WeatherError::malformed(ProviderId::OpenWeatherMap, "forecast"))?;

    let forecasts = parse_forecasts(ProviderId::OpenWeatherMap, &forecast.list, units, |entry| {
        parse_day(entry, units)
    })?;

    // speeds are m/s in metric mode; the shared metric unit is km/h
    let wind_speed = if units.is_metric() {
        current.wind.speed * 3.6
    } else {
        current.wind.speed
    };

    Ok(WeatherInfo {
        city_id: current.id,
        city: current.name,
        condition_code: current.weather.condition_code(),
        condition: current.weather.main,
        temperature: sanitize_temperature(current.main.temp, units),
        humidity: current.main.humidity,
        wind_speed,
        wind_direction: current.wind.deg.map_or(0, |deg| deg as i32),
        units,
        forecasts,
        timestamp,
    })
}

fn parse_day(entry: &Value, units: Units) -> Result<DayForecast, serde_json::Error> {
    let day = OwmDailyEntry::deserialize(entry)?;

    let date = day
        .dt
        .and_then(|dt| DateTime::from_timestamp(dt, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    Ok(DayForecast {
        low: sanitize_temperature(day.temp.min, units),
        high: sanitize_temperature(day.temp.max, units),
        condition_code: day.weather.condition_code(),
        condition: day.weather.main,
        date,
        units,
    })
}

fn parse_locations(body: &str) -> Result<Vec<WeatherLocation>, WeatherError> {
    let parsed: OwmFindResponse = serde_json::from_str(body)
        .map_err(WeatherError::malformed(ProviderId::OpenWeatherMap, "location"))?;

    Ok(parsed
        .list
        .into_iter()
        .map(|entry| WeatherLocation {
            id: entry.id,
            city: entry.name,
            country_id: entry.sys.country,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current_json() -> String {
        json!({
            "id": 2950159,
            "name": "Berlin",
            "weather": [{ "id": 802, "main": "Clouds", "icon": "03d" }],
            "main": { "temp": 21.5, "humidity": 64 },
            "wind": { "speed": 5.0, "deg": 240 }
        })
        .to_string()
    }

    fn day_json(dt: i64, min: f64, max: f64, id: i32) -> Value {
        json!({
            "dt": dt,
            "temp": { "min": min, "max": max },
            "weather": [{ "id": id, "main": "Rain", "icon": "10d" }]
        })
    }

    #[test]
    fn sanitize_passes_through_plausible_values() {
        assert_eq!(sanitize_temperature(21.5, Units::Metric), 21.5);
        assert_eq!(sanitize_temperature(170.0, Units::Imperial), 170.0);
        assert_eq!(sanitize_temperature(-40.0, Units::Imperial), -40.0);
    }

    #[test]
    fn sanitize_converts_kelvin() {
        let c = sanitize_temperature(293.15, Units::Metric);
        assert!((c - 20.0).abs() < 1e-9);

        let f = sanitize_temperature(293.15, Units::Imperial);
        assert!((f - 68.0).abs() < 1e-9);

        let just_above = sanitize_temperature(170.5, Units::Metric);
        assert!((just_above - (170.5 - 273.15)).abs() < 1e-9);
    }

    #[test]
    fn parses_current_and_forecast() {
        let forecast = json!({ "list": [day_json(1_700_000_000, 280.15, 18.0, 500)] }).to_string();
        let now = Utc::now();

        let info = parse_weather(&current_json(), &forecast, Units::Metric, now).expect("valid payload");

        assert_eq!(info.city_id, "2950159");
        assert_eq!(info.city, "Berlin");
        assert_eq!(info.condition, "Clouds");
        assert_eq!(info.condition_code, 28);
        assert_eq!(info.temperature, 21.5);
        assert_eq!(info.humidity, 64.0);
        assert!((info.wind_speed - 18.0).abs() < 1e-9);
        assert_eq!(info.wind_direction, 240);
        assert_eq!(info.timestamp, now);

        assert_eq!(info.forecasts.len(), FORECAST_DAYS);
        let first = &info.forecasts[0];
        assert!((first.low - 7.0).abs() < 1e-9);
        assert_eq!(first.high, 18.0);
        assert_eq!(first.condition_code, 11);
        assert_eq!(first.date, "2023-11-14");
        assert!(info.forecasts[1..].iter().all(DayForecast::is_dummy));
    }

    #[test]
    fn imperial_keeps_wind_speed_and_defaults_direction() {
        let current = json!({
            "id": "42",
            "name": "Austin",
            "weather": [{ "id": 800, "main": "Clear", "icon": "01d" }],
            "main": { "temp": 300.0, "humidity": 30 },
            "wind": { "speed": 7.5 }
        })
        .to_string();
        let forecast = json!({ "list": [day_json(0, 60.0, 80.0, 800)] }).to_string();

        let info = parse_weather(&current, &forecast, Units::Imperial, Utc::now()).unwrap();

        assert_eq!(info.wind_speed, 7.5);
        assert_eq!(info.wind_direction, 0);
        assert!((info.temperature - 80.33).abs() < 1e-9);
        assert_eq!(info.units, Units::Imperial);
    }

    #[test]
    fn missing_weather_entry_marks_day_as_dummy() {
        let forecast = json!({
            "list": [
                day_json(1_700_000_000, 1.0, 2.0, 600),
                { "dt": 1_700_086_400, "temp": { "min": 1.0, "max": 2.0 }, "weather": [] },
            ]
        })
        .to_string();

        let info = parse_weather(&current_json(), &forecast, Units::Metric, Utc::now()).unwrap();

        assert_eq!(info.forecasts[0].condition_code, 14);
        assert!(info.forecasts[1].is_dummy());
    }

    #[test]
    fn only_first_weather_entry_is_read() {
        let current = json!({
            "id": 2950159,
            "name": "Berlin",
            "weather": [{ "id": 500, "main": "Rain", "icon": "10d" }, { "id": 701 }],
            "main": { "temp": 21.5, "humidity": 64 },
            "wind": { "speed": 5.0, "deg": 240.6 }
        })
        .to_string();
        let forecast = json!({
            "list": [{
                "dt": 1_700_000_000,
                "temp": { "min": 1.0, "max": 2.0 },
                "weather": [{ "id": "800", "main": "Clear", "icon": "01d" }, { "id": 701 }]
            }]
        })
        .to_string();

        let info = parse_weather(&current, &forecast, Units::Metric, Utc::now()).expect("valid payload");

        assert_eq!(info.condition_code, 11);
        assert_eq!(info.wind_direction, 240);
        assert!(!info.forecasts[0].is_dummy());
        assert_eq!(info.forecasts[0].condition_code, 32);
    }

    #[test]
    fn empty_forecast_fails_whole_request() {
        let forecast = json!({ "list": [] }).to_string();
        let err = parse_weather(&current_json(), &forecast, Units::Metric, Utc::now()).unwrap_err();

        assert!(matches!(err, WeatherError::EmptyForecast));
    }

    #[test]
    fn current_without_weather_is_malformed() {
        let current = json!({
            "id": 1, "name": "X", "weather": [],
            "main": { "temp": 1.0, "humidity": 1 }, "wind": { "speed": 1.0 }
        })
        .to_string();
        let forecast = json!({ "list": [day_json(0, 1.0, 2.0, 800)] }).to_string();

        let err = parse_weather(&current, &forecast, Units::Metric, Utc::now()).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed { what: "weather", .. }));
    }

    #[test]
    fn parses_location_search() {
        let body = json!({
            "list": [
                { "id": 2643743, "name": "London", "sys": { "country": "GB" } },
                { "id": 6058560, "name": "London", "sys": { "country": "CA" } }
            ]
        })
        .to_string();

        let locations = parse_locations(&body).unwrap();

        assert_eq!(locations.len(), 2);
        assert_eq!(
            locations[1],
            WeatherLocation { id: "6058560".into(), city: "London".into(), country_id: "CA".into() }
        );
    }

    #[test]
    fn language_code_follows_locale() {
        let provider = OpenWeatherMapProvider::new("KEY".into(), "es-ES".into());
        assert_eq!(provider.language_code(), "sp");

        let provider = OpenWeatherMapProvider::new("KEY".into(), "zh-TW".into());
        assert_eq!(provider.language_code(), "zh_tw");
    }
}
