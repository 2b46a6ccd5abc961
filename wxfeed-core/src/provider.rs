use crate::{
    Config,
    error::WeatherError,
    language::{LanguageMapping, resolve_language_code},
    model::{Coordinates, Units, WeatherInfo, WeatherLocation},
    provider::{openweathermap::OpenWeatherMapProvider, weatherbit::WeatherbitProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{
    Deserialize, Deserializer,
    de::{self, IgnoredAny, SeqAccess, Visitor},
};
use std::{convert::TryFrom, fmt, fmt::Debug, marker::PhantomData};
use tracing::debug;

pub mod openweathermap;
pub mod weatherbit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeatherMap,
    Weatherbit,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeatherMap => "openweathermap",
            ProviderId::Weatherbit => "weatherbit",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeatherMap, ProviderId::Weatherbit]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweathermap" | "owm" => Ok(ProviderId::OpenWeatherMap),
            "weatherbit" => Ok(ProviderId::Weatherbit),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweathermap, weatherbit."
            )),
        }
    }
}

/// A source of normalized weather data.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Weather for a provider-specific city id.
    async fn get_custom_weather(&self, id: &str, units: Units) -> Result<WeatherInfo, WeatherError>;

    /// Weather for a coordinate pair.
    async fn get_location_weather(
        &self,
        location: Coordinates,
        units: Units,
    ) -> Result<WeatherInfo, WeatherError>;

    /// Search locations by free-form name.
    async fn get_locations(&self, input: &str) -> Result<Vec<WeatherLocation>, WeatherError>;

    fn language_mapping(&self) -> LanguageMapping;

    /// Locale the provider resolves its request language from, e.g. `de-DE`.
    fn locale(&self) -> &str;

    /// Whether a failed fetch is worth repeating.
    fn should_retry(&self) -> bool;

    fn language_code(&self) -> &'static str {
        resolve_language_code(self.locale(), self.language_mapping())
    }
}

/// Issue a GET and return the body of a 200 response.
pub(crate) async fn retrieve(
    http: &Client,
    provider: ProviderId,
    endpoint: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, WeatherError> {
    debug!(%provider, endpoint, url, "request");

    let send_err = |source: reqwest::Error| WeatherError::Http {
        provider,
        endpoint,
        source: source.without_url(),
    };

    let res = http.get(url).query(query).send().await.map_err(send_err)?;

    let status = res.status();
    let body = res.text().await.map_err(send_err)?;

    if status != reqwest::StatusCode::OK {
        debug!(%provider, endpoint, %status, "unexpected status");
        return Err(WeatherError::Status {
            provider,
            endpoint,
            status,
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

/// Ids arrive as JSON numbers or strings depending on endpoint; keep them as text.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

/// Condition ids as JSON numbers or numeric strings; fractional values truncate.
pub(crate) fn int_or_numeric_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n as f64,
        Raw::Float(n) => n,
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                <D::Error as de::Error>::invalid_value(de::Unexpected::Str(&s), &"a numeric id")
            })?,
    };

    Ok(value as i32)
}

/// Decode the first element of a JSON array and skip the rest unparsed.
///
/// An empty array is a data error.
pub(crate) fn first_element<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct FirstElement<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for FirstElement<T> {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-empty array")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<T, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let first = seq
                .next_element()?
                .ok_or_else(|| <A::Error as de::Error>::invalid_length(0, &self))?;
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(first)
        }
    }

    deserializer.deserialize_seq(FirstElement(PhantomData))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config
        .provider_api_key(id)
        .ok_or(WeatherError::MissingApiKey(id))?;
    let locale = config.locale();

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeatherMap => {
            Box::new(OpenWeatherMapProvider::new(api_key.to_owned(), locale.to_owned()))
        }
        ProviderId::Weatherbit => {
            Box::new(WeatherbitProvider::new(api_key.to_owned(), locale.to_owned()))
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}
