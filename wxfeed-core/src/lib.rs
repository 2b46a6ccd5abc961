//! Core library for `wxfeed`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The `WeatherProvider` abstraction with OpenWeatherMap and Weatherbit clients
//! - Normalized weather records and the shared condition-code table
//!
//! It is used by `wxfeed-cli`, but can also be reused by other binaries or services.

pub mod condition;
pub mod config;
pub mod error;
pub mod forecast;
pub mod language;
pub mod model;
pub mod provider;

pub use condition::{UNKNOWN_CONDITION, map_condition_icon_to_code};
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::{Coordinates, DayForecast, FORECAST_DAYS, Units, WeatherInfo, WeatherLocation};
pub use provider::{
    ProviderId, WeatherProvider, default_provider_from_config,
    openweathermap::{OpenWeatherMapProvider, sanitize_temperature},
    provider_from_config,
    weatherbit::WeatherbitProvider,
};
