use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;
use wxfeed_core::{
    Config, Coordinates, ProviderId, Units, WeatherInfo, WeatherLocation, WeatherProvider,
    default_provider_from_config, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxfeed", version, about = "Normalized weather from OpenWeatherMap and Weatherbit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweathermap" or "weatherbit".
        provider: String,

        /// API key; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Make a configured provider the default.
    Use {
        provider: String,
    },

    /// Show current conditions and the 5-day forecast.
    Show {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Provider-specific city id instead of coordinates.
        #[arg(long)]
        id: Option<String>,

        /// Provider to query; defaults to the configured one.
        #[arg(long)]
        provider: Option<String>,

        /// Request °F and mph regardless of the configured units.
        #[arg(long)]
        imperial: bool,

        /// Print the normalized record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search locations by name.
    Search {
        query: String,

        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider, api_key } => configure(&provider, api_key),
            Command::Use { provider } => use_provider(&provider),
            Command::Show { lat, lon, id, provider, imperial, json } => {
                let config = Config::load()?;
                let provider = resolve_provider(provider.as_deref(), &config)?;
                let units = if imperial { Units::Imperial } else { config.units };

                let weather = match (lat, lon, id) {
                    (Some(lat), Some(lon), None) => {
                        provider.get_location_weather(Coordinates::new(lat, lon), units).await?
                    }
                    (None, None, Some(id)) => provider.get_custom_weather(&id, units).await?,
                    _ => bail!("Pass either both --lat and --lon, or --id."),
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&weather)?);
                } else {
                    print_weather(&weather);
                }
                Ok(())
            }
            Command::Search { query, provider, json } => {
                let config = Config::load()?;
                let provider = resolve_provider(provider.as_deref(), &config)?;
                let locations = provider.get_locations(&query).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&locations)?);
                } else {
                    print_locations(&locations);
                }
                Ok(())
            }
        }
    }
}

fn configure(provider: &str, api_key: Option<String>) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => inquire::Password::new(&format!("{id} API key:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };

    if api_key.trim().is_empty() {
        bail!("API key must not be empty.");
    }

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;
    info!(provider = %id, "stored API key");

    println!("Saved API key for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

fn use_provider(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if !config.is_provider_configured(id) {
        bail!("Provider '{id}' has no API key yet.\nHint: run `wxfeed configure {id}` first.");
    }

    config.set_default_provider(id);
    config.save()?;

    println!("Default provider is now {id}");
    Ok(())
}

fn resolve_provider(
    requested: Option<&str>,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    match requested {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, config),
        None => default_provider_from_config(config),
    }
}

fn print_weather(weather: &WeatherInfo) {
    let (temp_unit, speed_unit) = match weather.units {
        Units::Metric => ("°C", "km/h"),
        Units::Imperial => ("°F", "mph"),
    };

    println!("{} ({})", weather.city, weather.city_id);
    println!(
        "  {}  {:.1}{temp_unit}  humidity {:.0}%  wind {:.1} {speed_unit} @ {}°",
        weather.condition,
        weather.temperature,
        weather.humidity,
        weather.wind_speed,
        weather.wind_direction,
    );

    for day in &weather.forecasts {
        if day.is_dummy() {
            println!("  {:<10}  n/a", day.date);
            continue;
        }
        println!(
            "  {:<10}  {:>5.1} / {:>5.1}{temp_unit}  {}",
            day.date, day.low, day.high, day.condition
        );
    }

    println!(
        "  fetched {}",
        weather.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
}

fn print_locations(locations: &[WeatherLocation]) {
    if locations.is_empty() {
        println!("No locations found.");
        return;
    }

    for location in locations {
        println!("{:>10}  {}, {}", location.id, location.city, location.country_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["wxfeed", "show", "--lat", "-33.87", "--lon", "151.21", "--imperial"])
            .expect("arguments must parse");

        match cli.command {
            Command::Show { lat, lon, imperial, .. } => {
                assert_eq!(lat, Some(-33.87));
                assert_eq!(lon, Some(151.21));
                assert!(imperial);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn resolve_provider_rejects_unknown_name() {
        let err = resolve_provider(Some("darksky"), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }
}
