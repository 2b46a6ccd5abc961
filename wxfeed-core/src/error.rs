use thiserror::Error;

use crate::provider::ProviderId;

/// Failures surfaced by provider operations.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(
        "No API key configured for provider '{0}'.\n\
         Hint: run `wxfeed configure {0}` and enter your API key."
    )]
    MissingApiKey(ProviderId),

    /// Transport failure. The source is stripped of its URL so the API key never leaks.
    #[error("Failed to send request to {provider} ({endpoint})")]
    Http {
        provider: ProviderId,
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} {endpoint} request failed with status {status}: {body}")]
    Status {
        provider: ProviderId,
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Received malformed {what} data from {provider}")]
    Malformed {
        provider: ProviderId,
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty forecasts array")]
    EmptyForecast,

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: ProviderId,
        operation: &'static str,
    },
}

impl WeatherError {
    pub(crate) fn malformed(
        provider: ProviderId,
        what: &'static str,
    ) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| WeatherError::Malformed { provider, what, source }
    }
}
