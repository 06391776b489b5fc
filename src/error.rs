//! Error types for the countryviz application.

use thiserror::Error;

/// Failures surfaced by the remote data gateway and the surrounding app.
///
/// Handlers translate these into generic user-facing messages; the variant
/// itself is only ever logged.
#[derive(Debug, Error)]
pub enum CountryVizError {
    /// Transport-level failure talking to an external API.
    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote responded, but the body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The requested country does not exist upstream.
    #[error("country not found: {0}")]
    NotFound(String),

    /// Weather lookups require `WEATHER_API_KEY`; it was not configured.
    #[error("weather API key not configured")]
    MissingApiKey,
}
