//! Remote data gateway - typed fetch functions for the two external APIs.
//!
//! Every operation is a single attempt: no retry, no backoff, no caching.
//! Failures propagate to the caller, which decides what the user sees.

use reqwest::StatusCode;
use tracing::debug;

use crate::error::CountryVizError;
use crate::models::{Country, WeatherData};

const COUNTRIES_BASE_URL: &str = "https://restcountries.com/v3.1";
const WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Field projection for the catalog fetch. Display-only fields (languages,
/// currencies, timezones, subregion) come from the per-code detail fetch.
const CATALOG_FIELDS: &str = "name,cca3,region,capital,population,flags";

pub struct Gateway {
    client: reqwest::Client,
    weather_api_key: Option<String>,
}

impl Gateway {
    pub fn new(weather_api_key: Option<String>) -> Result<Self, CountryVizError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("countryviz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            weather_api_key,
        })
    }

    pub fn has_weather_credentials(&self) -> bool {
        self.weather_api_key.is_some()
    }

    /// Fetches the full country catalog in one request.
    pub async fn fetch_all_countries(&self) -> Result<Vec<Country>, CountryVizError> {
        let url = format!("{COUNTRIES_BASE_URL}/all");
        debug!("Fetching country catalog from {url}");

        let body = self
            .client
            .get(&url)
            .query(&[("fields", CATALOG_FIELDS)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let countries: Vec<Country> = serde_json::from_str(&body)?;
        Ok(countries)
    }

    /// Fetches a single country by its cca3 code.
    ///
    /// The endpoint answers with a single-element array; an empty array or
    /// an HTTP 404 both mean the code is unknown.
    pub async fn fetch_country_by_code(&self, code: &str) -> Result<Country, CountryVizError> {
        let url = format!("{COUNTRIES_BASE_URL}/alpha/{code}");
        debug!("Fetching country {code} from {url}");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CountryVizError::NotFound(code.to_string()));
        }

        let body = response.error_for_status()?.text().await?;
        let countries: Vec<Country> = serde_json::from_str(&body)?;
        countries
            .into_iter()
            .next()
            .ok_or_else(|| CountryVizError::NotFound(code.to_string()))
    }

    /// Fetches current weather for a city, metric units.
    ///
    /// Fails with `MissingApiKey` before any I/O when no credential was
    /// configured.
    pub async fn fetch_weather_by_city(&self, city: &str) -> Result<WeatherData, CountryVizError> {
        let Some(api_key) = self.weather_api_key.as_deref() else {
            return Err(CountryVizError::MissingApiKey);
        };

        let url = format!("{WEATHER_BASE_URL}/weather");
        debug!("Fetching weather for {city}");

        let body = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let weather: WeatherData = serde_json::from_str(&body)?;
        Ok(weather)
    }
}
