use std::env;
use std::path::PathBuf;

use tera::Tera;
use tokio::sync::RwLock;

use crate::error::CountryVizError;
use crate::favorites::FavoritesStore;
use crate::gateway::Gateway;
use crate::models::Country;

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Cron expression for the catalog refresh schedule.
    pub refresh_cron: String,
    /// OpenWeatherMap credential; `None` disables weather lookups.
    pub weather_api_key: Option<String>,
    /// Where the favorites list is persisted.
    pub favorites_path: PathBuf,
}

impl Config {
    /// Creates Config from environment variables with defaults. Empty
    /// values count as unset.
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8201".into()),
            refresh_cron: env::var("REFRESH_CRON").unwrap_or_else(|_| "0 0 0 * * *".into()),
            weather_api_key: non_empty(env::var("WEATHER_API_KEY").ok()),
            favorites_path: env::var("FAVORITES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/favorites.json")),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Shared application state passed to all request handlers.
pub struct AppState {
    /// Template engine for rendering HTML pages.
    pub tera: Tera,
    pub gateway: Gateway,
    /// In-memory country catalog. `None` until the first successful fetch;
    /// a failed refresh keeps whatever was loaded before.
    pub catalog: RwLock<Option<Vec<Country>>>,
    pub favorites: RwLock<FavoritesStore>,
}

impl AppState {
    pub fn new(tera: Tera, gateway: Gateway, favorites: FavoritesStore) -> Self {
        Self {
            tera,
            gateway,
            catalog: RwLock::new(None),
            favorites: RwLock::new(favorites),
        }
    }

    /// Fetches the full catalog and swaps it in. Returns the new count.
    pub async fn refresh_catalog(&self) -> Result<usize, CountryVizError> {
        let countries = self.gateway.fetch_all_countries().await?;
        let count = countries.len();
        *self.catalog.write().await = Some(countries);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_env_values_count_as_unset() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("key".into())), Some("key".into()));
    }
}
