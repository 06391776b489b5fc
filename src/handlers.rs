use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;
use tera::Context;
use tracing::{debug, error, info, warn};

use crate::error::CountryVizError;
use crate::models::Country;
use crate::pipeline::{self, FilterState, PopulationBucket, REGIONS, REVEAL_STEP};
use crate::state::AppState;

/// Query parameters for the country list page.
#[derive(Debug, Deserialize)]
pub struct CountryListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub population: Option<PopulationBucket>,
    /// Current reveal count; "Load More" links carry `show + 10`.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub show: Option<usize>,
}

/// Form body for the favorite toggle.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    /// Where to send the browser back to after toggling.
    pub next: Option<String>,
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn empty_string_as_none_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Ok(Some(s)),
    }
}

fn render_template(
    tera: &tera::Tera,
    template: &str,
    context: &Context,
) -> Result<Html<String>, (StatusCode, &'static str)> {
    tera.render(template, context).map(Html).map_err(|e| {
        error!("Template render error for '{}': {}", template, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Render error")
    })
}

/// Renders the generic failure page. `retry` shows the manual refresh
/// button used by the catalog-load failure path.
fn error_page(
    state: &AppState,
    status: StatusCode,
    message: &str,
    retry: bool,
    favorites_count: usize,
) -> Response {
    let mut context = Context::new();
    context.insert("message", message);
    context.insert("retry", &retry);
    context.insert("favorites_count", &favorites_count);
    match render_template(&state.tera, "error.html", &context) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Tera filter rendering population counts: comma-grouped by default,
/// "38.0M" style with `compact=true` for millions and up.
pub fn format_population(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let population = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("population filter expects a non-negative integer"))?;
    let compact = args.get("compact").and_then(Value::as_bool).unwrap_or(false);

    let text = if compact && population >= 1_000_000 {
        format!("{:.1}M", population as f64 / 1_000_000.0)
    } else {
        group_digits(population)
    };
    Ok(Value::String(text))
}

fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn join_languages(country: &Country) -> String {
    country
        .languages
        .as_ref()
        .map(|languages| languages.values().join(", "))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}

fn join_currencies(country: &Country) -> String {
    country
        .currencies
        .as_ref()
        .map(|currencies| {
            currencies
                .values()
                .map(|c| {
                    if c.symbol.is_empty() {
                        c.name.clone()
                    } else {
                        format!("{} ({})", c.name, c.symbol)
                    }
                })
                .join(", ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}

fn join_timezones(country: &Country) -> String {
    country
        .timezones
        .as_ref()
        .map(|timezones| timezones.iter().join(", "))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}

/// GET / - Searchable, filterable country list.
pub async fn country_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountryListQuery>,
) -> Response {
    let (favorites_count, fav_codes) = {
        let favorites = state.favorites.read().await;
        let codes: Vec<String> = favorites.list().iter().map(|c| c.cca3.clone()).collect();
        (favorites.len(), codes)
    };

    let catalog_guard = state.catalog.read().await;
    let Some(countries) = catalog_guard.as_ref() else {
        drop(catalog_guard);
        return error_page(
            &state,
            StatusCode::SERVICE_UNAVAILABLE,
            "Failed to load countries. Please try again later.",
            true,
            favorites_count,
        );
    };

    let reveal = query.show.unwrap_or(REVEAL_STEP).max(REVEAL_STEP);
    let filter = FilterState {
        query: query.q.clone().unwrap_or_default(),
        region: query.region.clone().unwrap_or_else(|| "All".to_string()),
        bucket: query.population.unwrap_or_default(),
        reveal,
    };

    let outcome = pipeline::apply(countries, &filter);
    let total = countries.len();
    let displayed: Vec<Country> = outcome.displayed.iter().map(|c| (*c).clone()).collect();
    let matched = outcome.matched;
    drop(catalog_guard);

    let mut context = Context::new();
    context.insert("countries", &displayed);
    context.insert("shown", &displayed.len());
    context.insert("matched", &matched);
    context.insert("total", &total);
    context.insert("q", &filter.query);
    context.insert("region", &filter.region);
    context.insert("bucket", filter.bucket.as_str());
    context.insert("regions", &REGIONS);
    context.insert("show", &reveal);
    context.insert("next_show", &(reveal + REVEAL_STEP));
    context.insert("fav_codes", &fav_codes);
    context.insert("favorites_count", &favorites_count);

    match render_template(&state.tera, "countries.html", &context) {
        Ok(html) => html.into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /country/{code} - Detail page with live weather for the capital.
pub async fn country_detail(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    let (favorites_count, is_favorite) = {
        let favorites = state.favorites.read().await;
        (favorites.len(), favorites.is_favorite(&code))
    };

    let country = match state.gateway.fetch_country_by_code(&code).await {
        Ok(country) => country,
        Err(CountryVizError::NotFound(_)) => {
            return error_page(
                &state,
                StatusCode::NOT_FOUND,
                "Country not found",
                false,
                favorites_count,
            );
        }
        Err(e) => {
            error!("Failed to fetch country {code}: {e}");
            return error_page(
                &state,
                StatusCode::BAD_GATEWAY,
                "Failed to load country details.",
                false,
                favorites_count,
            );
        }
    };

    // Weather is independent of the country fetch; any failure here only
    // degrades the weather panel.
    let mut weather = None;
    let mut weather_error: Option<&str> = None;
    if let Some(capital) = country.capital.first() {
        match state.gateway.fetch_weather_by_city(capital).await {
            Ok(data) => weather = Some(data),
            Err(e) => {
                warn!("Weather fetch for {capital} failed: {e}");
                weather_error = Some("Weather data unavailable");
            }
        }
    }

    let mut context = Context::new();
    context.insert("country", &country);
    context.insert("is_favorite", &is_favorite);
    context.insert("languages", &join_languages(&country));
    context.insert("currencies", &join_currencies(&country));
    context.insert("timezones", &join_timezones(&country));
    if let Some(data) = &weather {
        context.insert("weather", data);
        context.insert("weather_temp", &(data.main.temp.round() as i64));
        context.insert("weather_feels_like", &(data.main.feels_like.round() as i64));
    }
    context.insert("weather_error", &weather_error);
    context.insert("favorites_count", &favorites_count);

    match render_template(&state.tera, "country.html", &context) {
        Ok(html) => html.into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /favorites - Saved countries in insertion order.
pub async fn favorites_page(State(state): State<Arc<AppState>>) -> Response {
    let favorites = state.favorites.read().await;
    let fav_codes: Vec<String> = favorites.list().iter().map(|c| c.cca3.clone()).collect();

    let mut context = Context::new();
    context.insert("countries", favorites.list());
    context.insert("fav_codes", &fav_codes);
    context.insert("favorites_count", &favorites.len());
    drop(favorites);

    match render_template(&state.tera, "favorites.html", &context) {
        Ok(html) => html.into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /country/{code}/favorite - Toggle membership, then bounce back.
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Response {
    let snapshot = {
        let catalog = state.catalog.read().await;
        catalog
            .as_ref()
            .and_then(|countries| countries.iter().find(|c| c.cca3 == code).cloned())
    };

    // Favorites hold full snapshots; if the catalog cannot supply one
    // (toggled from a detail page while the catalog is unloaded), fall back
    // to a direct fetch.
    let snapshot = match snapshot {
        Some(country) => Some(country),
        None => match state.gateway.fetch_country_by_code(&code).await {
            Ok(country) => Some(country),
            Err(e) => {
                error!("Cannot resolve country {code} for favorite toggle: {e}");
                None
            }
        },
    };

    if let Some(country) = snapshot {
        let name = country.name.common.clone();
        let now_favorite = state.favorites.write().await.toggle(country);
        debug!(
            "{} favorite: {name}",
            if now_favorite { "Added" } else { "Removed" }
        );
    }

    // Only ever redirect within the app.
    let next = form
        .next
        .as_deref()
        .filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or("/");
    Redirect::to(next).into_response()
}

/// POST /refresh - Manual catalog retry from the failure page.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Redirect {
    match state.refresh_catalog().await {
        Ok(count) => info!("Catalog refreshed manually ({count} countries)"),
        Err(e) => error!("Manual catalog refresh failed: {e}"),
    }
    Redirect::to("/")
}
