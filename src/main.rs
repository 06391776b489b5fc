mod error;
mod favorites;
mod gateway;
mod handlers;
mod models;
mod pipeline;
mod state;

use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    routing::{get, post},
    Router,
};
use tera::Tera;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::favorites::FavoritesStore;
use crate::gateway::Gateway;
use crate::state::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let mut tera = Tera::new("templates/**/*.html").context("failed to parse templates")?;
    tera.register_filter("population", handlers::format_population);

    let gateway = Gateway::new(config.weather_api_key.clone())
        .context("failed to build HTTP client")?;
    if !gateway.has_weather_credentials() {
        warn!("WEATHER_API_KEY not set; detail pages will show weather as unavailable");
    }
    let favorites = FavoritesStore::load(config.favorites_path.clone());
    let state = Arc::new(AppState::new(tera, gateway, favorites));

    // First fetch before serving; a failure is not fatal - the list page
    // offers a manual retry and the scheduler keeps trying.
    match state.refresh_catalog().await {
        Ok(count) => info!("Loaded country catalog ({count} countries)"),
        Err(e) => error!("Initial catalog fetch failed: {e}"),
    }

    let scheduler = JobScheduler::new().await?;
    let job_state = Arc::clone(&state);
    scheduler
        .add(Job::new_async(
            config.refresh_cron.as_str(),
            move |_id, _scheduler| {
                let state = Arc::clone(&job_state);
                Box::pin(async move {
                    match state.refresh_catalog().await {
                        Ok(count) => info!("Refreshed country catalog ({count} countries)"),
                        Err(e) => error!("Scheduled catalog refresh failed: {e}"),
                    }
                })
            },
        )?)
        .await?;
    scheduler.start().await?;

    let app = Router::new()
        .route("/", get(handlers::country_list))
        .route("/country/{code}", get(handlers::country_detail))
        .route("/country/{code}/favorite", post(handlers::toggle_favorite))
        .route("/favorites", get(handlers::favorites_page))
        .route("/refresh", post(handlers::refresh))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
