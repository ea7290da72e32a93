use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use commuter_server::cache::CacheConfig;
use commuter_server::config::AppConfig;
use commuter_server::departures::{Departures, Feed};
use commuter_server::digitraffic::{DigitrafficClient, FixtureFeed};
use commuter_server::favorites::{FavoritesStore, JsonFileKv, RecordDir};
use commuter_server::web::{AppState, Favorites, create_router};

/// How often expired favorites are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Create the feed
    let feed = match &config.fixture_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "serving fixture data");
            Feed::Fixture(FixtureFeed::load(dir)?)
        }
        None => Feed::Live(DigitrafficClient::new(config.digitraffic())?),
    };
    let departures = Departures::new(feed, &CacheConfig::default());

    // Favorites storage
    let favorites: Favorites = FavoritesStore::new(
        RecordDir::new(config.records_dir()),
        JsonFileKv::new(config.kv_file()),
    );
    let tier = favorites.initialize().await;
    info!(?tier, dir = %config.favorites_dir.display(), "favorites ready");

    let state = AppState::new(departures, favorites);
    spawn_cleanup(state.favorites.clone());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "commuter server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

/// Sweeps expired favorites once a minute.
fn spawn_cleanup(favorites: Arc<Favorites>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            let removed = favorites.cleanup_expired(Utc::now()).await;
            if removed > 0 {
                info!(removed, "swept expired favorites");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
