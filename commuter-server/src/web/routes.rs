//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::digitraffic::FeedError;
use crate::domain::{Coordinate, StationCode};
use crate::favorites::{FavoriteTrainData, FavoriteUpdate};

use super::dto::*;
use super::state::AppState;

const DEFAULT_NEAREST: usize = 5;
const MAX_NEAREST: usize = 20;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(stations))
        .route("/api/stations/nearest", get(nearest_stations))
        .route("/api/trains", get(trains))
        .route("/api/favorites", get(list_favorites))
        .route(
            "/api/favorites/:train_number",
            get(get_favorite)
                .put(put_favorite)
                .patch(patch_favorite)
                .delete(delete_favorite),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All passenger stations.
async fn stations(State(state): State<AppState>) -> Result<Json<StationsResponse>, AppError> {
    let stations = state.departures.stations().await?;
    Ok(Json(StationsResponse {
        stations: stations.as_ref().clone(),
    }))
}

/// Stations closest to a coordinate.
async fn nearest_stations(
    State(state): State<AppState>,
    Query(req): Query<NearestRequest>,
) -> Result<Json<NearestResponse>, AppError> {
    if !req.lat.is_finite() || !req.lon.is_finite() {
        return Err(AppError::BadRequest {
            message: "lat and lon must be finite numbers".to_string(),
        });
    }

    let limit = req.limit.unwrap_or(DEFAULT_NEAREST).min(MAX_NEAREST);
    let nearby = state
        .departures
        .nearest_stations(Coordinate::new(req.lat, req.lon), limit)
        .await?;

    Ok(Json(NearestResponse {
        stations: nearby.iter().filter_map(NearbyStationResult::from_nearby).collect(),
    }))
}

/// Departures from origin to destination.
///
/// Favorited trains get their stored track compared against the freshly
/// resolved one, so a moved track is flagged in the same response.
async fn trains(
    State(state): State<AppState>,
    Query(req): Query<TrainsRequest>,
) -> Result<Json<TrainsResponse>, AppError> {
    let origin = parse_station("origin", &req.origin)?;
    let destination = parse_station("destination", &req.destination)?;
    if origin == destination {
        return Err(AppError::BadRequest {
            message: "Origin and destination must differ".to_string(),
        });
    }

    let journeys = state.departures.journeys(&origin, &destination).await?;
    state.favorites.initialize().await;

    let now = Utc::now();
    let mut results = Vec::with_capacity(journeys.len());
    for journey in &journeys {
        let train_number = journey.train_number();
        let mut favorite = state.favorites.get(train_number);

        let update = match (&favorite, &journey.track) {
            (Some(stored), Some(info)) => stored.track_update(info),
            _ => None,
        };
        if let Some(update) = update {
            debug!(train_number, ?update, "updating favorite track");
            favorite = state.favorites.update(train_number, update).await;
        }

        results.push(JourneyResult::from_journey(journey, favorite.as_ref(), now));
    }

    Ok(Json(TrainsResponse {
        origin: origin.to_string(),
        destination: destination.to_string(),
        journeys: results,
    }))
}

async fn list_favorites(State(state): State<AppState>) -> Json<FavoritesResponse> {
    Json(FavoritesResponse {
        favorites: state.favorites.get_all().await,
    })
}

async fn get_favorite(
    State(state): State<AppState>,
    Path(train_number): Path<String>,
) -> Result<Json<FavoriteTrainData>, AppError> {
    check_train_number(&train_number)?;
    state.favorites.initialize().await;
    state
        .favorites
        .get(&train_number)
        .map(Json)
        .ok_or_else(|| not_favorited(&train_number))
}

/// Create or replace a favorite.
async fn put_favorite(
    State(state): State<AppState>,
    Path(train_number): Path<String>,
    Json(data): Json<FavoriteTrainData>,
) -> Result<Json<FavoriteTrainData>, AppError> {
    check_train_number(&train_number)?;
    state.favorites.set(&train_number, data.clone()).await;
    Ok(Json(data))
}

/// Merge fields into an existing favorite.
async fn patch_favorite(
    State(state): State<AppState>,
    Path(train_number): Path<String>,
    Json(update): Json<FavoriteUpdate>,
) -> Result<Json<FavoriteTrainData>, AppError> {
    check_train_number(&train_number)?;
    state
        .favorites
        .update(&train_number, update)
        .await
        .map(Json)
        .ok_or_else(|| not_favorited(&train_number))
}

async fn delete_favorite(
    State(state): State<AppState>,
    Path(train_number): Path<String>,
) -> Result<StatusCode, AppError> {
    check_train_number(&train_number)?;
    if state.favorites.remove(&train_number).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_favorited(&train_number))
    }
}

fn parse_station(field: &str, value: &str) -> Result<StationCode, AppError> {
    StationCode::parse_normalized(value).map_err(|_| AppError::BadRequest {
        message: format!("Invalid {field} station code: {value}"),
    })
}

/// Train numbers are short ASCII digit strings.
fn check_train_number(train_number: &str) -> Result<(), AppError> {
    let valid = !train_number.is_empty()
        && train_number.len() <= 6
        && train_number.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest {
            message: format!("Invalid train number: {train_number}"),
        })
    }
}

fn not_favorited(train_number: &str) -> AppError {
    AppError::NotFound {
        message: format!("Train {train_number} is not a favorite"),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Unavailable { message: String },
}

impl From<FeedError> for AppError {
    fn from(e: FeedError) -> Self {
        let message = if e.is_rate_limited() {
            "Train data is temporarily rate limited, try again shortly".to_string()
        } else {
            format!("Train data unavailable: {e}")
        };
        AppError::Unavailable { message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            warn!(%status, "{message}");
        } else {
            debug!(%status, "{message}");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
