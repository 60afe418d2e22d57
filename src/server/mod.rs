//! HTTP routing layer
//!
//! Thin translation between request parameters and resource descriptors.
//! All the caching behavior lives below in the orchestrator; this layer only
//! builds descriptors, serializes records, and hides internal error detail
//! behind a generic failure message.

use crate::orchestrator::Orchestrator;
use crate::records::{Record, ResourceDescriptor};
use crate::{CityScoutError, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;

/// Generic body sent for every internal failure; details stay in the logs
const GENERIC_ERROR_BODY: &str = "Sorry, something went wrong";

/// Internal failure surfaced as a bare 500
///
/// Full error detail is logged server-side; the caller only ever sees the
/// generic message.
pub struct ApiError(CityScoutError);

impl From<CityScoutError> for ApiError {
    fn from(err: CityScoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_BODY).into_response()
    }
}

/// Build the application router
pub fn router(orchestrator: Orchestrator) -> Router {
    Router::new()
        .route("/location", get(get_location))
        .route("/weather", get(get_weather))
        .route("/events", get(get_events))
        .with_state(orchestrator)
}

/// Bind and serve until the process exits
pub async fn run(orchestrator: Orchestrator, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr, "CityScout backend is up");
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct LocationQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    location_id: i64,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    location_id: i64,
    formatted_query: String,
}

/// GET /location?q=Seattle — resolve a search string to one location
async fn get_location(
    State(orchestrator): State<Orchestrator>,
    Query(params): Query<LocationQuery>,
) -> std::result::Result<Json<Record>, ApiError> {
    let descriptor = ResourceDescriptor::location(params.q);
    let records = orchestrator.resolve(&descriptor).await?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| CityScoutError::NoData("location".to_string()))?;
    Ok(Json(record))
}

/// GET /weather?location_id=5&latitude=..&longitude=.. — daily forecast rows
async fn get_weather(
    State(orchestrator): State<Orchestrator>,
    Query(params): Query<WeatherQuery>,
) -> std::result::Result<Json<Vec<Record>>, ApiError> {
    let descriptor =
        ResourceDescriptor::weather(params.location_id, params.latitude, params.longitude);
    let records = orchestrator.resolve(&descriptor).await?;
    Ok(Json(records))
}

/// GET /events?location_id=5&formatted_query=.. — events near a location
async fn get_events(
    State(orchestrator): State<Orchestrator>,
    Query(params): Query<EventsQuery>,
) -> std::result::Result<Json<Vec<Record>>, ApiError> {
    let descriptor = ResourceDescriptor::events(params.location_id, params.formatted_query);
    let records = orchestrator.resolve(&descriptor).await?;
    Ok(Json(records))
}
