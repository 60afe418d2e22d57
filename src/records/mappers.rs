//! Pure mapping from upstream provider payloads to cache records
//!
//! These functions perform no I/O. Each one stamps `created_at` with the
//! current time at the moment of mapping, which is the timestamp freshness
//! decisions are made against later. An upstream payload with zero usable
//! entries maps to `NoData`, never to an empty success.

use super::{now_ms, EventRecord, LocationRecord, Record, WeatherRecord};
use crate::{CityScoutError, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

/// Geocoding response (Google geocode shape)
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Forecast response (DarkSky shape)
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub data: Vec<DailyForecast>,
}

#[derive(Debug, Deserialize)]
pub struct DailyForecast {
    pub summary: String,
    /// Epoch seconds of the forecast day
    pub time: i64,
}

/// Event search response (Eventbrite shape)
#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<UpstreamEvent>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamEvent {
    pub url: String,
    pub name: EventName,
    pub start: EventStart,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventName {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EventStart {
    /// Local wall-clock start, e.g. "2026-09-12T19:00:00"
    pub local: String,
}

/// Map a geocode response to a single location record.
/// Only the first match is used.
pub fn location_from_geocode(search_query: &str, response: &GeocodeResponse) -> Result<Record> {
    let first = response
        .results
        .first()
        .ok_or_else(|| CityScoutError::NoData("location".to_string()))?;

    Ok(Record::Location(LocationRecord {
        id: None,
        search_query: search_query.to_string(),
        formatted_query: first.formatted_address.clone(),
        latitude: first.geometry.location.lat,
        longitude: first.geometry.location.lng,
        created_at: now_ms(),
    }))
}

/// Map a forecast response to one weather record per daily entry.
/// All records in the batch share one `created_at` generation.
pub fn weather_from_forecast(location_id: i64, response: &ForecastResponse) -> Result<Vec<Record>> {
    if response.daily.data.is_empty() {
        return Err(CityScoutError::NoData("weather".to_string()));
    }

    let created_at = now_ms();
    Ok(response
        .daily
        .data
        .iter()
        .map(|day| {
            Record::Weather(WeatherRecord {
                location_id,
                forecast: day.summary.clone(),
                time: day_string_from_epoch(day.time),
                created_at,
            })
        })
        .collect())
}

/// Map an event search response to one record per event.
pub fn events_from_search(location_id: i64, response: &EventsResponse) -> Result<Vec<Record>> {
    if response.events.is_empty() {
        return Err(CityScoutError::NoData("event".to_string()));
    }

    let created_at = now_ms();
    Ok(response
        .events
        .iter()
        .map(|event| {
            Record::Event(EventRecord {
                location_id,
                link: event.url.clone(),
                name: event.name.text.clone(),
                event_date: day_string_from_local(&event.start.local),
                summary: event.summary.clone().unwrap_or_default(),
                created_at,
            })
        })
        .collect())
}

/// Format an epoch-seconds timestamp as "Sat Aug 29 2026"
fn day_string_from_epoch(epoch_secs: i64) -> String {
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(dt) => dt.format("%a %b %d %Y").to_string(),
        None => epoch_secs.to_string(),
    }
}

/// Format a local "YYYY-MM-DDTHH:MM:SS" start time as "Sat Aug 29 2026".
/// An unparseable value falls through unchanged.
fn day_string_from_local(local: &str) -> String {
    match NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S") {
        Ok(dt) => dt.format("%a %b %d %Y").to_string(),
        Err(_) => local.to_string(),
    }
}
