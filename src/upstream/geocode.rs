//! Geocoding provider client

use crate::records::mappers::{location_from_geocode, GeocodeResponse};
use crate::records::Record;
use crate::Result;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Client for the geocoding API
pub struct GeocodeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEOCODE_URL.to_string(),
        }
    }

    /// Point the client at a different provider URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Geocode a free-text search and map the first match to a location record
    pub async fn fetch(&self, search_query: &str) -> Result<Record> {
        tracing::debug!(search_query, "Geocoding upstream request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("address", search_query), ("key", &self.api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Geocode request failed ({})", status).into());
        }

        let payload: GeocodeResponse = response.json().await?;
        location_from_geocode(search_query, &payload)
    }
}
