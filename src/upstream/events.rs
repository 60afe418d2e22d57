//! Events provider client

use crate::records::mappers::{events_from_search, EventsResponse};
use crate::records::Record;
use crate::Result;

const EVENTS_URL: &str = "https://www.eventbriteapi.com/v3/events/search";

/// Client for the event search API
pub struct EventsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl EventsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: EVENTS_URL.to_string(),
        }
    }

    /// Point the client at a different provider URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search events near a formatted address and map each hit to an event
    /// record owned by `location_id`
    pub async fn fetch(&self, location_id: i64, address: &str) -> Result<Vec<Record>> {
        tracing::debug!(location_id, address, "Events upstream request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("token", self.api_key.as_str()), ("location.address", address)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Events request failed ({})", status).into());
        }

        let payload: EventsResponse = response.json().await?;
        events_from_search(location_id, &payload)
    }
}
