//! Weather forecast provider client

use crate::records::mappers::{weather_from_forecast, ForecastResponse};
use crate::records::Record;
use crate::Result;

const FORECAST_URL: &str = "https://api.darksky.net/forecast";

/// Client for the daily forecast API
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: FORECAST_URL.to_string(),
        }
    }

    /// Point the client at a different provider URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the daily forecast for a coordinate pair and map each day to a
    /// weather record owned by `location_id`
    pub async fn fetch(&self, location_id: i64, latitude: f64, longitude: f64) -> Result<Vec<Record>> {
        let url = format!("{}/{}/{},{}", self.base_url, self.api_key, latitude, longitude);
        tracing::debug!(location_id, latitude, longitude, "Forecast upstream request");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Forecast request failed ({})", status).into());
        }

        let payload: ForecastResponse = response.json().await?;
        weather_from_forecast(location_id, &payload)
    }
}
