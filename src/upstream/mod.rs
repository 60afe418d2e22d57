//! Upstream provider clients
//!
//! One client per provider, each holding its own `reqwest::Client` and API
//! key. [`LiveUpstream`] dispatches a descriptor to the right client and is
//! the production implementation of the orchestrator's `Upstream` trait.
//!
//! No timeouts and no retries are configured at this layer; a hung provider
//! call suspends the owning request.

mod events;
mod geocode;
mod weather;

pub use events::EventsClient;
pub use geocode::GeocodeClient;
pub use weather::WeatherClient;

use crate::config::ApiKeys;
use crate::orchestrator::Upstream;
use crate::records::{LookupKey, Record, ResourceDescriptor, ResourceType};
use crate::{CityScoutError, Result};
use async_trait::async_trait;

/// Production upstream: real provider calls, pure mappers
pub struct LiveUpstream {
    geocode: GeocodeClient,
    weather: WeatherClient,
    events: EventsClient,
}

impl LiveUpstream {
    pub fn from_keys(keys: &ApiKeys) -> Self {
        Self {
            geocode: GeocodeClient::new(&keys.geocode),
            weather: WeatherClient::new(&keys.weather),
            events: EventsClient::new(&keys.events),
        }
    }
}

#[async_trait]
impl Upstream for LiveUpstream {
    async fn fetch(&self, descriptor: &ResourceDescriptor) -> Result<Vec<Record>> {
        match descriptor.resource {
            ResourceType::Location => {
                let query = search_query(descriptor)?;
                let record = self.geocode.fetch(query).await?;
                Ok(vec![record])
            }
            ResourceType::Weather => {
                let location_id = location_id(descriptor)?;
                let latitude = descriptor.fetch.latitude.ok_or_else(|| {
                    CityScoutError::Descriptor("weather fetch requires latitude".to_string())
                })?;
                let longitude = descriptor.fetch.longitude.ok_or_else(|| {
                    CityScoutError::Descriptor("weather fetch requires longitude".to_string())
                })?;
                self.weather.fetch(location_id, latitude, longitude).await
            }
            ResourceType::Event => {
                let location_id = location_id(descriptor)?;
                let address = descriptor.fetch.formatted_query.as_deref().ok_or_else(|| {
                    CityScoutError::Descriptor("events fetch requires a formatted address".to_string())
                })?;
                self.events.fetch(location_id, address).await
            }
        }
    }
}

fn search_query(descriptor: &ResourceDescriptor) -> Result<&str> {
    match &descriptor.key {
        LookupKey::SearchQuery(q) => Ok(q),
        LookupKey::LocationId(_) => Err(CityScoutError::Descriptor(
            "location fetch requires a search query key".to_string(),
        )),
    }
}

fn location_id(descriptor: &ResourceDescriptor) -> Result<i64> {
    match &descriptor.key {
        LookupKey::LocationId(id) => Ok(*id),
        LookupKey::SearchQuery(_) => Err(CityScoutError::Descriptor(
            "dependent resource fetch requires a location id key".to_string(),
        )),
    }
}
