//! Freshness policy: per-resource-type timeouts and eager eviction
//!
//! A cached row is fresh while its age since creation stays within its
//! resource type's timeout. Staleness triggers deletion of the whole key's
//! rows as part of evaluation, so the next write starts from a clean slate.

use crate::records::{now_ms, Record, ResourceDescriptor, ResourceType};
use crate::store::Store;
use crate::{CityScoutError, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of a freshness evaluation
#[derive(Debug, PartialEq)]
pub enum Evaluation {
    /// Cached records are within their timeout; serve them as-is
    Fresh(Vec<Record>),
    /// Cached records aged out and have been evicted
    Stale,
    /// Nothing cached for this key
    Empty,
}

/// Static map from resource type to maximum cache age
///
/// Every resource type the orchestrator can be asked about must have an
/// entry; a missing entry is a configuration error, not a runtime fallback.
#[derive(Debug, Clone)]
pub struct TimeoutTable {
    entries: HashMap<ResourceType, Duration>,
}

impl Default for TimeoutTable {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert(ResourceType::Weather, Duration::from_secs(15));
        entries.insert(ResourceType::Event, Duration::from_secs(6 * 60 * 60));
        entries.insert(ResourceType::Location, Duration::from_secs(30 * 24 * 60 * 60));
        Self { entries }
    }
}

impl TimeoutTable {
    /// Build a table from explicit entries
    pub fn new(entries: HashMap<ResourceType, Duration>) -> Self {
        Self { entries }
    }

    /// Timeout for one resource type; absence is a configuration error
    pub fn get(&self, resource: ResourceType) -> Result<Duration> {
        self.entries.get(&resource).copied().ok_or_else(|| {
            CityScoutError::Config(format!("no timeout configured for resource type '{resource}'"))
        })
    }

    /// Verify every known resource type has an entry. Called at startup so a
    /// gap fails the boot, not a request.
    pub fn validate(&self) -> Result<()> {
        for resource in ResourceType::ALL {
            self.get(resource)?;
        }
        Ok(())
    }

    /// Decide whether the cached records for `descriptor` are still usable.
    ///
    /// Only the first record's timestamp is consulted: records sharing a key
    /// are one cache generation with one shared age. On staleness the whole
    /// generation is deleted before returning; a failed deletion is logged
    /// and does not abort the request, which can still fetch fresh data.
    pub fn evaluate(
        &self,
        store: &Store,
        descriptor: &ResourceDescriptor,
        records: Vec<Record>,
    ) -> Result<Evaluation> {
        let Some(first) = records.first() else {
            return Ok(Evaluation::Empty);
        };

        let timeout = self.get(descriptor.resource)?;
        let age_ms = now_ms() - first.created_at();

        tracing::debug!(
            resource = %descriptor.resource,
            age_ms,
            timeout_ms = timeout.as_millis() as i64,
            "Freshness check"
        );

        if age_ms <= timeout.as_millis() as i64 {
            return Ok(Evaluation::Fresh(records));
        }

        if let Err(e) = store.delete_for_key(descriptor) {
            tracing::warn!(
                resource = %descriptor.resource,
                error = %e,
                "Failed to evict stale records"
            );
        }
        Ok(Evaluation::Stale)
    }
}
