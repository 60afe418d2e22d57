//! Cache-aside orchestration
//!
//! Per-request control flow: read the cache, let the freshness policy judge
//! the result, and either answer from cache or fetch upstream, persist the
//! mapped records, and answer with those. Read, fetch, and write are strictly
//! sequential for one request; the response is never produced before every
//! write it initiated has completed.

use crate::freshness::{Evaluation, TimeoutTable};
use crate::records::{Record, ResourceDescriptor};
use crate::store::Store;
use crate::{CityScoutError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Upstream fetch collaborator
///
/// Implementations perform the provider call for a descriptor and run the
/// pure mapper over the payload. Zero usable entries must surface as
/// `NoData`, never as an empty vec.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, descriptor: &ResourceDescriptor) -> Result<Vec<Record>>;
}

/// Ties store, freshness policy, and upstream together per request
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<Store>,
    timeouts: TimeoutTable,
    upstream: Arc<dyn Upstream>,
}

impl Orchestrator {
    pub fn new(store: Arc<Store>, timeouts: TimeoutTable, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            store,
            timeouts,
            upstream,
        }
    }

    /// Resolve a descriptor to its records, from cache when fresh, from
    /// upstream otherwise.
    ///
    /// There is no per-key coordination across concurrent requests: two
    /// simultaneous misses for one key may both fetch and both insert. The
    /// rows land in a single generation and age out together.
    pub async fn resolve(&self, descriptor: &ResourceDescriptor) -> Result<Vec<Record>> {
        let cached = self.store.read(descriptor)?;

        match self.timeouts.evaluate(&self.store, descriptor, cached)? {
            Evaluation::Fresh(records) => {
                tracing::debug!(resource = %descriptor.resource, "Cache hit");
                Ok(records)
            }
            verdict @ (Evaluation::Stale | Evaluation::Empty) => {
                tracing::debug!(
                    resource = %descriptor.resource,
                    stale = matches!(verdict, Evaluation::Stale),
                    "Cache miss, fetching upstream"
                );

                let mapped = self.upstream.fetch(descriptor).await?;
                if mapped.is_empty() {
                    // Upstream implementations already map zero entries to
                    // NoData; an empty vec here is a broken collaborator.
                    return Err(CityScoutError::NoData(descriptor.resource.to_string()));
                }

                let mut stored = Vec::with_capacity(mapped.len());
                for record in mapped {
                    stored.push(self.store.write(descriptor, record)?);
                }

                tracing::info!(
                    resource = %descriptor.resource,
                    rows = stored.len(),
                    "Fetched and persisted"
                );
                Ok(stored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{now_ms, LocationRecord, ResourceType, WeatherRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted upstream: returns a fixed payload and counts calls
    struct ScriptedUpstream {
        records: Vec<Record>,
        calls: AtomicUsize,
    }

    impl ScriptedUpstream {
        fn returning(records: Vec<Record>) -> Self {
            Self {
                records,
                calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self::returning(vec![])
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Upstream for ScriptedUpstream {
        async fn fetch(&self, descriptor: &ResourceDescriptor) -> Result<Vec<Record>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.records.is_empty() {
                return Err(CityScoutError::NoData(descriptor.resource.to_string()));
            }
            Ok(self.records.clone())
        }
    }

    fn orchestrator_with(
        upstream: Arc<ScriptedUpstream>,
    ) -> (Orchestrator, Arc<Store>, Arc<ScriptedUpstream>) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            TimeoutTable::default(),
            upstream.clone() as Arc<dyn Upstream>,
        );
        (orchestrator, store, upstream)
    }

    fn seattle_location() -> Record {
        Record::Location(LocationRecord {
            id: None,
            search_query: "Seattle".to_string(),
            formatted_query: "Seattle, WA, USA".to_string(),
            latitude: 47.6062,
            longitude: -122.3321,
            created_at: now_ms(),
        })
    }

    fn weather_day(location_id: i64, forecast: &str) -> Record {
        Record::Weather(WeatherRecord {
            location_id,
            forecast: forecast.to_string(),
            time: "Thu Jan 01 2026".to_string(),
            created_at: now_ms(),
        })
    }

    #[tokio::test]
    async fn test_miss_fetches_persists_and_attaches_id() {
        let (orchestrator, store, upstream) =
            orchestrator_with(Arc::new(ScriptedUpstream::returning(vec![
                seattle_location(),
            ])));
        let descriptor = ResourceDescriptor::location("Seattle");

        let records = orchestrator.resolve(&descriptor).await.unwrap();

        assert_eq!(upstream.calls(), 1);
        assert_eq!(records.len(), 1);
        match &records[0] {
            Record::Location(loc) => {
                assert!(loc.id.is_some(), "generated id must be attached");
                assert_eq!(loc.search_query, "Seattle");
            }
            _ => unreachable!(),
        }

        // Row actually persisted
        assert_eq!(store.read(&descriptor).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_upstream_and_write() {
        let (orchestrator, store, upstream) =
            orchestrator_with(Arc::new(ScriptedUpstream::empty()));
        let descriptor = ResourceDescriptor::weather(5, 47.6, -122.3);

        // Seed a 10-second-old row against the 15-second weather timeout
        let mut seeded = weather_day(5, "Clear");
        if let Record::Weather(w) = &mut seeded {
            w.created_at = now_ms() - 10_000;
        }
        store.write(&descriptor, seeded.clone()).unwrap();

        let records = orchestrator.resolve(&descriptor).await.unwrap();

        assert_eq!(upstream.calls(), 0, "fresh hit must not call upstream");
        assert_eq!(records, vec![seeded]);
        assert_eq!(store.read(&descriptor).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_hit_evicts_refetches_and_replaces() {
        let (orchestrator, store, upstream) =
            orchestrator_with(Arc::new(ScriptedUpstream::returning(vec![
                weather_day(5, "Fresh forecast"),
                weather_day(5, "Fresh forecast day two"),
            ])));
        let descriptor = ResourceDescriptor::weather(5, 47.6, -122.3);

        // 20-second-old row against the 15-second weather timeout
        let mut stale = weather_day(5, "Old forecast");
        if let Record::Weather(w) = &mut stale {
            w.created_at = now_ms() - 20_000;
        }
        store.write(&descriptor, stale).unwrap();

        let records = orchestrator.resolve(&descriptor).await.unwrap();

        assert_eq!(upstream.calls(), 1);
        assert_eq!(records.len(), 2);

        let persisted = store.read(&descriptor).unwrap();
        assert_eq!(persisted.len(), 2);
        assert!(persisted.iter().all(|r| match r {
            Record::Weather(w) => w.forecast.starts_with("Fresh"),
            _ => false,
        }));
    }

    #[tokio::test]
    async fn test_empty_upstream_is_no_data_and_writes_nothing() {
        let (orchestrator, store, upstream) =
            orchestrator_with(Arc::new(ScriptedUpstream::empty()));
        let descriptor = ResourceDescriptor::events(5, "Seattle, WA, USA");

        let err = orchestrator.resolve(&descriptor).await.unwrap_err();

        assert!(matches!(err, CityScoutError::NoData(_)));
        assert_eq!(upstream.calls(), 1);
        assert!(store.read(&descriptor).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_timeout_entry_aborts_before_fetch() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let upstream = Arc::new(ScriptedUpstream::returning(vec![weather_day(5, "Clear")]));
        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            TimeoutTable::new(std::collections::HashMap::new()),
            upstream.clone() as Arc<dyn Upstream>,
        );

        let descriptor = ResourceDescriptor::weather(5, 47.6, -122.3);
        store.write(&descriptor, weather_day(5, "Seeded")).unwrap();

        let err = orchestrator.resolve(&descriptor).await.unwrap_err();
        assert!(matches!(err, CityScoutError::Config(_)));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_resource_type_display_used_in_no_data() {
        let (orchestrator, _store, _upstream) =
            orchestrator_with(Arc::new(ScriptedUpstream::empty()));
        let descriptor = ResourceDescriptor::events(5, "Seattle, WA, USA");

        let err = orchestrator.resolve(&descriptor).await.unwrap_err();
        assert_eq!(descriptor.resource, ResourceType::Event);
        assert!(err.to_string().contains("event"));
    }
}
