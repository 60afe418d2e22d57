//! CityScout - Cache-aside backend for location-based queries
//!
//! CityScout answers geocoding, weather, and event queries by consulting a
//! persistent SQLite cache first and, on a miss or expiry, fetching from the
//! upstream provider, normalizing the payload, and writing it back before
//! responding.
//!
//! # Architecture
//!
//! - **records**: resource types, the closed record union, schema
//!   descriptors, and pure upstream-payload mappers
//! - **store**: storage gateway building parameterized statements from
//!   schema descriptors
//! - **freshness**: per-resource-type timeout table and eager eviction
//! - **orchestrator**: the read → decide → fetch → persist → respond flow
//! - **upstream**: provider clients (geocode, forecast, events)
//! - **server**: axum routing layer
//! - **config**: YAML configuration with environment overrides

// Core modules
pub mod error;
pub mod freshness;
pub mod records;
pub mod store;

// Components
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod server;
pub mod upstream;

// Re-exports
pub use error::{CityScoutError, Result};
