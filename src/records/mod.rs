//! Core data model: resource types, cache records, and schema descriptors
//!
//! Every cacheable resource is one variant of the closed [`Record`] union.
//! The storage layer never inspects variant internals; it works off each
//! type's [`SchemaDescriptor`] and the ordered field list produced by
//! [`Record::fields_for_storage`].

pub mod mappers;

use chrono::Utc;
use rusqlite::types::ToSqlOutput;
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current time as epoch milliseconds, the unit all `created_at` fields use.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A named category of cacheable data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Location,
    Weather,
    Event,
}

impl ResourceType {
    /// Every resource type the orchestrator can be asked about.
    /// The timeout table is validated against this list at startup.
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Location,
        ResourceType::Weather,
        ResourceType::Event,
    ];

    /// Singular lowercase tag; table names are this plus "s"
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Location => "location",
            ResourceType::Weather => "weather",
            ResourceType::Event => "event",
        }
    }

    /// The storage schema for this resource type
    pub fn schema(&self) -> &'static SchemaDescriptor {
        match self {
            ResourceType::Location => &LOCATION_SCHEMA,
            ResourceType::Weather => &WEATHER_SCHEMA,
            ResourceType::Event => &EVENT_SCHEMA,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage type of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Real,
    Integer,
}

/// One declared column of a resource table
#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// Declared storage layout for one resource type
///
/// Replaces the runtime property enumeration the cache layer would otherwise
/// need: table name, lookup key column, ordered scalar columns, and whether
/// an insert hands back a generated identifier.
#[derive(Debug)]
pub struct SchemaDescriptor {
    /// Table name (resource tag pluralized with "s")
    pub table: &'static str,
    /// The single column reads and deletions filter on
    pub key_column: &'static str,
    /// Inserts use `RETURNING id` and the id is attached to the record
    pub returns_id: bool,
    /// Scalar columns in insert/select order, `created_at` last
    pub columns: &'static [Column],
}

static LOCATION_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    table: "locations",
    key_column: "search_query",
    returns_id: true,
    columns: &[
        Column { name: "search_query", ty: ColumnType::Text },
        Column { name: "formatted_query", ty: ColumnType::Text },
        Column { name: "latitude", ty: ColumnType::Real },
        Column { name: "longitude", ty: ColumnType::Real },
        Column { name: "created_at", ty: ColumnType::Integer },
    ],
};

static WEATHER_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    table: "weathers",
    key_column: "location_id",
    returns_id: false,
    columns: &[
        Column { name: "location_id", ty: ColumnType::Integer },
        Column { name: "forecast", ty: ColumnType::Text },
        Column { name: "time", ty: ColumnType::Text },
        Column { name: "created_at", ty: ColumnType::Integer },
    ],
};

static EVENT_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    table: "events",
    key_column: "location_id",
    returns_id: false,
    columns: &[
        Column { name: "location_id", ty: ColumnType::Integer },
        Column { name: "link", ty: ColumnType::Text },
        Column { name: "name", ty: ColumnType::Text },
        Column { name: "event_date", ty: ColumnType::Text },
        Column { name: "summary", ty: ColumnType::Text },
        Column { name: "created_at", ty: ColumnType::Integer },
    ],
};

/// A scalar value bound into a storage statement
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Real(f64),
    Integer(i64),
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FieldValue::Text(s) => s.to_sql(),
            FieldValue::Real(f) => f.to_sql(),
            FieldValue::Integer(i) => i.to_sql(),
        }
    }
}

/// A resolved place, the root resource every other type hangs off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Storage-assigned identifier, absent until the first insert completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds, set once at mapping time and never updated
    pub created_at: i64,
}

/// One day of forecast for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location_id: i64,
    pub forecast: String,
    /// Human-readable day, e.g. "Sat Aug 29 2026"
    pub time: String,
    pub created_at: i64,
}

/// One local event near a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub location_id: i64,
    pub link: String,
    pub name: String,
    pub event_date: String,
    pub summary: String,
    pub created_at: i64,
}

/// Closed union of everything the cache can hold
///
/// Serializes untagged so the HTTP layer emits plain objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Location(LocationRecord),
    Weather(WeatherRecord),
    Event(EventRecord),
}

impl Record {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Record::Location(_) => ResourceType::Location,
            Record::Weather(_) => ResourceType::Weather,
            Record::Event(_) => ResourceType::Event,
        }
    }

    /// Ordered (column, value) pairs for an insert, matching the schema
    /// descriptor's column order. The location id is storage-assigned and
    /// never appears here.
    pub fn fields_for_storage(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            Record::Location(loc) => vec![
                ("search_query", FieldValue::Text(loc.search_query.clone())),
                ("formatted_query", FieldValue::Text(loc.formatted_query.clone())),
                ("latitude", FieldValue::Real(loc.latitude)),
                ("longitude", FieldValue::Real(loc.longitude)),
                ("created_at", FieldValue::Integer(loc.created_at)),
            ],
            Record::Weather(w) => vec![
                ("location_id", FieldValue::Integer(w.location_id)),
                ("forecast", FieldValue::Text(w.forecast.clone())),
                ("time", FieldValue::Text(w.time.clone())),
                ("created_at", FieldValue::Integer(w.created_at)),
            ],
            Record::Event(e) => vec![
                ("location_id", FieldValue::Integer(e.location_id)),
                ("link", FieldValue::Text(e.link.clone())),
                ("name", FieldValue::Text(e.name.clone())),
                ("event_date", FieldValue::Text(e.event_date.clone())),
                ("summary", FieldValue::Text(e.summary.clone())),
                ("created_at", FieldValue::Integer(e.created_at)),
            ],
        }
    }

    /// Creation timestamp in epoch milliseconds
    pub fn created_at(&self) -> i64 {
        match self {
            Record::Location(loc) => loc.created_at,
            Record::Weather(w) => w.created_at,
            Record::Event(e) => e.created_at,
        }
    }

    /// Attach a storage-generated identifier. Only locations carry one.
    pub fn attach_id(&mut self, id: i64) {
        if let Record::Location(loc) = self {
            loc.id = Some(id);
        }
    }
}

/// Lookup key for a cached resource
///
/// Locations are keyed by the raw search string; every dependent type is
/// keyed by the owning location's identifier. Exactly one applies per type.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupKey {
    SearchQuery(String),
    LocationId(i64),
}

impl LookupKey {
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            LookupKey::SearchQuery(q) => FieldValue::Text(q.clone()),
            LookupKey::LocationId(id) => FieldValue::Integer(*id),
        }
    }
}

/// Parameters an upstream fetch needs beyond the lookup key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_query: Option<String>,
}

/// Identifies one cacheable resource: what kind, which key, and how to
/// reach upstream if the cache cannot answer
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub resource: ResourceType,
    pub key: LookupKey,
    pub fetch: FetchParams,
}

impl ResourceDescriptor {
    /// Descriptor for a location search
    pub fn location(search_query: impl Into<String>) -> Self {
        Self {
            resource: ResourceType::Location,
            key: LookupKey::SearchQuery(search_query.into()),
            fetch: FetchParams::default(),
        }
    }

    /// Descriptor for a weather lookup against a resolved location
    pub fn weather(location_id: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            resource: ResourceType::Weather,
            key: LookupKey::LocationId(location_id),
            fetch: FetchParams {
                latitude: Some(latitude),
                longitude: Some(longitude),
                formatted_query: None,
            },
        }
    }

    /// Descriptor for an events lookup against a resolved location
    pub fn events(location_id: i64, formatted_query: impl Into<String>) -> Self {
        Self {
            resource: ResourceType::Event,
            key: LookupKey::LocationId(location_id),
            fetch: FetchParams {
                latitude: None,
                longitude: None,
                formatted_query: Some(formatted_query.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_pluralized_tags() {
        for resource in ResourceType::ALL {
            let schema = resource.schema();
            assert_eq!(schema.table, format!("{}s", resource.as_str()));
        }
    }

    #[test]
    fn test_fields_match_schema_order() {
        let record = Record::Weather(WeatherRecord {
            location_id: 5,
            forecast: "Clear".to_string(),
            time: "Sat Aug 29 2026".to_string(),
            created_at: now_ms(),
        });

        let fields = record.fields_for_storage();
        let schema = record.resource_type().schema();

        assert_eq!(fields.len(), schema.columns.len());
        for (field, column) in fields.iter().zip(schema.columns) {
            assert_eq!(field.0, column.name);
        }
    }

    #[test]
    fn test_location_fields_exclude_id() {
        let record = Record::Location(LocationRecord {
            id: Some(42),
            search_query: "seattle".to_string(),
            formatted_query: "Seattle, WA, USA".to_string(),
            latitude: 47.6,
            longitude: -122.3,
            created_at: now_ms(),
        });

        assert!(record
            .fields_for_storage()
            .iter()
            .all(|(name, _)| *name != "id"));
    }

    #[test]
    fn test_attach_id_only_touches_locations() {
        let mut weather = Record::Weather(WeatherRecord {
            location_id: 5,
            forecast: "Rain".to_string(),
            time: "Sun Aug 30 2026".to_string(),
            created_at: 0,
        });
        weather.attach_id(99);
        assert!(matches!(weather, Record::Weather(_)));

        let mut location = Record::Location(LocationRecord {
            id: None,
            search_query: "seattle".to_string(),
            formatted_query: "Seattle, WA, USA".to_string(),
            latitude: 47.6,
            longitude: -122.3,
            created_at: 0,
        });
        location.attach_id(7);
        match location {
            Record::Location(loc) => assert_eq!(loc.id, Some(7)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_record_serializes_without_enum_tag() {
        let record = Record::Location(LocationRecord {
            id: Some(1),
            search_query: "seattle".to_string(),
            formatted_query: "Seattle, WA, USA".to_string(),
            latitude: 47.6,
            longitude: -122.3,
            created_at: 1_700_000_000_000,
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["search_query"], "seattle");
        assert_eq!(json["id"], 1);
        assert!(json.get("Location").is_none());
    }
}
