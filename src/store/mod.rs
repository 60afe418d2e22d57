//! Storage gateway over SQLite
//!
//! Executes parameterized reads, writes, and deletions for any resource type
//! by building statements from that type's schema descriptor. Knows nothing
//! about freshness or upstream fetching. One round trip per call, no implicit
//! transactions, no retries; store failures surface to the caller.

use crate::records::{
    EventRecord, LocationRecord, Record, ResourceDescriptor, ResourceType, WeatherRecord,
};
use crate::Result;
use rusqlite::{Connection, Row, ToSql};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Handle to the cache database
///
/// Opened once at startup and injected wherever storage access is needed.
/// The connection sits behind a mutex so individual statements serialize and
/// the handle can be shared across request tasks.
pub struct Store {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the cache database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Opening cache database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Open an in-memory database, for tests
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the resource tables if they do not exist
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_query TEXT NOT NULL,
                formatted_query TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS weathers (
                location_id INTEGER NOT NULL,
                forecast TEXT NOT NULL,
                time TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                location_id INTEGER NOT NULL,
                link TEXT NOT NULL,
                name TEXT NOT NULL,
                event_date TEXT NOT NULL,
                summary TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_locations_search ON locations(search_query);
            CREATE INDEX IF NOT EXISTS idx_weathers_location ON weathers(location_id);
            CREATE INDEX IF NOT EXISTS idx_events_location ON events(location_id);
            "#,
        )?;
        Ok(())
    }

    /// Read all cached records for the descriptor's key.
    /// No match is an empty vec, never an error.
    pub fn read(&self, descriptor: &ResourceDescriptor) -> Result<Vec<Record>> {
        let schema = descriptor.resource.schema();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            select_list(descriptor.resource),
            schema.table,
            schema.key_column
        );

        let key = descriptor.key.to_field_value();

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([&key as &dyn ToSql], |row| {
            record_from_row(descriptor.resource, row)
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        tracing::debug!(
            resource = %descriptor.resource,
            rows = records.len(),
            "Cache read"
        );
        Ok(records)
    }

    /// Insert one record, returning it with any generated identifier attached.
    ///
    /// The column and parameter lists are built from the record's own ordered
    /// field list, so one statement builder serves every resource type.
    pub fn write(&self, descriptor: &ResourceDescriptor, mut record: Record) -> Result<Record> {
        debug_assert_eq!(descriptor.resource, record.resource_type());

        let schema = descriptor.resource.schema();
        let fields = record.fields_for_storage();

        let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            schema.table,
            columns.join(", "),
            placeholders.join(", "),
            if schema.returns_id { " RETURNING id" } else { "" }
        );

        let params: Vec<&dyn ToSql> = fields.iter().map(|(_, v)| v as &dyn ToSql).collect();

        let conn = self.lock();
        if schema.returns_id {
            let id: i64 = conn.query_row(&sql, params.as_slice(), |row| row.get(0))?;
            record.attach_id(id);
        } else {
            conn.execute(&sql, params.as_slice())?;
        }

        tracing::debug!(resource = %descriptor.resource, "Cache write");
        Ok(record)
    }

    /// Delete every cached record for the descriptor's key, returning the
    /// number of rows removed. Used by eviction.
    pub fn delete_for_key(&self, descriptor: &ResourceDescriptor) -> Result<usize> {
        let schema = descriptor.resource.schema();
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            schema.table, schema.key_column
        );

        let key = descriptor.key.to_field_value();

        let conn = self.lock();
        let deleted = conn.execute(&sql, [&key as &dyn ToSql])?;

        tracing::debug!(
            resource = %descriptor.resource,
            rows = deleted,
            "Cache eviction"
        );
        Ok(deleted)
    }

    /// Path of the backing database file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // Statement execution never panics while holding the guard, so a
        // poisoned mutex can only follow a panic elsewhere in this process.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Select column list for a resource type: the declared columns, with the
/// generated id prepended for types that carry one.
fn select_list(resource: ResourceType) -> String {
    let schema = resource.schema();
    let mut names: Vec<&str> = Vec::with_capacity(schema.columns.len() + 1);
    if schema.returns_id {
        names.push("id");
    }
    names.extend(schema.columns.iter().map(|c| c.name));
    names.join(", ")
}

/// Hydrate one row into a typed record. Column order matches `select_list`.
fn record_from_row(resource: ResourceType, row: &Row<'_>) -> rusqlite::Result<Record> {
    match resource {
        ResourceType::Location => Ok(Record::Location(LocationRecord {
            id: Some(row.get(0)?),
            search_query: row.get(1)?,
            formatted_query: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            created_at: row.get(5)?,
        })),
        ResourceType::Weather => Ok(Record::Weather(WeatherRecord {
            location_id: row.get(0)?,
            forecast: row.get(1)?,
            time: row.get(2)?,
            created_at: row.get(3)?,
        })),
        ResourceType::Event => Ok(Record::Event(EventRecord {
            location_id: row.get(0)?,
            link: row.get(1)?,
            name: row.get(2)?,
            event_date: row.get(3)?,
            summary: row.get(4)?,
            created_at: row.get(5)?,
        })),
    }
}

// Keep the declared column types honest against the CREATE TABLE statements.
#[cfg(test)]
mod schema_tests {
    use super::*;
    use crate::records::ColumnType;

    #[test]
    fn test_created_at_is_last_integer_column() {
        for resource in ResourceType::ALL {
            let schema = resource.schema();
            let last = schema.columns.last().unwrap();
            assert_eq!(last.name, "created_at");
            assert_eq!(last.ty, ColumnType::Integer);
        }
    }
}
