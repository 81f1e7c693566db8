//! Relational configuration of the facade.
//!
//! Each collection is a table with one column per field. Timestamps are stored
//! as fixed-precision RFC 3339 UTC text so `>=` on the column is a time
//! comparison.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params_from_iter};
use serde_json::{Map, Value};

use super::{Store, StorageMode, new_record, recent_since};
use crate::core::models::{Collection, Record, format_timestamp};
use crate::errors::PortfolioError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL,
    message    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_read    INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);

CREATE TABLE IF NOT EXISTS project_views (
    id           TEXT PRIMARY KEY,
    project_name TEXT NOT NULL,
    user_ip      TEXT,
    viewed_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_project_views_viewed_at ON project_views(viewed_at);
";

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Text,
    Bool,
}

fn columns(collection: Collection) -> &'static [(&'static str, ColumnKind)] {
    match collection {
        Collection::Contacts => &[
            ("name", ColumnKind::Text),
            ("email", ColumnKind::Text),
            ("message", ColumnKind::Text),
            ("is_read", ColumnKind::Bool),
        ],
        Collection::ProjectViews => &[
            ("project_name", ColumnKind::Text),
            ("user_ip", ColumnKind::Text),
        ],
    }
}

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens a database from a `sqlite:` URL. `sqlite:///./file.db` is a
    /// relative path, `sqlite:////abs/file.db` an absolute one, and
    /// `sqlite::memory:` (or a bare `sqlite://`) an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error for non-SQLite URLs or if the database cannot be opened.
    pub fn open_url(url: &str) -> Result<Self, PortfolioError> {
        let conn = match database_path(url)? {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        Self::with_connection(conn)
    }

    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema created.
    pub fn open(path: &Path) -> Result<Self, PortfolioError> {
        Self::with_connection(Connection::open(path)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PortfolioError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, PortfolioError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, PortfolioError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .map_err(|e| PortfolioError::Store(format!("sqlite task failed: {e}")))?
    }
}

fn database_path(url: &str) -> Result<Option<&str>, PortfolioError> {
    if url == "sqlite::memory:" || url == "sqlite://" || url == "sqlite:///:memory:" {
        return Ok(None);
    }
    url.strip_prefix("sqlite:///")
        .filter(|path| !path.is_empty())
        .map(Some)
        .ok_or_else(|| PortfolioError::Config(format!("unsupported DATABASE_URL: {url}")))
}

fn to_sql(value: Option<&Value>, kind: ColumnKind) -> SqlValue {
    match (value, kind) {
        (None | Some(Value::Null), ColumnKind::Bool) => SqlValue::Integer(0),
        (None | Some(Value::Null), ColumnKind::Text) => SqlValue::Null,
        (Some(Value::Bool(b)), _) => SqlValue::Integer(i64::from(*b)),
        (Some(Value::String(s)), _) => SqlValue::Text(s.clone()),
        (Some(other), _) => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: SqlValue, kind: ColumnKind) -> Value {
    match (value, kind) {
        (SqlValue::Integer(i), ColumnKind::Bool) => Value::Bool(i != 0),
        (SqlValue::Integer(i), ColumnKind::Text) => Value::from(i),
        (SqlValue::Real(f), _) => Value::from(f),
        (SqlValue::Text(s), _) => Value::String(s),
        (SqlValue::Null | SqlValue::Blob(_), _) => Value::Null,
    }
}

fn select_sql(collection: Collection, recent: bool) -> String {
    let ts = collection.timestamp_field();
    let cols: Vec<&str> = columns(collection).iter().map(|(name, _)| *name).collect();
    let mut sql = format!(
        "SELECT id, {ts}, {} FROM {}",
        cols.join(", "),
        collection.name()
    );
    if recent {
        sql.push_str(&format!(" WHERE {ts} >= ?1"));
    }
    sql.push_str(&format!(" ORDER BY {ts}, rowid"));
    sql
}

fn row_to_record(collection: Collection, row: &Row<'_>) -> rusqlite::Result<Record> {
    let id: String = row.get(0)?;
    let raw_ts: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let mut fields = Map::new();
    for (idx, (name, kind)) in columns(collection).iter().enumerate() {
        let value: SqlValue = row.get(idx + 2)?;
        fields.insert((*name).to_string(), from_sql(value, *kind));
    }

    Ok(Record {
        id,
        timestamp,
        fields,
    })
}

fn query_records(
    conn: &Connection,
    collection: Collection,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Record>, PortfolioError> {
    let mut stmt = conn.prepare(&select_sql(collection, since.is_some()))?;
    let params: Vec<SqlValue> = since
        .map(|ts| vec![SqlValue::Text(format_timestamp(&ts))])
        .unwrap_or_default();
    let rows = stmt.query_map(params_from_iter(params), |row| row_to_record(collection, row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[async_trait]
impl Store for SqliteStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Sqlite
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, PortfolioError> {
        let record = new_record(collection, fields);
        let id = record.id.clone();

        self.with_conn(move |conn| {
            let cols = columns(collection);
            let mut names = vec!["id", collection.timestamp_field()];
            names.extend(cols.iter().map(|(name, _)| *name));
            let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();

            let mut values = vec![
                SqlValue::Text(record.id.clone()),
                SqlValue::Text(format_timestamp(&record.timestamp)),
            ];
            values.extend(
                cols.iter()
                    .map(|(name, kind)| to_sql(record.fields.get(*name), *kind)),
            );

            conn.execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    collection.name(),
                    names.join(", "),
                    placeholders.join(", ")
                ),
                params_from_iter(values),
            )?;
            Ok(())
        })
        .await?;

        Ok(id)
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, PortfolioError> {
        self.with_conn(move |conn| query_records(conn, collection, None))
            .await
    }

    async fn list_recent(
        &self,
        collection: Collection,
        cutoff: Duration,
    ) -> Result<Vec<Record>, PortfolioError> {
        let since = recent_since(cutoff);
        self.with_conn(move |conn| query_records(conn, collection, Some(since)))
            .await
    }

    async fn ping(&self) -> bool {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
        .is_ok()
    }
}
