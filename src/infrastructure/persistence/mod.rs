//! Persistence facade.
//!
//! Every backing store implements [`Store`]. One store is chosen at startup by
//! [`select_store`] and injected into the handlers through [`Storage`]; the
//! choice never changes for the rest of the process:
//! - `firestore`: the managed document store, when a credential is found and a
//!   token can be minted
//! - `memory`: the in-process fallback used whenever the managed store is not
//!   reachable at startup
//! - `sqlite`: the relational configuration, selected explicitly

pub mod firestore;
pub mod memory;
pub mod sqlite;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::config::{AppConfig, StorageBackend};
use crate::core::models::{
    Collection, ContactMessage, NewContact, NewProjectView, ProjectView, Record, current_timestamp,
};
use crate::errors::PortfolioError;

pub use firestore::ManagedStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Firestore,
    Memory,
    Sqlite,
}

impl StorageMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StorageMode::Firestore => "firestore",
            StorageMode::Memory => "memory",
            StorageMode::Sqlite => "sqlite",
        }
    }

    /// Whether this mode is the degraded substitute for an external store.
    #[must_use]
    pub fn is_fallback(self) -> bool {
        self == StorageMode::Memory
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backing store for the portfolio collections.
///
/// Implementations must apply the same inclusive recency comparison
/// (`timestamp >= now - cutoff`) so analytics agree across modes.
#[async_trait]
pub trait Store: Send + Sync {
    fn mode(&self) -> StorageMode;

    /// Persists a new record and returns its identifier.
    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, PortfolioError>;

    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, PortfolioError>;

    async fn list_recent(
        &self,
        collection: Collection,
        cutoff: Duration,
    ) -> Result<Vec<Record>, PortfolioError>;

    /// Reachability check used by the health endpoint.
    async fn ping(&self) -> bool {
        true
    }
}

/// Builds a record with a fresh id and the current time. Caller fields may not
/// shadow the id or the collection's timestamp field.
#[must_use]
pub fn new_record(collection: Collection, mut fields: Map<String, Value>) -> Record {
    fields.remove("id");
    fields.remove(collection.timestamp_field());
    Record {
        id: Uuid::new_v4().to_string(),
        timestamp: current_timestamp(),
        fields,
    }
}

/// Lower bound of the recency window ending now, at the microsecond
/// precision records are stored with, so every store compares the same bound.
#[must_use]
pub fn recent_since(cutoff: Duration) -> DateTime<Utc> {
    (Utc::now() - cutoff).trunc_subsecs(6)
}

/// Chooses the backing store once, at startup. Initialization failures are
/// logged and degrade to the in-memory store; they never abort startup.
pub async fn select_store(config: &AppConfig) -> Arc<dyn Store> {
    match config.storage_backend {
        StorageBackend::Relational => match SqliteStore::open_url(&config.database_url) {
            Ok(store) => {
                info!(database_url = %config.database_url, "Using SQLite storage");
                Arc::new(store)
            }
            Err(e) => {
                warn!("SQLite unavailable, falling back to in-memory storage: {}", e);
                Arc::new(InMemoryStore::new())
            }
        },
        StorageBackend::Document => match ManagedStore::connect(config).await {
            Ok(store) => {
                info!(project_id = %store.project_id(), "Using Firestore storage");
                Arc::new(store)
            }
            Err(e) => {
                warn!("Firestore unavailable, falling back to in-memory storage: {}", e);
                Arc::new(InMemoryStore::new())
            }
        },
    }
}

/// Handle the request handlers use. Cheap to clone.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn Store>,
}

impl Storage {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn mode(&self) -> StorageMode {
        self.store.mode()
    }

    pub async fn ping(&self) -> bool {
        self.store.ping().await
    }

    /// # Errors
    ///
    /// Returns the backing store's error, after logging it.
    pub async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, PortfolioError> {
        self.store.create(collection, fields).await.map_err(|e| {
            error!(collection = %collection, mode = %self.mode(), "create failed: {}", e);
            e
        })
    }

    /// # Errors
    ///
    /// Returns the backing store's error, after logging it.
    pub async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, PortfolioError> {
        self.store.list_all(collection).await.map_err(|e| {
            error!(collection = %collection, mode = %self.mode(), "list_all failed: {}", e);
            e
        })
    }

    /// # Errors
    ///
    /// Returns the backing store's error, after logging it.
    pub async fn list_recent(
        &self,
        collection: Collection,
        cutoff: Duration,
    ) -> Result<Vec<Record>, PortfolioError> {
        self.store
            .list_recent(collection, cutoff)
            .await
            .map_err(|e| {
                error!(collection = %collection, mode = %self.mode(), "list_recent failed: {}", e);
                e
            })
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn record_contact(&self, contact: NewContact) -> Result<String, PortfolioError> {
        self.create(Collection::Contacts, contact.into_fields()).await
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn record_view(&self, view: NewProjectView) -> Result<String, PortfolioError> {
        self.create(Collection::ProjectViews, view.into_fields()).await
    }

    /// # Errors
    ///
    /// Returns an error if the read fails or a record is malformed.
    pub async fn contacts(&self) -> Result<Vec<ContactMessage>, PortfolioError> {
        decode_all(Collection::Contacts, self.list_all(Collection::Contacts).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the read fails or a record is malformed.
    pub async fn recent_contacts(
        &self,
        cutoff: Duration,
    ) -> Result<Vec<ContactMessage>, PortfolioError> {
        decode_all(
            Collection::Contacts,
            self.list_recent(Collection::Contacts, cutoff).await?,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the read fails or a record is malformed.
    pub async fn project_views(&self) -> Result<Vec<ProjectView>, PortfolioError> {
        decode_all(
            Collection::ProjectViews,
            self.list_all(Collection::ProjectViews).await?,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the read fails or a record is malformed.
    pub async fn recent_project_views(
        &self,
        cutoff: Duration,
    ) -> Result<Vec<ProjectView>, PortfolioError> {
        decode_all(
            Collection::ProjectViews,
            self.list_recent(Collection::ProjectViews, cutoff).await?,
        )
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(
    collection: Collection,
    records: Vec<Record>,
) -> Result<Vec<T>, PortfolioError> {
    records.iter().map(|r| r.decode(collection)).collect()
}
