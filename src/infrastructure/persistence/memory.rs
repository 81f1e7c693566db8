use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Map, Value};

use super::{Store, StorageMode, new_record, recent_since};
use crate::core::models::{Collection, Record};
use crate::errors::PortfolioError;

/// Process-local substitute for the managed store. Records live as long as
/// the instance and are kept in insertion order per collection.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a prebuilt record as-is, bypassing id and timestamp assignment.
    pub fn insert_record(&self, collection: Collection, record: Record) {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection)
            .or_default()
            .push(record);
    }

    fn snapshot(&self, collection: Collection, keep: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&collection)
            .map(|records| records.iter().filter(|r| keep(r)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Memory
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, PortfolioError> {
        let record = new_record(collection, fields);
        let id = record.id.clone();
        self.insert_record(collection, record);
        Ok(id)
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, PortfolioError> {
        Ok(self.snapshot(collection, |_| true))
    }

    async fn list_recent(
        &self,
        collection: Collection,
        cutoff: Duration,
    ) -> Result<Vec<Record>, PortfolioError> {
        let since = recent_since(cutoff);
        Ok(self.snapshot(collection, |r| r.timestamp >= since))
    }
}
