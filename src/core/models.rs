use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::PortfolioError;

/// Logical collections the persistence facade knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Contacts,
    ProjectViews,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Contacts, Collection::ProjectViews];

    /// Collection (or table) name in every backing store.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Collection::Contacts => "contacts",
            Collection::ProjectViews => "project_views",
        }
    }

    /// Field holding the immutable creation timestamp used for recency filters.
    #[must_use]
    pub fn timestamp_field(self) -> &'static str {
        match self {
            Collection::Contacts => "created_at",
            Collection::ProjectViews => "viewed_at",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored record as every backend sees it: identity, timestamp, and the
/// caller-supplied fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Record {
    /// Flattens the record into one JSON object keyed the way the typed
    /// models expect (`id`, `<timestamp_field>`, then the fields).
    #[must_use]
    pub fn to_document(&self, collection: Collection) -> Value {
        let mut doc = self.fields.clone();
        doc.insert("id".to_string(), Value::String(self.id.clone()));
        doc.insert(
            collection.timestamp_field().to_string(),
            Value::String(format_timestamp(&self.timestamp)),
        );
        Value::Object(doc)
    }

    /// # Errors
    ///
    /// Returns an error if the record's fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, collection: Collection) -> Result<T, PortfolioError> {
        serde_json::from_value(self.to_document(collection)).map_err(|e| {
            PortfolioError::Store(format!("malformed {collection} record {}: {e}", self.id))
        })
    }
}

/// Current time truncated to the precision every store can round-trip.
#[must_use]
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// RFC 3339 with fixed microsecond precision, so lexical order is time order.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: String,
    pub project_name: String,
    #[serde(default)]
    pub user_ip: Option<String>,
    pub viewed_at: DateTime<Utc>,
}

/// Validated contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl NewContact {
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(self.name));
        fields.insert("email".to_string(), Value::String(self.email));
        fields.insert("message".to_string(), Value::String(self.message));
        fields.insert("is_read".to_string(), Value::Bool(false));
        fields
    }
}

/// Validated view-tracking request, already resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProjectView {
    pub project_name: String,
    pub user_ip: Option<String>,
}

impl NewProjectView {
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("project_name".to_string(), Value::String(self.project_name));
        fields.insert(
            "user_ip".to_string(),
            self.user_ip.map_or(Value::Null, Value::String),
        );
        fields
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub tech_stack: &'static [&'static str],
    pub features: &'static [&'static str],
    pub github_url: &'static str,
    pub demo_url: &'static str,
    pub image_emoji: &'static str,
    pub category: &'static str,
    pub view_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillCategory {
    pub name: &'static str,
    pub technologies: &'static [&'static str],
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewAnalytics {
    pub total_views: usize,
    pub project_views: BTreeMap<String, usize>,
    pub recent_views: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAnalytics {
    pub total_contacts: usize,
    pub unread_contacts: usize,
    pub recent_contacts: usize,
}
