//! Managed document store backed by the Cloud Firestore REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_retry::Retry;
use tracing::{info, warn};

use super::{Store, StorageMode, new_record, recent_since};
use crate::core::config::AppConfig;
use crate::core::models::{Collection, Record, format_timestamp};
use crate::errors::PortfolioError;
use crate::infrastructure::google::{TokenProvider, discover};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;
const PING_PAGE_SIZE: u32 = 1;

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default, rename = "createTime")]
    create_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<Document>,
}

pub struct ManagedStore {
    http: Client,
    tokens: TokenProvider,
    documents_url: String,
}

impl ManagedStore {
    /// Discovers a credential and proves it by minting a token. Any failure
    /// means the managed store is unavailable for this process.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is found or the token request fails.
    pub async fn connect(config: &AppConfig) -> Result<Self, PortfolioError> {
        let source = discover(config)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let tokens = TokenProvider::new(source, http.clone());
        tokens.access_token().await?;

        let store = Self {
            documents_url: documents_url(tokens.project_id()),
            http,
            tokens,
        };
        info!(project_id = %store.project_id(), "Connected to Firestore");
        Ok(store)
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        self.tokens.project_id()
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, PortfolioError> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send_json(&self, builder: RequestBuilder) -> Result<Value, PortfolioError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortfolioError::Store(format!(
                "firestore returned {status}: {body}"
            )));
        }
        Ok(response.json::<Value>().await?)
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, PortfolioError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, PortfolioError>>,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);
        Retry::spawn(strategy, operation).await
    }

    async fn list_page(
        &self,
        collection: Collection,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListResponse, PortfolioError> {
        let url = format!("{}/{}", self.documents_url, collection.name());
        let builder = self
            .request(Method::GET, &url)
            .await?
            .query(&page_params(page_size, page_token));
        Ok(serde_json::from_value(self.send_json(builder).await?)?)
    }
}

fn page_params(page_size: u32, page_token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("pageSize", page_size.to_string())];
    if let Some(token) = page_token {
        params.push(("pageToken", token.to_string()));
    }
    params
}

fn documents_url(project_id: &str) -> String {
    format!("{FIRESTORE_API}/projects/{project_id}/databases/(default)/documents")
}

#[async_trait]
impl Store for ManagedStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Firestore
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, PortfolioError> {
        let record = new_record(collection, fields);
        let url = format!("{}/{}", self.documents_url, collection.name());
        let builder = self
            .request(Method::POST, &url)
            .await?
            .query(&[("documentId", record.id.as_str())])
            .json(&document_body(collection, &record));
        self.send_json(builder).await?;
        Ok(record.id)
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, PortfolioError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .with_retry(|| self.list_page(collection, PAGE_SIZE, page_token.as_deref()))
                .await?;
            for doc in page.documents {
                records.push(document_to_record(collection, doc)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(records)
    }

    async fn list_recent(
        &self,
        collection: Collection,
        cutoff: chrono::Duration,
    ) -> Result<Vec<Record>, PortfolioError> {
        let url = format!("{}:runQuery", self.documents_url);
        let query = recent_query(collection, recent_since(cutoff));
        let (url, query) = (&url, &query);
        let results = self
            .with_retry(move || async move {
                let builder = self.request(Method::POST, url).await?.json(query);
                self.send_json(builder).await
            })
            .await?;

        let results: Vec<QueryResult> = serde_json::from_value(results)?;
        results
            .into_iter()
            .filter_map(|r| r.document)
            .map(|doc| document_to_record(collection, doc))
            .collect()
    }

    async fn ping(&self) -> bool {
        match self.list_page(Collection::Contacts, PING_PAGE_SIZE, None).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Firestore ping failed: {}", e);
                false
            }
        }
    }
}

/// Structured query for documents at or after `since`.
fn recent_query(collection: Collection, since: DateTime<Utc>) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection.name() }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": collection.timestamp_field() },
                    "op": "GREATER_THAN_OR_EQUAL",
                    "value": { "timestampValue": format_timestamp(&since) }
                }
            }
        }
    })
}

fn document_body(collection: Collection, record: &Record) -> Value {
    let mut fields: Map<String, Value> = record
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    fields.insert(
        collection.timestamp_field().to_string(),
        json!({ "timestampValue": format_timestamp(&record.timestamp) }),
    );
    json!({ "fields": fields })
}

fn document_to_record(collection: Collection, doc: Document) -> Result<Record, PortfolioError> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let mut fields: Map<String, Value> = doc
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect();

    let raw_ts = fields
        .remove(collection.timestamp_field())
        .and_then(|v| v.as_str().map(ToString::to_string))
        .or(doc.create_time)
        .ok_or_else(|| PortfolioError::Store(format!("document {id} has no timestamp")))?;
    let timestamp = parse_timestamp(&raw_ts)
        .ok_or_else(|| PortfolioError::Store(format!("document {id} has bad timestamp {raw_ts}")))?;

    Ok(Record {
        id,
        timestamp,
        fields,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Plain JSON to a Firestore typed `Value`.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Firestore typed `Value` back to plain JSON. Timestamps come back as
/// RFC 3339 strings in the crate's fixed precision.
#[must_use]
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map_or(Value::Null, Value::from),
        "doubleValue" => inner.as_f64().map_or(Value::Null, Value::from),
        "stringValue" | "referenceValue" => inner.clone(),
        "timestampValue" => inner
            .as_str()
            .and_then(parse_timestamp)
            .map_or_else(|| inner.clone(), |ts| Value::String(format_timestamp(&ts))),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), decode_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ContactMessage, NewContact, current_timestamp};

    #[test]
    fn encodes_scalars_the_way_firestore_expects() {
        assert_eq!(encode_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&Value::Null), json!({ "nullValue": null }));
        assert_eq!(encode_value(&json!("x")), json!({ "stringValue": "x" }));
    }

    #[test]
    fn decodes_nested_values() {
        let typed = json!({
            "mapValue": { "fields": {
                "tags": { "arrayValue": { "values": [{ "stringValue": "a" }, { "integerValue": "7" }] } },
                "empty": { "arrayValue": {} }
            }}
        });
        assert_eq!(decode_value(&typed), json!({ "tags": ["a", 7], "empty": [] }));
    }

    #[test]
    fn document_body_carries_timestamp_but_not_id() {
        let fields = NewContact {
            name: "Ada".into(),
            email: "ada@x.com".into(),
            message: "hi".into(),
        }
        .into_fields();
        let record = new_record(Collection::Contacts, fields);
        let body = document_body(Collection::Contacts, &record);

        assert!(body["fields"].get("id").is_none());
        assert_eq!(body["fields"]["is_read"], json!({ "booleanValue": false }));
        assert_eq!(
            body["fields"]["created_at"]["timestampValue"],
            format_timestamp(&record.timestamp)
        );
    }

    #[test]
    fn documents_decode_into_records() {
        let ts = current_timestamp();
        let doc = Document {
            name: "projects/p/databases/(default)/documents/contacts/abc123".into(),
            fields: serde_json::from_value(json!({
                "name": { "stringValue": "Ada" },
                "email": { "stringValue": "ada@x.com" },
                "message": { "stringValue": "hi" },
                "is_read": { "booleanValue": false },
                "created_at": { "timestampValue": ts.to_rfc3339() }
            }))
            .unwrap(),
            create_time: None,
        };

        let record = document_to_record(Collection::Contacts, doc).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.timestamp, ts);
        let contact: ContactMessage = record.decode(Collection::Contacts).unwrap();
        assert_eq!(contact.name, "Ada");
    }

    #[test]
    fn missing_timestamp_falls_back_to_create_time() {
        let doc = Document {
            name: "x/project_views/v1".into(),
            fields: Map::new(),
            create_time: Some("2024-05-01T10:00:00.123456Z".into()),
        };
        let record = document_to_record(Collection::ProjectViews, doc).unwrap();
        assert_eq!(format_timestamp(&record.timestamp), "2024-05-01T10:00:00.123456Z");
    }

    #[test]
    fn health_check_requests_a_single_document() {
        assert_eq!(
            page_params(PING_PAGE_SIZE, None),
            vec![("pageSize", "1".to_string())]
        );
        assert_eq!(
            page_params(PAGE_SIZE, Some("next")),
            vec![
                ("pageSize", "300".to_string()),
                ("pageToken", "next".to_string())
            ]
        );
    }

    #[test]
    fn recent_query_uses_inclusive_bound() {
        let since = current_timestamp();
        let query = recent_query(Collection::ProjectViews, since);
        let filter = &query["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["op"], "GREATER_THAN_OR_EQUAL");
        assert_eq!(filter["field"]["fieldPath"], "viewed_at");
        assert_eq!(query["structuredQuery"]["from"][0]["collectionId"], "project_views");
    }
}
