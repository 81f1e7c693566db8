use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

use crate::errors::PortfolioError;

/// The parts of an API Gateway event the router looks at. Works with both
/// HTTP API (v2) and REST API (v1) payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest<'a> {
    pub method: String,
    pub path: String,
    pub headers: Option<&'a Value>,
    pub body: Option<String>,
    pub source_ip: Option<&'a str>,
}

impl<'a> HttpRequest<'a> {
    /// # Errors
    ///
    /// Returns a validation error if a base64-encoded body cannot be decoded.
    pub fn from_event(event: &'a Value) -> Result<Self, PortfolioError> {
        let method = v_str(event, &["requestContext", "http", "method"])
            .or_else(|| v_str(event, &["httpMethod"]))
            .unwrap_or("GET")
            .to_ascii_uppercase();

        let path = event
            .get("rawPath")
            .and_then(|v| v.as_str())
            .or_else(|| event.get("path").and_then(|v| v.as_str()))
            .unwrap_or("/");

        let source_ip = v_str(event, &["requestContext", "http", "sourceIp"])
            .or_else(|| v_str(event, &["requestContext", "identity", "sourceIp"]));

        Ok(Self {
            method,
            path: normalize_path(path),
            headers: event.get("headers"),
            body: extract_body(event)?,
            source_ip,
        })
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.and_then(|h| get_header_value(h, name))
    }

    /// Path segments without empty parts, e.g. `["api", "projects", "1"]`.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Parses the body as JSON. A missing or blank body is an empty object so
    /// that field validation reports the missing fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the body is not valid JSON.
    pub fn json_body(&self) -> Result<Value, PortfolioError> {
        match self.body.as_deref().map(str::trim) {
            None | Some("") => Ok(Value::Object(serde_json::Map::new())),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| PortfolioError::invalid_field("_schema", &format!("Invalid JSON body: {e}"))),
        }
    }
}

fn extract_body(event: &Value) -> Result<Option<String>, PortfolioError> {
    let Some(body) = event.get("body").and_then(|b| b.as_str()) else {
        return Ok(None);
    };

    let encoded = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(Some(body.to_string()));
    }

    let bytes = general_purpose::STANDARD
        .decode(body)
        .map_err(|e| PortfolioError::invalid_field("_schema", &format!("Invalid body encoding: {e}")))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| PortfolioError::invalid_field("_schema", &format!("Body is not UTF-8: {e}")))
}

/// Drops the query string and any trailing slash. An API Gateway stage prefix
/// (`/prod/api/...`) is cut back to the `/api` root.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let path = raw.split('?').next().unwrap_or("/");
    let path = match path.find("/api/") {
        Some(idx) => &path[idx..],
        None if path.ends_with("/api") => "/api",
        None => path,
    };
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_http_api_v2_events() {
        let event = json!({
            "rawPath": "/api/projects/2/view/",
            "requestContext": { "http": { "method": "post", "sourceIp": "203.0.113.9" } },
            "headers": { "origin": "http://localhost:3000" },
            "body": "{\"project_name\":\"x\"}"
        });
        let req = HttpRequest::from_event(&event).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.segments(), vec!["api", "projects", "2", "view"]);
        assert_eq!(req.source_ip, Some("203.0.113.9"));
        assert_eq!(req.header("Origin"), Some("http://localhost:3000"));
        assert_eq!(req.json_body().unwrap()["project_name"], "x");
    }

    #[test]
    fn reads_rest_v1_events_with_base64_bodies() {
        let event = json!({
            "httpMethod": "POST",
            "path": "/api/contact",
            "isBase64Encoded": true,
            "body": general_purpose::STANDARD.encode("{\"name\":\"Ada\"}"),
            "requestContext": { "identity": { "sourceIp": "198.51.100.1" } }
        });
        let req = HttpRequest::from_event(&event).unwrap();
        assert_eq!(req.path, "/api/contact");
        assert_eq!(req.source_ip, Some("198.51.100.1"));
        assert_eq!(req.json_body().unwrap()["name"], "Ada");
    }

    #[test]
    fn missing_body_is_an_empty_object_and_garbage_is_rejected() {
        let event = json!({ "rawPath": "/" });
        let mut req = HttpRequest::from_event(&event).unwrap();
        assert_eq!(req.json_body().unwrap(), json!({}));

        req.body = Some("{oops".into());
        let err = req.json_body().unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn normalizes_stage_prefixes_and_slashes() {
        assert_eq!(normalize_path("/prod/api/skills/"), "/api/skills");
        assert_eq!(normalize_path("/api/health?verbose=1"), "/api/health");
        assert_eq!(normalize_path("//"), "/");
        assert_eq!(normalize_path(""), "/");
    }
}
