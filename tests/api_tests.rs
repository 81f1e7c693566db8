use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portfolio::api::handle_request;
use portfolio::core::config::AppConfig;
use portfolio::core::models::NewContact;
use portfolio::errors::PortfolioError;
use portfolio::infrastructure::persistence::{InMemoryStore, SqliteStore, Store};
use portfolio::notify::{ContactNotifier, LogNotifier};
use portfolio::state::AppState;
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Forwards every notification to a channel so tests can observe it.
struct RecordingNotifier(mpsc::UnboundedSender<NewContact>);

#[async_trait]
impl ContactNotifier for RecordingNotifier {
    async fn notify(&self, contact: &NewContact) -> Result<(), PortfolioError> {
        let _ = self.0.send(contact.clone());
        Ok(())
    }
}

fn memory_state() -> AppState {
    AppState::new(
        AppConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(LogNotifier),
    )
}

fn event(method: &str, path: &str, body: Option<Value>) -> Value {
    let mut event = json!({
        "version": "2.0",
        "rawPath": path,
        "headers": { "content-type": "application/json" },
        "requestContext": { "http": { "method": method, "sourceIp": "203.0.113.7" } },
        "isBase64Encoded": false
    });
    if let Some(body) = body {
        event["body"] = Value::String(body.to_string());
    }
    event
}

async fn call(state: &AppState, method: &str, path: &str, body: Option<Value>) -> (u64, Value) {
    let response = handle_request(state, &event(method, path, body)).await;
    let status = response["statusCode"].as_u64().expect("status code");
    let body = response["body"].as_str().unwrap_or_default();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).expect("JSON body")
    };
    (status, body)
}

#[tokio::test]
async fn root_reports_active_storage_mode() {
    let state = memory_state();
    let (status, body) = call(&state, "GET", "/", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Portfolio API");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["endpoints"]["contact"], "/api/contact");
}

#[tokio::test]
async fn catalog_endpoints_serve_static_data() {
    let state = memory_state();

    let (status, projects) = call(&state, "GET", "/api/projects", None).await;
    assert_eq!(status, 200);
    assert_eq!(projects.as_array().unwrap().len(), 6);
    assert_eq!(projects[0]["title"], "Market Days");

    let (status, project) = call(&state, "GET", "/api/projects/3", None).await;
    assert_eq!(status, 200);
    assert_eq!(project["title"], "Crypto Dashboard");
    assert_eq!(project["view_count"], 0);

    let (status, skills) = call(&state, "GET", "/api/skills", None).await;
    assert_eq!(status, 200);
    assert_eq!(skills.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn unknown_or_malformed_project_ids_are_not_found() {
    let state = memory_state();
    for path in ["/api/projects/999", "/api/projects/abc", "/api/projects/-1"] {
        let (status, body) = call(&state, "GET", path, None).await;
        assert_eq!(status, 404, "{path}");
        assert_eq!(body["error"], "Project not found");
    }
}

#[tokio::test]
async fn contact_submission_increments_contact_analytics() {
    let state = memory_state();
    let (_, before) = call(&state, "GET", "/api/analytics/contacts", None).await;

    let (status, body) = call(
        &state,
        "POST",
        "/api/contact",
        Some(json!({"name": "Ada", "email": "ada@x.com", "message": "hi"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");

    let (status, after) = call(&state, "GET", "/api/analytics/contacts", None).await;
    assert_eq!(status, 200);
    for key in ["total_contacts", "unread_contacts", "recent_contacts"] {
        assert_eq!(
            after[key].as_u64().unwrap(),
            before[key].as_u64().unwrap() + 1,
            "{key}"
        );
    }
}

#[tokio::test]
async fn invalid_contact_is_rejected_without_side_effects() {
    let state = memory_state();
    let (status, body) = call(
        &state,
        "POST",
        "/api/contact",
        Some(json!({"name": "Ada", "email": "not-an-email"})),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["details"]["email"][0], "Not a valid email address.");
    assert_eq!(body["details"]["message"][0], "Missing data for required field.");

    let (_, analytics) = call(&state, "GET", "/api/analytics/contacts", None).await;
    assert_eq!(analytics["total_contacts"], 0);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let state = memory_state();
    let mut raw = event("POST", "/api/contact", None);
    raw["body"] = Value::String("{\"name\": ".into());
    let response = handle_request(&state, &raw).await;
    assert_eq!(response["statusCode"], 422);
}

#[tokio::test]
async fn contact_submission_triggers_one_notification() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let state = AppState::new(
        AppConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(RecordingNotifier(tx)),
    );

    let (status, _) = call(
        &state,
        "POST",
        "/api/contact",
        Some(json!({"name": "Ada", "email": "ada@x.com", "message": "hi"})),
    )
    .await;
    assert_eq!(status, 200);

    let sent = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("notification sent")
        .expect("channel open");
    assert_eq!(sent.email, "ada@x.com");
}

#[tokio::test]
async fn view_tracking_increments_the_project_count() {
    let state = memory_state();
    let (_, before) = call(&state, "GET", "/api/analytics/views", None).await;
    assert_eq!(before["total_views"], 0);
    assert_eq!(before["project_views"], json!({}));

    let (status, body) = call(
        &state,
        "POST",
        "/api/projects/2/view",
        Some(json!({"project_name": "whatever the client says"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "View tracked successfully");

    let (_, after) = call(&state, "GET", "/api/analytics/views", None).await;
    assert_eq!(after["total_views"], 1);
    assert_eq!(after["recent_views"], 1);
    assert_eq!(after["project_views"]["Trading Simulator"], 1);
}

#[tokio::test]
async fn view_on_unknown_project_is_404_even_with_empty_body() {
    let state = memory_state();
    let (status, _) = call(&state, "POST", "/api/projects/999/view", Some(json!({}))).await;
    assert_eq!(status, 404);

    let (_, analytics) = call(&state, "GET", "/api/analytics/views", None).await;
    assert_eq!(analytics["total_views"], 0);
}

#[tokio::test]
async fn view_on_known_project_validates_the_body() {
    let state = memory_state();
    let (status, body) = call(&state, "POST", "/api/projects/1/view", Some(json!({}))).await;
    assert_eq!(status, 422);
    assert!(body["details"]["project_name"].is_array());
}

#[tokio::test]
async fn health_reports_fallback_mode() {
    let state = memory_state();
    let (status, body) = call(&state, "GET", "/api/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "fallback");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn unknown_paths_and_wrong_methods() {
    let state = memory_state();
    let (status, body) = call(&state, "GET", "/api/nope", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Endpoint not found");

    let (status, _) = call(&state, "DELETE", "/api/contact", None).await;
    assert_eq!(status, 405);
}

#[tokio::test]
async fn cors_headers_follow_the_allow_list() {
    let state = memory_state();

    let mut allowed = event("GET", "/api/skills", None);
    allowed["headers"]["origin"] = json!("http://localhost:3000");
    let response = handle_request(&state, &allowed).await;
    assert_eq!(
        response["headers"]["Access-Control-Allow-Origin"],
        "http://localhost:3000"
    );

    let mut preflight = event("OPTIONS", "/api/contact", None);
    preflight["headers"]["origin"] = json!("https://evil.test");
    let response = handle_request(&state, &preflight).await;
    assert_eq!(response["statusCode"], 400);
}

/// The same scripted traffic must produce identical response bodies from the
/// in-memory and relational stores (apart from the mode banners).
#[tokio::test]
async fn response_shapes_do_not_depend_on_storage_mode() {
    let sqlite: Arc<dyn Store> = Arc::new(SqliteStore::open_url("sqlite::memory:").unwrap());
    let states = [
        memory_state(),
        AppState::new(AppConfig::default(), sqlite, Arc::new(LogNotifier)),
    ];

    let mut transcripts = Vec::new();
    for state in &states {
        let mut transcript = Vec::new();
        transcript.push(
            call(
                state,
                "POST",
                "/api/contact",
                Some(json!({"name": "Ada", "email": "ada@x.com", "message": "hi"})),
            )
            .await,
        );
        transcript.push(
            call(state, "POST", "/api/projects/4/view", Some(json!({"project_name": "Book a Stay", "user_ip": "10.0.0.1"}))).await,
        );
        transcript.push(call(state, "POST", "/api/projects/999/view", Some(json!({}))).await);
        transcript.push(call(state, "GET", "/api/analytics/views", None).await);
        transcript.push(call(state, "GET", "/api/analytics/contacts", None).await);
        transcripts.push(transcript);
    }

    assert_eq!(transcripts[0], transcripts[1]);
}
