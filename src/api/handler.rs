//! API handler - thin router that delegates to the route functions.
//!
//! This module handles:
//! - Request extraction from the API Gateway event
//! - CORS preflight and response headers
//! - Method/path dispatch (404 for unknown paths, 405 for wrong methods)

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use super::helpers::{self, with_cors};
use super::parsing::HttpRequest;
use super::routes;
use crate::state::AppState;

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Never fails: every outcome, including internal errors, is a proxy response.
#[tracing::instrument(level = "info", skip(state, event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    state: Arc<AppState>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    Ok(handle_request(&state, &event.payload).await)
}

/// Routes one API Gateway event to its endpoint and returns the proxy
/// response. Shared by the Lambda entrypoint and the local server.
pub async fn handle_request(state: &AppState, event: &Value) -> Value {
    let request = match HttpRequest::from_event(event) {
        Ok(request) => request,
        Err(e) => {
            error!("Malformed request event: {}", e);
            return helpers::failure(&e, "Malformed request");
        }
    };
    info!(method = %request.method, path = %request.path, "Request received");

    let origin = request.header("Origin");
    let allowed = &state.config.cors_allowed_origins;

    if request.method == "OPTIONS" {
        return helpers::preflight(origin, allowed);
    }

    let response = dispatch(state, &request).await;
    with_cors(response, origin, allowed)
}

async fn dispatch(state: &AppState, request: &HttpRequest<'_>) -> Value {
    let method = request.method.as_str();
    let segments = request.segments();

    match (method, segments.as_slice()) {
        ("GET", []) => routes::root(state),
        ("GET", ["api", "projects"]) => routes::list_projects(),
        ("GET", ["api", "projects", id]) => routes::get_project(id),
        ("POST", ["api", "projects", id, "view"]) => {
            routes::track_project_view(state, id, request).await
        }
        ("GET", ["api", "skills"]) => routes::list_skills(),
        ("POST", ["api", "contact"]) => routes::submit_contact(state, request).await,
        ("GET", ["api", "analytics", "views"]) => routes::view_analytics(state).await,
        ("GET", ["api", "analytics", "contacts"]) => routes::contact_analytics(state).await,
        ("GET", ["api", "health"]) => routes::health(state).await,
        (_, path) if is_known_path(path) => helpers::err_response(405, "Method not allowed"),
        _ => helpers::err_response(404, "Endpoint not found"),
    }
}

fn is_known_path(segments: &[&str]) -> bool {
    matches!(
        segments,
        []
            | ["api", "projects"]
            | ["api", "projects", _]
            | ["api", "projects", _, "view"]
            | ["api", "skills"]
            | ["api", "contact"]
            | ["api", "analytics", "views" | "contacts"]
            | ["api", "health"]
    )
}
