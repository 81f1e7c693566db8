//! Response builders shared by the route handlers.
//!
//! Every response is an API Gateway proxy payload:
//! `{ "statusCode", "headers", "body" }` with a JSON-encoded body.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::errors::PortfolioError;

const CORS_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

// ============================================================================
// Response Builders
// ============================================================================

/// Returns a response with the given status and a JSON body.
#[must_use]
pub fn json_response<T: Serialize>(status_code: u16, body: &T) -> Value {
    let body = serde_json::to_string(body).unwrap_or_else(|e| {
        error!("Failed to serialize response body: {}", e);
        json!({ "error": "Internal server error", "status_code": 500 }).to_string()
    });
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": body
    })
}

/// Returns a 200 OK response with a JSON body.
#[must_use]
pub fn ok<T: Serialize>(body: &T) -> Value {
    json_response(200, body)
}

/// Returns the `{"message", "status": "success"}` acknowledgement.
#[must_use]
pub fn ok_message(message: &str) -> Value {
    ok(&json!({ "message": message, "status": "success" }))
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json_response(
        status_code,
        &json!({ "error": message, "status_code": status_code }),
    )
}

/// Returns a response with no body.
#[must_use]
pub fn no_content() -> Value {
    json!({ "statusCode": 204, "headers": {}, "body": "" })
}

/// Maps a handler failure to a response. Validation and not-found errors are
/// shown to the client; anything else is logged and answered with `generic`.
#[must_use]
pub fn failure(err: &PortfolioError, generic: &str) -> Value {
    match err {
        PortfolioError::Validation(details) => json_response(
            422,
            &json!({
                "error": "Validation failed",
                "status_code": 422,
                "details": details
            }),
        ),
        PortfolioError::NotFound(what) => err_response(404, &format!("{what} not found")),
        other => {
            error!("{}: {}", generic, other);
            err_response(500, generic)
        }
    }
}

// ============================================================================
// CORS
// ============================================================================

/// Whether `origin` is on the allow-list.
#[must_use]
pub fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    let origin = origin.trim_end_matches('/');
    allowed.iter().any(|a| a == "*" || a == origin)
}

/// Adds CORS headers for an allowed `origin`; other responses pass through.
#[must_use]
pub fn with_cors(mut response: Value, origin: Option<&str>, allowed: &[String]) -> Value {
    let Some(origin) = origin.filter(|o| origin_allowed(o, allowed)) else {
        return response;
    };

    if !response.get("headers").is_some_and(Value::is_object) {
        response["headers"] = json!({});
    }
    let headers = &mut response["headers"];
    headers["Access-Control-Allow-Origin"] = Value::String(origin.to_string());
    headers["Access-Control-Allow-Credentials"] = Value::String("true".to_string());
    headers["Access-Control-Allow-Methods"] = Value::String(CORS_METHODS.to_string());
    headers["Access-Control-Allow-Headers"] = Value::String("*".to_string());
    headers["Vary"] = Value::String("Origin".to_string());
    response
}

/// Answers a CORS preflight request.
#[must_use]
pub fn preflight(origin: Option<&str>, allowed: &[String]) -> Value {
    match origin {
        Some(o) if origin_allowed(o, allowed) => with_cors(no_content(), origin, allowed),
        _ => err_response(400, "Disallowed CORS origin"),
    }
}
