//! Portfolio - the backend API of a personal portfolio site.
//!
//! Serves the static project and skill catalog, accepts contact-form
//! submissions, tracks per-project views and reports simple analytics over
//! them.
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda (API Gateway proxy events) for serverless execution, plus a
//!   local axum server that feeds the same router
//! - A persistence facade over Cloud Firestore, an in-memory fallback, or
//!   `SQLite`, chosen once at startup
//! - lettre for contact notification emails
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use portfolio::core::config::AppConfig;
//! use portfolio::state::AppState;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Set up structured logging
//!     portfolio::setup_logging();
//!
//!     // Falls back to in-memory storage when no credential is configured
//!     let state = AppState::initialize(AppConfig::default()).await;
//!
//!     let event = json!({
//!         "rawPath": "/api/analytics/views",
//!         "requestContext": { "http": { "method": "GET" } }
//!     });
//!     let response = portfolio::api::handle_request(&state, &event).await;
//!     println!("{}", response["body"]);
//! }
//! ```

// Module declarations
pub mod api;
pub mod core;
pub mod errors;
pub mod infrastructure;
pub mod notify;
pub mod state;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// portfolio::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
