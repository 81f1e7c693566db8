//! HTTP surface: API Gateway event routing and request handling

pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod routes;
pub mod validation;

// Re-export the main handler for convenience
pub use handler::{function_handler, handle_request};
