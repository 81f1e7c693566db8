//! Request-independent business operations behind the API routes.

pub mod analytics;
pub mod contact;
pub mod views;
