//! Google Cloud credentials and access tokens.

pub mod auth;
pub mod credentials;

pub use auth::TokenProvider;
pub use credentials::{CredentialSource, ServiceAccountKey, discover};
