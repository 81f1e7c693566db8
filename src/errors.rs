use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to the list of messages produced while validating it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage operation failed: {0}")]
    Store(String),

    #[error("Failed to load credentials: {0}")]
    Credential(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(String),

    #[error("Failed to send notification: {0}")]
    Notification(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PortfolioError {
    /// Status code the HTTP layer answers with for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            PortfolioError::Validation(_) => 422,
            PortfolioError::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Builds a validation error for a single field.
    #[must_use]
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        PortfolioError::Validation(errors)
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for PortfolioError {
    fn from(error: reqwest::Error) -> Self {
        PortfolioError::Http(error.to_string())
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(error: serde_json::Error) -> Self {
        PortfolioError::Store(format!("serialization: {error}"))
    }
}

impl From<rusqlite::Error> for PortfolioError {
    fn from(error: rusqlite::Error) -> Self {
        PortfolioError::Store(format!("sqlite: {error}"))
    }
}

impl From<anyhow::Error> for PortfolioError {
    fn from(error: anyhow::Error) -> Self {
        PortfolioError::Store(error.to_string())
    }
}
