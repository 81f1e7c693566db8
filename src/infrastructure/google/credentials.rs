//! Discovery of the credential used to reach the managed store.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::config::AppConfig;
use crate::errors::PortfolioError;

/// Service-account files looked up in the working directory during development.
pub const LOCAL_CREDENTIAL_FILES: [&str; 3] = [
    "firebase-service-account.json",
    "serviceAccountKey.json",
    "service-account.json",
];

const REQUIRED_FIELDS: [&str; 4] = ["type", "project_id", "private_key", "client_email"];

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parses and validates a service-account JSON document.
    ///
    /// # Errors
    ///
    /// Returns a `Credential` error if the JSON is invalid, required fields
    /// are missing, or the document is not a service account.
    pub fn from_json(raw: &str) -> Result<Self, PortfolioError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| PortfolioError::Credential(format!("invalid JSON: {e}")))?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| value.get(*field).is_none_or(Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(PortfolioError::Credential(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let key: Self = serde_json::from_value(value)
            .map_err(|e| PortfolioError::Credential(format!("malformed service account: {e}")))?;
        if key.key_type != "service_account" {
            return Err(PortfolioError::Credential(format!(
                "unsupported credential type '{}'",
                key.key_type
            )));
        }
        Ok(key)
    }

    /// # Errors
    ///
    /// Returns a `Credential` error if the file is missing, empty or invalid.
    pub fn from_file(path: &Path) -> Result<Self, PortfolioError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PortfolioError::Credential(format!("cannot read {}: {e}", path.display()))
        })?;
        if raw.trim().is_empty() {
            return Err(PortfolioError::Credential(format!(
                "{} is empty",
                path.display()
            )));
        }
        Self::from_json(&raw)
    }
}

/// Where the managed-store access token comes from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    ServiceAccount(ServiceAccountKey),
    /// The platform metadata server of the hosting environment.
    Metadata { project_id: String },
}

impl CredentialSource {
    #[must_use]
    pub fn project_id(&self) -> &str {
        match self {
            CredentialSource::ServiceAccount(key) => &key.project_id,
            CredentialSource::Metadata { project_id } => project_id,
        }
    }
}

type Step = fn(&AppConfig, &Path) -> Result<Option<CredentialSource>, PortfolioError>;

/// Runs the discovery chain relative to the current directory.
///
/// # Errors
///
/// Returns a `Credential` error when no step produced a usable credential.
pub fn discover(config: &AppConfig) -> Result<CredentialSource, PortfolioError> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_in(config, &cwd)
}

/// Tries, in order: the inline JSON key, the configured key file, local key
/// files (development only), then default credentials. A step that is
/// configured but broken is logged and skipped.
///
/// # Errors
///
/// Returns a `Credential` error when no step produced a usable credential.
pub fn discover_in(config: &AppConfig, dir: &Path) -> Result<CredentialSource, PortfolioError> {
    let steps: [(&str, Step); 4] = [
        ("environment JSON", from_env_json),
        ("environment file", from_env_file),
        ("local file", from_local_file),
        ("default credentials", from_default_credentials),
    ];

    for (name, step) in steps {
        match step(config, dir) {
            Ok(Some(source)) => {
                info!(method = name, "Credential found");
                return Ok(with_project_override(config, source));
            }
            Ok(None) => {}
            Err(e) => warn!(method = name, "Credential step failed: {}", e),
        }
    }

    Err(PortfolioError::Credential(
        "no usable credential found".to_string(),
    ))
}

fn with_project_override(config: &AppConfig, source: CredentialSource) -> CredentialSource {
    match (source, &config.firebase_project_id) {
        (CredentialSource::ServiceAccount(mut key), Some(project)) => {
            key.project_id.clone_from(project);
            CredentialSource::ServiceAccount(key)
        }
        (source, _) => source,
    }
}

fn from_env_json(
    config: &AppConfig,
    _dir: &Path,
) -> Result<Option<CredentialSource>, PortfolioError> {
    config
        .service_account_json
        .as_deref()
        .map(|raw| ServiceAccountKey::from_json(raw).map(CredentialSource::ServiceAccount))
        .transpose()
}

fn from_env_file(
    config: &AppConfig,
    dir: &Path,
) -> Result<Option<CredentialSource>, PortfolioError> {
    config
        .service_account_path
        .as_deref()
        .map(|path| {
            ServiceAccountKey::from_file(&dir.join(path)).map(CredentialSource::ServiceAccount)
        })
        .transpose()
}

fn from_local_file(
    config: &AppConfig,
    dir: &Path,
) -> Result<Option<CredentialSource>, PortfolioError> {
    if !config.is_development() {
        return Ok(None);
    }

    for name in LOCAL_CREDENTIAL_FILES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match ServiceAccountKey::from_file(&path) {
            Ok(key) => return Ok(Some(CredentialSource::ServiceAccount(key))),
            Err(e) => warn!(file = name, "Skipping local credential: {}", e),
        }
    }
    Ok(None)
}

fn from_default_credentials(
    config: &AppConfig,
    _dir: &Path,
) -> Result<Option<CredentialSource>, PortfolioError> {
    if let Some(path) = config.google_application_credentials.as_deref() {
        return ServiceAccountKey::from_file(Path::new(path))
            .map(|key| Some(CredentialSource::ServiceAccount(key)));
    }

    Ok(config
        .firebase_project_id
        .clone()
        .map(|project_id| CredentialSource::Metadata { project_id }))
}
