use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:///./portfolio.db";
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_PORT: u16 = 8000;

pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "https://temiladeafo-portfolio.vercel.app",
    "https://portfolio-zm76.onrender.com",
];

/// Which family of stores the process should try at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Managed document store, degrading to memory when unreachable.
    Document,
    /// `SQLite` database at `database_url`.
    Relational,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_account_json: Option<String>,
    pub service_account_path: Option<String>,
    pub firebase_project_id: Option<String>,
    /// Key file named by `GOOGLE_APPLICATION_CREDENTIALS`, the last
    /// discovery step before the metadata server.
    pub google_application_credentials: Option<String>,
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub database_url: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let storage_backend = match env::var("STORAGE_BACKEND").ok().as_deref() {
            None | Some("" | "document" | "firestore") => StorageBackend::Document,
            Some("relational" | "sqlite") => StorageBackend::Relational,
            Some(other) => return Err(format!("STORAGE_BACKEND: unknown backend '{other}'")),
        };

        Ok(Self {
            service_account_json: non_empty("FIREBASE_SERVICE_ACCOUNT_KEY"),
            service_account_path: non_empty("FIREBASE_SERVICE_ACCOUNT_PATH"),
            firebase_project_id: non_empty("FIREBASE_PROJECT_ID")
                .or_else(|| non_empty("GOOGLE_CLOUD_PROJECT")),
            google_application_credentials: non_empty("GOOGLE_APPLICATION_CREDENTIALS"),
            environment: non_empty("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            storage_backend,
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            smtp_server: non_empty("SMTP_SERVER")
                .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port: parse_port("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            sender_email: non_empty("SENDER_EMAIL"),
            sender_password: non_empty("SENDER_PASSWORD"),
            port: parse_port("PORT", DEFAULT_PORT)?,
            cors_allowed_origins: non_empty("CORS_ALLOWED_ORIGINS").map_or_else(
                || DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
                |raw| parse_origins(&raw),
            ),
        })
    }

    /// Local service-account files are only read during development.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for AppConfig {
    /// Configuration with no credentials and no SMTP password, i.e. the
    /// in-memory store and the log-only notifier.
    fn default() -> Self {
        Self {
            service_account_json: None,
            service_account_path: None,
            firebase_project_id: None,
            google_application_credentials: None,
            environment: "test".to_string(),
            storage_backend: StorageBackend::Document,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            sender_email: None,
            sender_password: None,
            port: DEFAULT_PORT,
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_port(key: &str, default: u16) -> Result<u16, String> {
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("{key}: {e}")),
        None => Ok(default),
    }
}

/// Splits a comma separated origin list, dropping blanks and trailing slashes.
#[must_use]
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_origin_lists_leniently() {
        let origins = parse_origins(" http://a.test/ ,, https://b.test");
        assert_eq!(origins, vec!["http://a.test", "https://b.test"]);
    }

    #[test]
    fn default_config_targets_fallback_mode() {
        let config = AppConfig::default();
        assert!(config.service_account_json.is_none());
        assert!(config.sender_password.is_none());
        assert_eq!(config.storage_backend, StorageBackend::Document);
        assert!(!config.is_development());
    }
}
