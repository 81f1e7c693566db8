//! OAuth access tokens for the managed store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::credentials::{CredentialSource, ServiceAccountKey};
use crate::errors::PortfolioError;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens for one credential.
pub struct TokenProvider {
    source: CredentialSource,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    #[must_use]
    pub fn new(source: CredentialSource, http: Client) -> Self {
        Self {
            source,
            http,
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        self.source.project_id()
    }

    /// Returns a valid bearer token, fetching a new one when the cached token
    /// is missing or about to expire.
    ///
    /// # Errors
    ///
    /// Returns an error if signing the assertion or the token request fails.
    pub async fn access_token(&self) -> Result<String, PortfolioError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let response = match &self.source {
            CredentialSource::ServiceAccount(key) => self.exchange_assertion(key, now).await?,
            CredentialSource::Metadata { .. } => self.fetch_from_metadata().await?,
        };
        let expires_at = now + chrono::Duration::seconds(response.expires_in.unwrap_or(3600));
        debug!(%expires_at, "Obtained access token");

        let value = response.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    async fn exchange_assertion(
        &self,
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<TokenResponse, PortfolioError> {
        let token_uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let assertion = sign_assertion(key, token_uri, now)?;
        info!(client_email = %key.client_email, "Requesting access token");

        let response = self
            .http
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        parse_token_response(response).await
    }

    async fn fetch_from_metadata(&self) -> Result<TokenResponse, PortfolioError> {
        let response = self
            .http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .timeout(Duration::from_secs(2))
            .send()
            .await?;
        parse_token_response(response).await
    }
}

async fn parse_token_response(response: reqwest::Response) -> Result<TokenResponse, PortfolioError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PortfolioError::Credential(format!(
            "token endpoint returned {status}: {body}"
        )));
    }
    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| PortfolioError::Credential(format!("token response: {e}")))
}

/// Builds the RS256-signed JWT used in the JWT-bearer grant.
///
/// # Errors
///
/// Returns a `Credential` error if the private key cannot be used for signing.
pub fn sign_assertion(
    key: &ServiceAccountKey,
    audience: &str,
    now: DateTime<Utc>,
) -> Result<String, PortfolioError> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| PortfolioError::Credential(format!("private key: {e}")))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&key.private_key_id);

    let iat = now.timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: DATASTORE_SCOPE,
        aud: audience,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| PortfolioError::Credential(format!("sign assertion: {e}")))
}
