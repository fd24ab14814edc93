//! Access tokens for the Firestore REST API.
//!
//! Service accounts use the OAuth2 JWT bearer grant: a short-lived assertion
//! is signed with the account's RSA key and exchanged for an access token,
//! which is cached until shortly before it expires. The emulator accepts the
//! fixed `owner` token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Google OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECONDS: i64 = 3600;
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Errors obtaining an access token.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    #[error("failed to sign token assertion: {0}")]
    Signing(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECONDS
}

struct CachedToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECONDS) < self.expires_at
    }
}

enum TokenSource {
    Emulator,
    ServiceAccount {
        client_email: String,
        encoding_key: EncodingKey,
        token_uri: String,
    },
}

/// Supplies bearer tokens for Firestore requests.
pub struct TokenProvider {
    http: reqwest::Client,
    source: TokenSource,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Tokens for the local Firestore emulator.
    #[must_use]
    pub fn emulator(http: reqwest::Client) -> Self {
        Self {
            http,
            source: TokenSource::Emulator,
            cached: RwLock::new(None),
        }
    }

    /// Tokens for a service account.
    ///
    /// `private_key` is a PEM-encoded RSA key; escaped `\n` sequences, as
    /// commonly found in environment variables, are unescaped first.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKey`] if the key cannot be parsed.
    pub fn service_account(
        http: reqwest::Client,
        client_email: impl Into<String>,
        private_key: &SecretString,
        token_uri: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let pem = unescape_private_key(private_key.expose_secret());
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        Ok(Self {
            http,
            source: TokenSource::ServiceAccount {
                client_email: client_email.into(),
                encoding_key,
                token_uri: token_uri.into(),
            },
            cached: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn is_emulator(&self) -> bool {
        matches!(self.source, TokenSource::Emulator)
    }

    /// A bearer token valid for at least the refresh margin.
    pub async fn bearer(&self) -> Result<String, AuthError> {
        let (client_email, encoding_key, token_uri) = match &self.source {
            TokenSource::Emulator => return Ok("owner".to_string()),
            TokenSource::ServiceAccount {
                client_email,
                encoding_key,
                token_uri,
            } => (client_email, encoding_key, token_uri),
        };

        let now = Utc::now();
        if let Some(token) = self.cached.read().await.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.expose_secret().to_string());
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.expose_secret().to_string());
        }

        let assertion = sign_assertion(client_email, encoding_key, token_uri, now)?;
        let response = self
            .http
            .post(token_uri.as_str())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("HTTP {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        tracing::debug!(
            target: "yoco_subscriptions::store",
            expires_in = token.expires_in,
            "Obtained Firestore access token"
        );

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: SecretString::from(token.access_token),
            expires_at: now + Duration::seconds(token.expires_in),
        });

        Ok(value)
    }

    /// Drop any cached token.
    pub async fn clear(&self) {
        *self.cached.write().await = None;
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            TokenSource::Emulator => "emulator",
            TokenSource::ServiceAccount { .. } => "service_account",
        };
        f.debug_struct("TokenProvider")
            .field("source", &source)
            .finish_non_exhaustive()
    }
}

fn sign_assertion(
    client_email: &str,
    encoding_key: &EncodingKey,
    token_uri: &str,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: client_email,
        scope: DATASTORE_SCOPE,
        aud: token_uri,
        iat,
        exp: iat + ASSERTION_TTL_SECONDS,
    };

    encode(&Header::new(Algorithm::RS256), &claims, encoding_key)
        .map_err(|e| AuthError::Signing(e.to_string()))
}

fn unescape_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}
