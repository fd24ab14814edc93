//! Cloud Firestore subscription store.
//!
//! Talks to the Firestore REST API v1. Writes go through `documents:commit`
//! so that `createdAt`/`updatedAt` are set by the server (`REQUEST_TIME`);
//! lookups use `documents:runQuery`.

pub mod auth;
pub mod value;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

use self::auth::{AuthError, DEFAULT_TOKEN_URI, TokenProvider};
use self::value::{Document, QueryResult};
use super::error::{StoreError, StoreOperation};
use super::storage::{SubscriptionStore, ensure_not_empty};
use super::types::{NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate};

/// Production Firestore endpoint.
pub const DEFAULT_API_URL: &str = "https://firestore.googleapis.com/v1";

const LOG_TARGET: &str = "yoco_subscriptions::store";

/// Firestore connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    pub client_email: Option<String>,
    #[serde(skip)]
    pub private_key: Option<SecretString>,
    /// `host:port` of a local emulator. Disables service-account auth.
    pub emulator_host: Option<String>,
    /// Override for the REST base URL.
    pub api_url: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            client_email: None,
            private_key: None,
            emulator_host: None,
            api_url: None,
            collection: default_collection(),
            token_uri: default_token_uri(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_collection() -> String {
    "subscriptions".to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl FirestoreConfig {
    #[must_use]
    pub fn uses_emulator(&self) -> bool {
        self.emulator_host.is_some()
    }

    /// REST base URL: explicit override, then emulator, then production.
    #[must_use]
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.api_url {
            return url.trim_end_matches('/').to_string();
        }
        match &self.emulator_host {
            Some(host) => format!("http://{host}/v1"),
            None => DEFAULT_API_URL.to_string(),
        }
    }

    /// Names of the credential settings that are required but unset.
    #[must_use]
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.project_id.is_none() {
            missing.push("FIREBASE_PROJECT_ID");
        }
        if !self.uses_emulator() {
            if self.client_email.is_none() {
                missing.push("FIREBASE_CLIENT_EMAIL");
            }
            if self.private_key.is_none() {
                missing.push("FIREBASE_PRIVATE_KEY");
            }
        }
        missing
    }
}

/// Errors constructing a [`FirestoreSubscriptionStore`].
#[derive(Debug, thiserror::Error)]
pub enum FirestoreSetupError {
    #[error("missing Firestore settings: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Failure of a single REST call, before it is tagged with an operation.
enum CallError {
    Status(StatusCode, String),
    Other(String),
}

impl CallError {
    fn into_store(self, operation: StoreOperation) -> StoreError {
        match self {
            Self::Status(status, message) => {
                StoreError::backend(operation, format!("HTTP {status}: {message}"))
            }
            Self::Other(detail) => StoreError::backend(operation, detail),
        }
    }
}

/// Subscription store backed by Cloud Firestore.
#[derive(Debug)]
pub struct FirestoreSubscriptionStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
    tokens: TokenProvider,
}

impl FirestoreSubscriptionStore {
    /// Build a store from settings.
    ///
    /// # Errors
    ///
    /// Fails if credentials are missing or the private key is invalid.
    pub fn new(config: &FirestoreConfig) -> Result<Self, FirestoreSetupError> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            return Err(FirestoreSetupError::MissingSettings(missing));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();

        let tokens = match (&config.client_email, &config.private_key) {
            (Some(email), Some(key)) if !config.uses_emulator() => {
                TokenProvider::service_account(http.clone(), email, key, &config.token_uri)?
            }
            _ => TokenProvider::emulator(http.clone()),
        };

        Ok(Self {
            http,
            base_url: config.base_url(),
            project_id: config.project_id.clone().unwrap_or_default(),
            collection: config.collection.clone(),
            tokens,
        })
    }

    fn documents_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_path(), self.collection, id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn call(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, CallError> {
        let token = self
            .tokens
            .bearer()
            .await
            .map_err(|e| CallError::Other(e.to_string()))?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CallError::Other(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(body);

        Err(CallError::Status(status, message))
    }

    async fn commit(&self, write: Value) -> Result<(), CallError> {
        let url = self.url(&format!("{}:commit", self.documents_path()));
        self.call(self.http.post(url).json(&json!({ "writes": [write] })))
            .await?;
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Document, CallError> {
        let url = self.url(&self.document_name(id));
        self.call(self.http.get(url))
            .await?
            .json::<Document>()
            .await
            .map_err(|e| CallError::Other(e.to_string()))
    }

    /// Subscriptions for a user, newest first, optionally filtered by status.
    async fn query(
        &self,
        user_id: &str,
        status: Option<SubscriptionStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<Subscription>, CallError> {
        let mut filters = vec![field_filter("userId", value::string_value(user_id))];
        if let Some(status) = status {
            filters.push(field_filter("status", value::string_value(status.as_str())));
        }
        let filter = if filters.len() == 1 {
            filters.remove(0)
        } else {
            json!({ "compositeFilter": { "op": "AND", "filters": filters } })
        };

        let mut structured_query = json!({
            "from": [{ "collectionId": self.collection }],
            "where": filter,
            "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
        });
        if let Some(limit) = limit {
            structured_query["limit"] = json!(limit);
        }

        let url = self.url(&format!("{}:runQuery", self.documents_path()));
        let results: Vec<QueryResult> = self
            .call(self.http.post(url).json(&json!({ "structuredQuery": structured_query })))
            .await?
            .json()
            .await
            .map_err(|e| CallError::Other(e.to_string()))?;

        results
            .iter()
            .filter_map(|r| r.document.as_ref())
            .map(|doc| value::decode(doc).map_err(CallError::Other))
            .collect()
    }
}

fn field_filter(path: &str, value: Value) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": path },
            "op": "EQUAL",
            "value": value,
        }
    })
}

fn server_timestamp(path: &str) -> Value {
    json!({ "fieldPath": path, "setToServerValue": "REQUEST_TIME" })
}

#[async_trait]
impl SubscriptionStore for FirestoreSubscriptionStore {
    async fn create(&self, subscription: NewSubscription) -> Result<Subscription, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let write = json!({
            "update": {
                "name": self.document_name(&id),
                "fields": value::encode_new(&subscription),
            },
            "currentDocument": { "exists": false },
            "updateTransforms": [server_timestamp("createdAt"), server_timestamp("updatedAt")],
        });

        self.commit(write)
            .await
            .map_err(|e| e.into_store(StoreOperation::Create))?;

        let document = self
            .fetch(&id)
            .await
            .map_err(|e| e.into_store(StoreOperation::Create))?;
        let stored = value::decode(&document)
            .map_err(|detail| StoreError::backend(StoreOperation::Create, detail))?;

        tracing::info!(
            target: LOG_TARGET,
            subscription_id = %stored.id,
            user_id = %stored.user_id,
            plan_id = %stored.plan_id,
            "Subscription created"
        );

        Ok(stored)
    }

    async fn get_active_for_user(&self, user_id: &str) -> Result<Option<Subscription>, StoreError> {
        let mut found = self
            .query(user_id, Some(SubscriptionStatus::Active), Some(1))
            .await
            .map_err(|e| e.into_store(StoreOperation::Get))?;

        Ok(if found.is_empty() { None } else { Some(found.remove(0)) })
    }

    async fn update(&self, id: &str, update: SubscriptionUpdate) -> Result<(), StoreError> {
        ensure_not_empty(&update)?;

        let (fields, mask) = value::encode_update(&update);
        let write = json!({
            "update": { "name": self.document_name(id), "fields": fields },
            "updateMask": { "fieldPaths": mask },
            "currentDocument": { "exists": true },
            "updateTransforms": [server_timestamp("updatedAt")],
        });

        self.commit(write).await.map_err(|e| match e {
            CallError::Status(StatusCode::NOT_FOUND, _) => StoreError::NotFound {
                operation: StoreOperation::Update,
                id: id.to_string(),
            },
            other => other.into_store(StoreOperation::Update),
        })?;

        tracing::info!(
            target: LOG_TARGET,
            subscription_id = %id,
            status = ?update.status,
            "Subscription updated"
        );

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.query(user_id, None, None)
            .await
            .map_err(|e| e.into_store(StoreOperation::List))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.tokens.clear().await;
        tracing::debug!(target: LOG_TARGET, "Firestore store closed");
        Ok(())
    }
}
