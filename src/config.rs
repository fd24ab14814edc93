use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::cors::CorsConfig;
use crate::error::AppError;
use crate::gateway::YocoClientConfig;
use crate::security::SecurityConfig;
use crate::subscriptions::FirestoreConfig;
use crate::timeout::TimeoutConfig;
use crate::utils::get_env_with_prefix;

/// Main configuration for the service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub timeout: TimeoutConfig,
    pub cors: CorsConfig,
    pub gateway: GatewayConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Payment gateway credentials and client settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Yoco secret key (`sk_test_*` / `sk_live_*`). Never serialized.
    #[serde(skip)]
    pub secret_key: Option<SecretString>,
    #[serde(default)]
    pub client: YocoClientConfig,
}

/// Which subscription store implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Firestore,
    /// Process-local store for development; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub firestore: FirestoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Config {
    /// Longest a verification request can spend in outbound calls: the
    /// gateway retry budget, then a token exchange and a commit against
    /// Firestore.
    pub fn request_budget(&self) -> Duration {
        let store = match self.store.backend {
            StoreBackend::Firestore => {
                Duration::from_secs(self.store.firestore.timeout_seconds.saturating_mul(2))
            }
            StoreBackend::Memory => Duration::ZERO,
        };
        self.gateway.client.retry_budget() + store
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set the maximum request body size in bytes
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.config.security = security;
        self
    }

    pub fn with_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_gateway_secret(mut self, secret_key: impl Into<String>) -> Self {
        self.config.gateway.secret_key = Some(SecretString::from(secret_key.into()));
        self
    }

    pub fn with_gateway_client(mut self, client: YocoClientConfig) -> Self {
        self.config.gateway.client = client;
        self
    }

    pub fn with_store_backend(mut self, backend: StoreBackend) -> Self {
        self.config.store.backend = backend;
        self
    }

    pub fn with_firestore(mut self, firestore: FirestoreConfig) -> Self {
        self.config.store.firestore = firestore;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Every variable is looked up as `APP_<NAME>` first, then `<NAME>`.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.cors = CorsConfig::from_env();
        self.config.security = SecurityConfig::from_env();
        self.config.timeout = TimeoutConfig::from_env();

        // Gateway
        if let Some(secret) = get_env_with_prefix("YOCO_SECRET_KEY") {
            self.config.gateway.secret_key = Some(SecretString::from(secret));
        }
        let client = &mut self.config.gateway.client;
        if let Some(url) = get_env_with_prefix("YOCO_API_URL") {
            client.base_url = url;
        }
        if let Some(seconds) = get_env_with_prefix("GATEWAY_TIMEOUT_SECONDS") {
            if let Ok(s) = seconds.parse() {
                client.timeout_seconds = s;
            }
        }
        if let Some(retries) = get_env_with_prefix("GATEWAY_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                client.max_retries = r;
            }
        }

        // Store
        if let Some(backend) = get_env_with_prefix("STORE_BACKEND") {
            match backend.parse() {
                Ok(b) => self.config.store.backend = b,
                Err(e) => tracing::warn!(error = %e, "Ignoring STORE_BACKEND"),
            }
        }
        let firestore = &mut self.config.store.firestore;
        firestore.project_id = get_env_with_prefix("FIREBASE_PROJECT_ID");
        firestore.client_email = get_env_with_prefix("FIREBASE_CLIENT_EMAIL");
        firestore.private_key = get_env_with_prefix("FIREBASE_PRIVATE_KEY").map(SecretString::from);
        firestore.emulator_host = get_env_with_prefix("FIRESTORE_EMULATOR_HOST");
        firestore.api_url = get_env_with_prefix("FIRESTORE_API_URL");
        if let Some(collection) = get_env_with_prefix("SUBSCRIPTIONS_COLLECTION") {
            firestore.collection = collection;
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if:
    /// - the server address (host:port) is invalid, or the port is 0
    /// - the log level is unknown
    /// - a timeout is 0 while enabled
    /// - the request timeout does not outlast the gateway and store calls
    /// - the gateway secret key is missing
    /// - Firestore credentials are missing for the `firestore` backend
    pub fn build(self) -> crate::error::Result<Config> {
        let config = self.config;

        config.server.addr().map_err(|e| {
            AppError::config(format!(
                "Invalid server address {}:{} - {}",
                config.server.host, config.server.port, e
            ))
        })?;

        if config.server.port == 0 {
            return Err(AppError::config("Server port must be greater than 0"));
        }

        if config.server.max_body_size == 0 {
            return Err(AppError::config("Maximum body size must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(AppError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if config.timeout.enabled && config.timeout.timeout_seconds == 0 {
            return Err(AppError::config(
                "Request timeout must be greater than 0 when enabled",
            ));
        }

        if config.gateway.secret_key.is_none() {
            return Err(AppError::config("YOCO_SECRET_KEY is required"));
        }

        if config.gateway.client.timeout_seconds == 0 {
            return Err(AppError::config("Gateway timeout must be greater than 0"));
        }

        if config.timeout.enabled {
            let needed = config.request_budget();
            if config.timeout.duration() <= needed {
                return Err(AppError::config(format!(
                    "Request timeout of {}s must exceed the {:.1}s a verification can take",
                    config.timeout.timeout_seconds,
                    needed.as_secs_f64()
                )));
            }
        }

        if config.store.backend == StoreBackend::Firestore {
            let missing = config.store.firestore.missing_settings();
            if !missing.is_empty() {
                return Err(AppError::config(format!(
                    "Missing Firestore settings: {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
