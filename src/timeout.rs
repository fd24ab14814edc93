//! Server-side request timeout.
//!
//! Requests still running after the configured duration are cancelled and
//! answered with the usual failure body. The limit must outlast the gateway
//! retry budget; [`ConfigBuilder::build`](crate::config::ConfigBuilder::build)
//! checks this.

use crate::error::AppError;
use crate::utils::get_env_with_prefix;
use axum::{BoxError, Router, error_handling::HandleErrorLayer};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower::ServiceBuilder;
use tower::timeout::{TimeoutLayer, error::Elapsed};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl TimeoutConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Reads `TIMEOUT_ENABLED` and `TIMEOUT_SECONDS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = get_env_with_prefix("TIMEOUT_ENABLED") {
            config.enabled = enabled.parse().unwrap_or(true);
        }

        if let Some(seconds) = get_env_with_prefix("TIMEOUT_SECONDS") {
            if let Ok(s) = seconds.parse() {
                config.timeout_seconds = s;
            }
        }

        config
    }
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Wrap `router` in the request timeout, unless disabled.
pub fn apply_timeout<S>(router: Router<S>, config: &TimeoutConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if !config.enabled {
        return router;
    }

    let limit = config.duration();
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                timeout_error(err, limit)
            }))
            .layer(TimeoutLayer::new(limit)),
    )
}

fn timeout_error(err: BoxError, limit: Duration) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout(limit)
    } else {
        AppError::Anyhow(anyhow::anyhow!(err))
    }
}
