//! Gateway-specific error types.
//!
//! The `Display` text of every variant is the message surfaced to API callers:
//! the provider's own message when it sent one, otherwise a fixed fallback for
//! the operation.

use serde_json::Value;

/// Gateway operation an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOperation {
    VerifyPayment,
    GetPayment,
}

impl GatewayOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyPayment => "verify_payment",
            Self::GetPayment => "get_payment",
        }
    }

    /// Message used when the provider gave none.
    #[must_use]
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::VerifyPayment => "Payment verification failed",
            Self::GetPayment => "Failed to fetch payment",
        }
    }
}

impl std::fmt::Display for GatewayOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a [`PaymentGateway`](super::PaymentGateway).
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The provider answered with a non-success HTTP status.
    #[error("{message}")]
    Rejected {
        operation: GatewayOperation,
        message: String,
        http_status: u16,
        /// Response body as sent by the provider, if it was JSON.
        body: Option<Value>,
    },

    /// The request never produced a provider response.
    #[error("{}", operation.failure_message())]
    Transport {
        operation: GatewayOperation,
        detail: String,
        timed_out: bool,
        /// The connection was never established, so nothing reached the
        /// provider.
        connect_failed: bool,
    },

    /// The provider answered 2xx with a body we could not read.
    #[error("{}", operation.failure_message())]
    InvalidResponse {
        operation: GatewayOperation,
        detail: String,
    },
}

impl GatewayError {
    #[must_use]
    pub fn operation(&self) -> GatewayOperation {
        match self {
            Self::Rejected { operation, .. }
            | Self::Transport { operation, .. }
            | Self::InvalidResponse { operation, .. } => *operation,
        }
    }

    /// Detail for the `error` field of a failure response.
    ///
    /// Prefers the provider's response body, then the transport detail, then
    /// the message itself.
    #[must_use]
    pub fn details(&self) -> Value {
        match self {
            Self::Rejected { body: Some(body), .. } => body.clone(),
            Self::Rejected { message, .. } => Value::String(message.clone()),
            Self::Transport { detail, .. } | Self::InvalidResponse { detail, .. } => {
                Value::String(detail.clone())
            }
        }
    }

    /// Check if this error is worth retrying at the transport level.
    ///
    /// A charge token is single-use, so `VerifyPayment` is retried only when
    /// the provider cannot have acted on the request: a failed connection or
    /// rate limiting (429). `GetPayment` is a read and is also retried on
    /// timeouts and server errors (5xx).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match (self.operation(), self) {
            (_, Self::Rejected { http_status: 429, .. }) => true,
            (_, Self::Transport { connect_failed: true, .. }) => true,
            (GatewayOperation::GetPayment, Self::Transport { .. }) => true,
            (GatewayOperation::GetPayment, Self::Rejected { http_status, .. }) => {
                (500..600).contains(http_status)
            }
            _ => false,
        }
    }

    /// HTTP status returned by the provider, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Rejected { http_status, .. } => Some(*http_status),
            _ => None,
        }
    }
}
