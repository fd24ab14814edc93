//! Payment types shared by the gateway client and the request flow.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a charge as reported by the gateway.
///
/// Only the provider's `"successful"` status counts as a success; every other
/// status string collapses to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Successful,
    Failed,
}

impl PaymentStatus {
    /// Map a raw provider status string.
    #[must_use]
    pub fn from_provider(status: &str) -> Self {
        if status == "successful" {
            Self::Successful
        } else {
            Self::Failed
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A charge owned by the gateway. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    /// Amount in decimal currency units (e.g. `49.99`).
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Payment {
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Successful
    }
}

/// Loosely typed metadata attached to a charge.
///
/// Only `userId` and `planId` are read by the service; any other keys are kept
/// in `extra` and forwarded to the gateway untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentMetadata {
    /// Metadata naming a subscriber and the plan they are paying for.
    #[must_use]
    pub fn for_plan(user_id: impl Into<String>, plan_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            plan_id: Some(plan_id.into()),
            extra: Map::new(),
        }
    }

    /// The `(userId, planId)` pair, when both are present and non-empty.
    #[must_use]
    pub fn subscriber(&self) -> Option<(&str, &str)> {
        let user_id = self.user_id.as_deref().filter(|s| !s.is_empty())?;
        let plan_id = self.plan_id.as_deref().filter(|s| !s.is_empty())?;
        Some((user_id, plan_id))
    }
}

/// A validated request to charge a tokenised card.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub token: String,
    pub amount: f64,
    pub currency: String,
    pub metadata: Option<PaymentMetadata>,
}

impl ChargeRequest {
    /// The `(userId, planId)` pair from the request metadata, if complete.
    #[must_use]
    pub fn subscriber(&self) -> Option<(&str, &str)> {
        self.metadata.as_ref().and_then(PaymentMetadata::subscriber)
    }
}

/// Convert a decimal amount to integer minor units, rounding to nearest.
#[must_use]
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert integer minor units back to a decimal amount.
#[must_use]
pub fn from_minor_units(amount_in_cents: i64) -> f64 {
    amount_in_cents as f64 / 100.0
}
