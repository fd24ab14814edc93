//! Subscription records and their write models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::Payment;

/// Length of the access period granted by one payment.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Parse a stored status string. Unknown values are treated as expired.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "cancelled" => Self::Cancelled,
            _ => Self::Expired,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted subscription record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Identifier assigned by the store.
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_id: String,
    pub amount: f64,
    pub currency: String,
    /// Assigned by the store; absent until the write is acknowledged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Whole days left in the access period, zero once it has ended.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.end_date - now).num_days().max(0)
    }
}

/// Fields for a subscription that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_id: String,
    pub amount: f64,
    pub currency: String,
}

impl NewSubscription {
    /// An active subscription paid for by `payment`, starting at `now`.
    #[must_use]
    pub fn for_payment(
        payment: &Payment,
        user_id: impl Into<String>,
        plan_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            plan_id: plan_id.into(),
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: now + Duration::days(SUBSCRIPTION_PERIOD_DAYS),
            payment_id: payment.id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
        }
    }

    /// Attach store-assigned fields.
    #[must_use]
    pub fn into_subscription(
        self,
        id: impl Into<String>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Subscription {
        Subscription {
            id: id.into(),
            user_id: self.user_id,
            plan_id: self.plan_id,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            payment_id: self.payment_id,
            amount: self.amount,
            currency: self.currency,
            created_at,
            updated_at,
        }
    }
}

/// Partial update of the mutable subscription fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl SubscriptionUpdate {
    /// An update that only changes the status.
    #[must_use]
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plan_id.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.payment_id.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
    }

    /// Apply the set fields to an existing record.
    pub fn apply_to(&self, subscription: &mut Subscription) {
        if let Some(plan_id) = &self.plan_id {
            subscription.plan_id.clone_from(plan_id);
        }
        if let Some(status) = self.status {
            subscription.status = status;
        }
        if let Some(start_date) = self.start_date {
            subscription.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            subscription.end_date = end_date;
        }
        if let Some(payment_id) = &self.payment_id {
            subscription.payment_id.clone_from(payment_id);
        }
        if let Some(amount) = self.amount {
            subscription.amount = amount;
        }
        if let Some(currency) = &self.currency {
            subscription.currency.clone_from(currency);
        }
    }
}
