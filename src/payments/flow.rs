//! Verify-then-subscribe flow.
//!
//! The gateway call and the store write run strictly in sequence. Nothing is
//! retried here and nothing compensates a verified charge whose subscription
//! could not be written.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::gateway::{ChargeRequest, Payment, PaymentGateway};
use crate::subscriptions::{NewSubscription, Subscription, SubscriptionStore};

/// Result of a verification that reached the gateway and succeeded as a
/// request. The charge itself may still have failed.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// Successful charge with a complete subscriber; a subscription was created.
    Subscribed {
        payment: Payment,
        subscription: Subscription,
    },
    /// Any other charge: failed status, or metadata without a subscriber.
    Verified { payment: Payment },
}

impl VerifyOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            Self::Subscribed { payment, .. } | Self::Verified { payment } => payment,
        }
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        match self {
            Self::Subscribed { subscription, .. } => Some(subscription),
            Self::Verified { .. } => None,
        }
    }
}

/// Verify a charge and, when it succeeded for a known subscriber, open a
/// subscription starting at `now`.
pub async fn verify_and_subscribe(
    gateway: &dyn PaymentGateway,
    store: &dyn SubscriptionStore,
    request: &ChargeRequest,
    now: DateTime<Utc>,
) -> Result<VerifyOutcome, AppError> {
    let payment = gateway.verify_payment(request).await?;

    tracing::info!(
        target: "yoco_subscriptions::payments",
        payment_id = %payment.id,
        status = %payment.status,
        "Payment verified"
    );

    let subscriber = match request.subscriber() {
        Some(subscriber) if payment.is_successful() => subscriber,
        _ => return Ok(VerifyOutcome::Verified { payment }),
    };

    let (user_id, plan_id) = subscriber;
    let new_subscription = NewSubscription::for_payment(&payment, user_id, plan_id, now);

    match store.create(new_subscription).await {
        Ok(subscription) => {
            tracing::info!(
                target: "yoco_subscriptions::payments",
                payment_id = %payment.id,
                subscription_id = %subscription.id,
                user_id,
                plan_id,
                "Subscription created"
            );
            Ok(VerifyOutcome::Subscribed {
                payment,
                subscription,
            })
        }
        Err(e) => {
            // The charge stands; only the subscription record is missing.
            tracing::error!(
                target: "yoco_subscriptions::payments",
                payment_id = %payment.id,
                user_id,
                plan_id,
                error = %e.detail(),
                "Charge verified but subscription could not be created"
            );
            Err(e.into())
        }
    }
}
