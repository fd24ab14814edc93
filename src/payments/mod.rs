//! Payment verification and subscription lookup endpoints.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /api/payments/verify` | [`verify_payment`] |
//! | `GET /api/payments/{payment_id}` | [`get_payment`] |
//! | `GET /api/subscriptions/{user_id}` | [`get_user_subscription`] |
//! | `GET /api/subscriptions/{user_id}/history` | [`list_user_subscriptions`] |

mod flow;
mod handlers;
mod request;

pub use flow::{VerifyOutcome, verify_and_subscribe};
pub use handlers::{
    VerifyPaymentResponse, get_payment, get_user_subscription, list_user_subscriptions,
    verify_payment,
};
pub use request::VerifyPaymentRequest;

use axum::{
    Router,
    routing::{get, post},
};

use crate::app::AppContext;
use crate::http::RouteModule;

/// Routes for the payment flow, mounted under `/api`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentsModule;

impl RouteModule for PaymentsModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/payments/verify", post(verify_payment))
            .route("/payments/{payment_id}", get(get_payment))
            .route("/subscriptions/{user_id}", get(get_user_subscription))
            .route(
                "/subscriptions/{user_id}/history",
                get(list_user_subscriptions),
            )
    }

    fn prefix(&self) -> Option<&str> {
        Some("/api")
    }
}
