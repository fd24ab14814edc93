//! Scriptable in-memory payment gateway.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::gateway::{
    ChargeRequest, GatewayError, GatewayOperation, Payment, PaymentGateway, PaymentStatus,
};

/// In-memory [`PaymentGateway`] for tests and local runs.
///
/// Charges succeed by default. Queue specific outcomes with
/// [`push_outcome`](Self::push_outcome) or change the default status with
/// [`with_status`](Self::with_status). Every verified charge can be fetched
/// again through `get_payment`.
#[derive(Clone, Default)]
pub struct MockGateway {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    default_status: Mutex<Option<PaymentStatus>>,
    delay: Mutex<Option<Duration>>,
    outcomes: Mutex<VecDeque<Result<Payment, GatewayError>>>,
    payments: Mutex<HashMap<String, Payment>>,
    requests: Mutex<Vec<ChargeRequest>>,
    verify_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status reported for charges without a queued outcome.
    #[must_use]
    pub fn with_status(self, status: PaymentStatus) -> Self {
        *lock(&self.inner.default_status) = Some(status);
        self
    }

    /// Hold every `verify_payment` call for `delay` before answering.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *lock(&self.inner.delay) = Some(delay);
        self
    }

    /// Queue the result of the next `verify_payment` call.
    pub fn push_outcome(&self, outcome: Result<Payment, GatewayError>) {
        lock(&self.inner.outcomes).push_back(outcome);
    }

    /// Queue a provider rejection for the next `verify_payment` call.
    pub fn reject_next(&self, message: impl Into<String>, http_status: u16) {
        let message = message.into();
        self.push_outcome(Err(GatewayError::Rejected {
            operation: GatewayOperation::VerifyPayment,
            body: Some(serde_json::json!({ "message": message })),
            message,
            http_status,
        }));
    }

    /// Make a payment available to `get_payment`.
    pub fn insert_payment(&self, payment: Payment) {
        lock(&self.inner.payments).insert(payment.id.clone(), payment);
    }

    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.inner.verify_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.inner.get_calls.load(Ordering::SeqCst)
    }

    /// Every charge request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ChargeRequest> {
        lock(&self.inner.requests).clone()
    }

    fn charge(&self, request: &ChargeRequest, seq: usize) -> Payment {
        let status = (*lock(&self.inner.default_status)).unwrap_or(PaymentStatus::Successful);
        Payment {
            id: format!("ch_mock_{seq}"),
            amount: request.amount,
            currency: request.currency.clone(),
            status,
            metadata: request
                .metadata
                .as_ref()
                .and_then(|m| serde_json::to_value(m).ok()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn verify_payment(&self, request: &ChargeRequest) -> Result<Payment, GatewayError> {
        let seq = self.inner.verify_calls.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.inner.requests).push(request.clone());

        let delay = *lock(&self.inner.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = lock(&self.inner.outcomes).pop_front();
        let payment = match outcome {
            Some(outcome) => outcome?,
            None => self.charge(request, seq),
        };

        self.insert_payment(payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, GatewayError> {
        self.inner.get_calls.fetch_add(1, Ordering::SeqCst);

        lock(&self.inner.payments)
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                operation: GatewayOperation::GetPayment,
                message: "Charge not found".to_string(),
                http_status: 404,
                body: None,
            })
    }
}
