use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use yoco_subscriptions::gateway::{Payment, PaymentMetadata, PaymentStatus};
use yoco_subscriptions::subscriptions::{
    InMemorySubscriptionStore, NewSubscription, SubscriptionStatus, SubscriptionStore,
};
use yoco_subscriptions::gateway::YocoClientConfig;
use yoco_subscriptions::testing::{self, MockGateway};
use yoco_subscriptions::{ConfigBuilder, StoreBackend, TimeoutConfig};

fn verify_body(metadata: Value) -> Value {
    json!({
        "token": "tok_test_123",
        "amount": 99.0,
        "currency": "ZAR",
        "metadata": metadata
    })
}

#[tokio::test]
async fn test_missing_fields_never_reach_gateway() {
    let bodies = [
        json!({"amount": 99.0, "currency": "ZAR"}),
        json!({"token": "tok_1", "currency": "ZAR"}),
        json!({"token": "tok_1", "amount": 99.0}),
        json!({"token": "tok_1", "amount": 0, "currency": "ZAR"}),
        json!({"token": "tok_1", "amount": "99", "currency": "ZAR"}),
        json!({}),
    ];

    for body in bodies {
        let gateway = MockGateway::new();
        let app = testing::test_router(gateway.clone(), InMemorySubscriptionStore::new());

        testing::post(app, "/api/payments/verify")
            .json_body(&body)
            .execute()
            .await
            .assert_bad_request()
            .assert_json_path("success", json!(false))
            .assert_json_path("message", json!("Missing required payment information"));

        assert_eq!(gateway.verify_calls(), 0, "gateway called for {body}");
    }
}

#[tokio::test]
async fn test_oversized_amount_never_reaches_gateway() {
    let gateway = MockGateway::new();
    let app = testing::test_router(gateway.clone(), InMemorySubscriptionStore::new());

    let response = testing::post(app, "/api/payments/verify")
        .json_body(&json!({"token": "tok_1", "amount": 1e20, "currency": "ZAR"}))
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("success", json!(false))
        .assert_json_path("message", json!("Missing required payment information"));

    let body: Value = response.json();
    assert_eq!(
        body["error"]["amount"][0],
        "amount must be greater than 0 and at most 1000000"
    );
    assert_eq!(gateway.verify_calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_failure() {
    let gateway = MockGateway::new();
    let app = testing::test_router(gateway.clone(), InMemorySubscriptionStore::new());

    testing::post(app, "/api/payments/verify")
        .raw_json("{\"token\": ")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("message", json!("Missing required payment information"))
        .assert_has_header("x-request-id");

    assert_eq!(gateway.verify_calls(), 0);
}

#[tokio::test]
async fn test_successful_charge_creates_subscription() {
    let gateway = MockGateway::new();
    let store = InMemorySubscriptionStore::new();
    let app = testing::test_router(gateway.clone(), store.clone());

    let response = testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(json!({"userId": "u1", "planId": "premium"})))
        .execute()
        .await
        .assert_ok()
        .assert_json()
        .assert_json_path("success", json!(true))
        .assert_json_path(
            "message",
            json!("Payment verified and subscription created successfully"),
        )
        .assert_json_path("paymentAccepted", json!(true))
        .assert_json_path("data.status", json!("successful"))
        .assert_json_path("subscription.userId", json!("u1"))
        .assert_json_path("subscription.planId", json!("premium"))
        .assert_json_path("subscription.status", json!("active"));

    assert_eq!(store.create_calls(), 1);
    let stored = store.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, SubscriptionStatus::Active);
    assert_eq!(stored[0].end_date - stored[0].start_date, Duration::days(30));

    let body: Value = response.json();
    assert_eq!(body["subscription"]["paymentId"], body["data"]["id"]);
    let start: DateTime<Utc> =
        serde_json::from_value(body["subscription"]["startDate"].clone()).unwrap();
    let end: DateTime<Utc> =
        serde_json::from_value(body["subscription"]["endDate"].clone()).unwrap();
    assert_eq!(end - start, Duration::days(30));
}

#[tokio::test]
async fn test_incomplete_metadata_skips_store() {
    let gateway = MockGateway::new();
    let store = InMemorySubscriptionStore::new();
    let app = testing::test_router(gateway.clone(), store.clone());

    testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(json!({"userId": "u1"})))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("message", json!("Payment verified successfully"))
        .assert_json_path("data.currency", json!("ZAR"))
        .assert_no_json_path("subscription");

    assert_eq!(gateway.verify_calls(), 1);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn test_failed_charge_is_still_http_success() {
    let gateway = MockGateway::new().with_status(PaymentStatus::Failed);
    let store = InMemorySubscriptionStore::new();
    let app = testing::test_router(gateway, store.clone());

    testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(json!({"userId": "u1", "planId": "premium"})))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("success", json!(true))
        .assert_json_path("paymentAccepted", json!(false))
        .assert_json_path("data.status", json!("failed"))
        .assert_no_json_path("subscription");

    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn test_metadata_extra_keys_reach_gateway() {
    let gateway = MockGateway::new();
    let app = testing::test_router(gateway.clone(), InMemorySubscriptionStore::new());

    testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(
            json!({"userId": "u1", "planId": "premium", "campaign": "spring"}),
        ))
        .execute()
        .await
        .assert_ok();

    let requests = gateway.requests();
    let metadata = requests[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.extra["campaign"], json!("spring"));
}

#[tokio::test]
async fn test_gateway_rejection_is_surfaced_verbatim() {
    let gateway = MockGateway::new();
    gateway.reject_next("Card declined by issuer", 400);
    let store = InMemorySubscriptionStore::new();
    let app = testing::test_router(gateway, store.clone());

    testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(json!({"userId": "u1", "planId": "premium"})))
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("success", json!(false))
        .assert_json_path("message", json!("Card declined by issuer"))
        .assert_json_path("error.message", json!("Card declined by issuer"));

    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn test_store_failure_after_charge() {
    let gateway = MockGateway::new();
    let store = InMemorySubscriptionStore::new();
    store.fail_writes(true);
    let app = testing::test_router(gateway.clone(), store.clone());

    testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(json!({"userId": "u1", "planId": "premium"})))
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("success", json!(false))
        .assert_json_path("message", json!("Failed to create subscription"));

    assert_eq!(gateway.verify_calls(), 1);
    assert_eq!(store.create_calls(), 1);
}

#[tokio::test]
async fn test_request_timeout_uses_failure_body() {
    let config = ConfigBuilder::new()
        .with_gateway_secret("sk_test_00000000000000000000")
        .with_store_backend(StoreBackend::Memory)
        .with_gateway_client(YocoClientConfig::new().max_retries(0).timeout_seconds(1))
        .with_timeout(TimeoutConfig {
            enabled: true,
            timeout_seconds: 2,
        })
        .build()
        .unwrap();
    let gateway = MockGateway::new().with_delay(std::time::Duration::from_secs(3));
    let store = InMemorySubscriptionStore::new();
    let app = testing::router_with_config(config, gateway.clone(), store.clone());

    testing::post(app, "/api/payments/verify")
        .json_body(&verify_body(json!({"userId": "u1", "planId": "premium"})))
        .execute()
        .await
        .assert_bad_request()
        .assert_has_header("x-request-id")
        .assert_json_path("success", json!(false))
        .assert_json_path("message", json!("Request timed out"))
        .assert_json_path("error", json!("Request exceeded 2 seconds"));

    assert_eq!(gateway.verify_calls(), 1);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn test_get_payment() {
    let gateway = MockGateway::new();
    gateway.insert_payment(Payment {
        id: "ch_42".to_string(),
        amount: 49.99,
        currency: "ZAR".to_string(),
        status: PaymentStatus::Successful,
        metadata: None,
    });
    let app = testing::test_router(gateway.clone(), InMemorySubscriptionStore::new());

    testing::get(app.clone(), "/api/payments/ch_42")
        .execute()
        .await
        .assert_ok()
        .assert_json_path("message", json!("Payment retrieved successfully"))
        .assert_json_path("data.id", json!("ch_42"))
        .assert_json_path("data.amount", json!(49.99));

    testing::get(app, "/api/payments/ch_missing")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("message", json!("Failed to retrieve payment"))
        .assert_json_path("error", json!("Charge not found"));

    assert_eq!(gateway.get_calls(), 2);
}

#[tokio::test]
async fn test_blank_path_params() {
    let app = testing::test_router(MockGateway::new(), InMemorySubscriptionStore::new());

    testing::get(app.clone(), "/api/payments/%20")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("message", json!("Payment ID is required"));

    testing::get(app, "/api/subscriptions/%20")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("message", json!("User ID is required"));
}

#[tokio::test]
async fn test_user_without_subscription_gets_null() {
    let app = testing::test_router(MockGateway::new(), InMemorySubscriptionStore::new());

    let response = testing::get(app, "/api/subscriptions/u2")
        .execute()
        .await
        .assert_ok()
        .assert_json_path("success", json!(true))
        .assert_json_path("message", json!("No active subscription found"));

    let body: Value = response.json();
    assert!(body.get("data").is_some());
    assert!(body["data"].is_null());
}

async fn seed(store: &InMemorySubscriptionStore, user: &str, plan: &str, at: DateTime<Utc>) -> String {
    let payment = Payment {
        id: format!("ch_{plan}"),
        amount: 99.0,
        currency: "ZAR".to_string(),
        status: PaymentStatus::Successful,
        metadata: serde_json::to_value(PaymentMetadata::for_plan(user, plan)).ok(),
    };
    store
        .create(NewSubscription::for_payment(&payment, user, plan, at))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_active_subscription_lookup_and_history() {
    let store = InMemorySubscriptionStore::new();
    let now = Utc::now();
    seed(&store, "u1", "basic", now - Duration::days(40)).await;
    let cancelled = seed(&store, "u1", "premium", now - Duration::days(1)).await;
    let latest = seed(&store, "u1", "pro", now).await;
    store.cancel(&cancelled).await.unwrap();

    let app = testing::test_router(MockGateway::new(), store.clone());

    testing::get(app.clone(), "/api/subscriptions/u1")
        .execute()
        .await
        .assert_ok()
        .assert_json_path("message", json!("Subscription found"))
        .assert_json_path("data.id", json!(latest))
        .assert_json_path("data.planId", json!("pro"));

    testing::get(app, "/api/subscriptions/u1/history")
        .execute()
        .await
        .assert_ok()
        .assert_json_path("message", json!("Subscriptions retrieved successfully"))
        .assert_json_path("data.0.planId", json!("pro"))
        .assert_json_path("data.1.status", json!("cancelled"))
        .assert_json_path("data.2.planId", json!("basic"))
        .assert_no_json_path("data.3");
}

#[tokio::test]
async fn test_store_read_failure() {
    let store = InMemorySubscriptionStore::new();
    store.fail_reads(true);
    let app = testing::test_router(MockGateway::new(), store);

    testing::get(app.clone(), "/api/subscriptions/u1")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("success", json!(false))
        .assert_json_path("message", json!("Failed to retrieve subscription"));

    testing::get(app, "/api/subscriptions/u1/history")
        .execute()
        .await
        .assert_bad_request()
        .assert_json_path("message", json!("Failed to list subscriptions"));
}

#[tokio::test]
async fn test_health_and_middleware_headers() {
    let app = testing::test_router(MockGateway::new(), InMemorySubscriptionStore::new());

    testing::get(app, "/health")
        .header("x-request-id", "req-123")
        .execute()
        .await
        .assert_ok()
        .assert_json_path("status", json!("ok"))
        .assert_header("x-request-id", "req-123")
        .assert_header("x-content-type-options", "nosniff")
        .assert_header("x-frame-options", "DENY")
        .assert_header("cross-origin-resource-policy", "cross-origin");
}

#[tokio::test]
async fn test_cors_preflight_for_frontend_origin() {
    let app = testing::test_router(MockGateway::new(), InMemorySubscriptionStore::new());

    testing::options(app, "/api/payments/verify")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .execute()
        .await
        .assert_header("access-control-allow-origin", "http://localhost:5173")
        .assert_header("access-control-allow-credentials", "true");
}
