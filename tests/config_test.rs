use secrecy::ExposeSecret;
use yoco_subscriptions::gateway::YocoClientConfig;
use yoco_subscriptions::subscriptions::FirestoreConfig;
use yoco_subscriptions::{AppError, ConfigBuilder, StoreBackend, TimeoutConfig};

const SECRET: &str = "sk_test_config_key";

fn emulator() -> FirestoreConfig {
    FirestoreConfig {
        project_id: Some("demo".to_string()),
        emulator_host: Some("localhost:8080".to_string()),
        ..FirestoreConfig::default()
    }
}

#[test]
fn test_missing_gateway_secret_refuses_to_start() {
    let err = ConfigBuilder::new()
        .with_store_backend(StoreBackend::Memory)
        .build()
        .unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(err.to_string(), "Configuration error: YOCO_SECRET_KEY is required");
}

#[test]
fn test_firestore_backend_requires_credentials() {
    let err = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .build()
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("FIREBASE_PROJECT_ID"), "{message}");
    assert!(message.contains("FIREBASE_PRIVATE_KEY"), "{message}");
}

#[test]
fn test_emulator_needs_only_project() {
    let config = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_firestore(emulator())
        .build()
        .unwrap();

    assert_eq!(config.store.backend, StoreBackend::Firestore);
    assert_eq!(config.store.firestore.collection, "subscriptions");
    assert_eq!(
        config.gateway.secret_key.as_ref().unwrap().expose_secret(),
        SECRET
    );
}

#[test]
fn test_defaults() {
    let config = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_store_backend(StoreBackend::Memory)
        .build()
        .unwrap();

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.max_body_size, 1024 * 1024);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.timeout.timeout_seconds, 60);
    assert_eq!(config.gateway.client.timeout_seconds, 10);
    assert_eq!(config.gateway.client.max_retries, 2);
    assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
}

#[test]
fn test_invalid_values_are_rejected() {
    let base = || {
        ConfigBuilder::new()
            .with_gateway_secret(SECRET)
            .with_store_backend(StoreBackend::Memory)
    };

    assert!(base().with_port(0).build().is_err());
    assert!(base().with_log_level("loud").build().is_err());
    assert!(base().with_host("not an address").build().is_err());
    assert!(base().with_max_body_size(0).build().is_err());
}

#[test]
fn test_secret_is_not_serialized() {
    let config = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_store_backend(StoreBackend::Memory)
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains(SECRET));
    assert!(!format!("{config:?}").contains(SECRET));
}

#[test]
fn test_request_timeout_must_outlast_gateway_retries() {
    let timeout = |seconds| TimeoutConfig {
        enabled: true,
        timeout_seconds: seconds,
    };

    // Three 10 s attempts plus backoff take just over 30 s.
    let err = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_store_backend(StoreBackend::Memory)
        .with_timeout(timeout(30))
        .build()
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().contains("must exceed"), "{err}");

    let config = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_store_backend(StoreBackend::Memory)
        .with_timeout(timeout(31))
        .build()
        .unwrap();
    assert!(config.timeout.duration() > config.request_budget());

    // A single attempt needs less time.
    assert!(
        ConfigBuilder::new()
            .with_gateway_secret(SECRET)
            .with_store_backend(StoreBackend::Memory)
            .with_gateway_client(YocoClientConfig::new().max_retries(0))
            .with_timeout(timeout(11))
            .build()
            .is_ok()
    );
}

#[test]
fn test_request_timeout_accounts_for_firestore() {
    let err = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_firestore(emulator())
        .with_timeout(TimeoutConfig {
            enabled: true,
            timeout_seconds: 45,
        })
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("must exceed"), "{err}");
}

#[test]
fn test_disabled_request_timeout_skips_budget_check() {
    let config = ConfigBuilder::new()
        .with_gateway_secret(SECRET)
        .with_store_backend(StoreBackend::Memory)
        .with_timeout(TimeoutConfig {
            enabled: false,
            timeout_seconds: 1,
        })
        .build();
    assert!(config.is_ok());
}
