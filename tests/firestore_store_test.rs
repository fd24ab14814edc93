use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yoco_subscriptions::gateway::{Payment, PaymentStatus};
use yoco_subscriptions::subscriptions::{
    FirestoreConfig, FirestoreSubscriptionStore, NewSubscription, StoreError, StoreOperation,
    SubscriptionStatus, SubscriptionStore, SubscriptionUpdate,
};

const DOCUMENTS: &str = "/v1/projects/demo/databases/(default)/documents";

fn store(server: &MockServer) -> FirestoreSubscriptionStore {
    let config = FirestoreConfig {
        project_id: Some("demo".to_string()),
        emulator_host: Some("localhost:8080".to_string()),
        api_url: Some(format!("{}/v1", server.uri())),
        ..FirestoreConfig::default()
    };
    FirestoreSubscriptionStore::new(&config).unwrap()
}

fn stored_document(id: &str, plan: &str, status: &str, created: &str) -> Value {
    json!({
        "name": format!("projects/demo/databases/(default)/documents/subscriptions/{id}"),
        "fields": {
            "userId": {"stringValue": "u1"},
            "planId": {"stringValue": plan},
            "status": {"stringValue": status},
            "startDate": {"timestampValue": "2024-03-01T12:00:00Z"},
            "endDate": {"timestampValue": "2024-03-31T12:00:00Z"},
            "paymentId": {"stringValue": "ch_1"},
            "amount": {"doubleValue": 49.99},
            "currency": {"stringValue": "ZAR"},
            "createdAt": {"timestampValue": created},
            "updatedAt": {"timestampValue": created}
        },
        "createTime": created,
        "updateTime": created
    })
}

fn new_subscription() -> NewSubscription {
    let payment = Payment {
        id: "ch_1".to_string(),
        amount: 49.99,
        currency: "ZAR".to_string(),
        status: PaymentStatus::Successful,
        metadata: None,
    };
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    NewSubscription::for_payment(&payment, "u1", "premium", now)
}

#[tokio::test]
async fn test_create_commits_then_reads_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:commit")))
        .and(header("authorization", "Bearer owner"))
        .and(body_partial_json(json!({
            "writes": [{
                "update": {
                    "fields": {
                        "userId": {"stringValue": "u1"},
                        "planId": {"stringValue": "premium"},
                        "status": {"stringValue": "active"},
                        "amount": {"doubleValue": 49.99}
                    }
                },
                "currentDocument": {"exists": false}
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}],
            "commitTime": "2024-03-01T12:00:00.100Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/projects/demo/databases/\(default\)/documents/subscriptions/[0-9a-f]{32}$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_document(
            "sub_1",
            "premium",
            "active",
            "2024-03-01T12:00:00.100Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let created = store(&server).create(new_subscription()).await.unwrap();

    assert_eq!(created.id, "sub_1");
    assert_eq!(created.status, SubscriptionStatus::Active);
    assert_eq!(created.amount, 49.99);
    assert!(created.created_at.is_some());
    assert_eq!(
        created.end_date - created.start_date,
        chrono::Duration::days(30)
    );
}

#[tokio::test]
async fn test_active_lookup_runs_filtered_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "subscriptions"}],
                "where": {"compositeFilter": {"op": "AND"}},
                "orderBy": [{"field": {"fieldPath": "createdAt"}, "direction": "DESCENDING"}],
                "limit": 1
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": stored_document("sub_2", "pro", "active", "2024-03-02T00:00:00Z"),
             "readTime": "2024-03-02T00:00:01Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let found = store(&server).get_active_for_user("u1").await.unwrap().unwrap();
    assert_eq!(found.id, "sub_2");
    assert_eq!(found.plan_id, "pro");
}

#[tokio::test]
async fn test_empty_query_result_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"readTime": "2024-03-02T00:00:01Z"}])),
        )
        .mount(&server)
        .await;

    assert!(store(&server).get_active_for_user("u2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_history_keeps_query_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "where": {"fieldFilter": {"field": {"fieldPath": "userId"}, "op": "EQUAL"}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": stored_document("sub_3", "pro", "active", "2024-03-03T00:00:00Z")},
            {"document": stored_document("sub_2", "premium", "cancelled", "2024-03-02T00:00:00Z")}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let history = store(&server).list_for_user("u1").await.unwrap();
    let ids: Vec<&str> = history.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["sub_3", "sub_2"]);
    assert_eq!(history[1].status, SubscriptionStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_of_missing_document() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:commit")))
        .and(body_partial_json(json!({
            "writes": [{
                "updateMask": {"fieldPaths": ["status"]},
                "currentDocument": {"exists": true}
            }]
        })))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "No document to update", "status": "NOT_FOUND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server).cancel("sub_gone").await.unwrap_err();
    assert_eq!(err.operation(), StoreOperation::Cancel);
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_backend_error_carries_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Missing or insufficient permissions."}
        })))
        .mount(&server)
        .await;

    let err = store(&server).list_for_user("u1").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to list subscriptions");
    assert!(err.detail().contains("Missing or insufficient permissions."));
}

#[tokio::test]
async fn test_empty_update_is_rejected_without_a_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = store(&server)
        .update("sub_1", SubscriptionUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidUpdate { .. }));
}
