use plc_sync::{InMemorySyncBackend, SyncBackend, SyncError};
use serde_json::json;

#[tokio::test]
async fn push_preserves_write_order() {
    let backend = InMemorySyncBackend::new();
    let first = backend.push("plc-data/1", json!({"n": 1})).await.expect("push");
    let second = backend.push("plc-data/1", json!({"n": 2})).await.expect("push");
    assert!(first < second);

    let values = backend.read("plc-data/1").await.expect("read");
    assert_eq!(values, vec![json!({"n": 1}), json!({"n": 2})]);
    assert!(backend.read("plc-data/2").await.expect("read").is_empty());
}

#[tokio::test]
async fn set_replaces_whole_value() {
    let backend = InMemorySyncBackend::new();
    backend
        .set("plc-configurations/1", json!({"name": "old"}))
        .await
        .expect("set");
    backend
        .set("plc-configurations/1", json!({"name": "new"}))
        .await
        .expect("set");
    assert_eq!(backend.node("plc-configurations/1"), json!({"name": "new"}));
    assert_eq!(backend.snapshot("plc-configurations/1"), vec![json!("new")]);
}

#[tokio::test]
async fn subscription_receives_full_value_set() {
    let backend = InMemorySyncBackend::new();
    backend.push("plc-data/1", json!(1)).await.expect("push");

    let mut subscription = backend.subscribe("plc-data/1").await.expect("subscribe");
    assert_eq!(subscription.current(), vec![json!(1)]);

    backend.push("plc-data/1", json!(2)).await.expect("push");
    let values = subscription.changed().await.expect("changed");
    assert_eq!(values, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn unconfigured_backend_rejects_io() {
    let backend = InMemorySyncBackend::unconfigured();
    assert!(!backend.is_configured());
    let err = backend.push("plc-data/1", json!(1)).await.expect_err("rejected");
    assert!(matches!(err, SyncError::Unavailable(_)));

    let subscription = backend.subscribe("plc-data/1").await.expect("subscribe");
    assert!(subscription.current().is_empty());

    backend.set_configured(true);
    backend.set_fail_writes(true);
    let err = backend.set("plc-configurations/1", json!({})).await.expect_err("rejected");
    assert!(matches!(err, SyncError::Delivery(_)));
}
