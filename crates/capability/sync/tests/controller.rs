use chrono::Utc;
use domain::{
    DeviceConfiguration, NotificationLevel, RegisterValue, Sample, SyncPolicy, SyncProvider,
    SyncStatus, Transport,
};
use plc_sync::{
    BackendRegistry, CloudSyncController, InMemorySyncBackend, SyncDispatch,
    SyncError, SyncTimings, data_path,
};
use plc_telemetry::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn config(sync: Option<SyncPolicy>) -> DeviceConfiguration {
    DeviceConfiguration {
        id: "1".to_string(),
        name: "Factory Floor PLC".to_string(),
        transport: Transport::Tcp {
            host: "192.168.1.10".to_string(),
            port: 502,
        },
        unit_id: 1,
        register_address: 0x6304,
        register_count: 1,
        description: None,
        cloud_sync: sync,
    }
}

fn firebase_policy() -> Option<SyncPolicy> {
    Some(SyncPolicy {
        enabled: true,
        interval: 5,
        provider: SyncProvider::Firebase,
    })
}

fn sample() -> Sample {
    Sample::new(Utc::now(), vec![RegisterValue::Bool(true)])
}

fn controller(backend: Arc<InMemorySyncBackend>, notifier: Notifier) -> CloudSyncController {
    let registry = BackendRegistry::new().with(SyncProvider::Firebase, backend);
    CloudSyncController::new(registry, notifier, SyncTimings::default())
}

#[tokio::test(start_paused = true)]
async fn synced_reverts_to_idle_after_one_second() {
    let backend = Arc::new(InMemorySyncBackend::new());
    let controller = controller(backend.clone(), Notifier::default());
    let mut status = controller.subscribe_status();
    let started = Instant::now();

    let dispatch = controller.sync_sample(&config(firebase_policy()), &sample());
    assert_eq!(dispatch, SyncDispatch::Started);
    assert_eq!(*status.borrow_and_update(), SyncStatus::Syncing);

    status.changed().await.expect("synced");
    assert_eq!(*status.borrow_and_update(), SyncStatus::Synced);
    assert_eq!(started.elapsed(), Duration::from_millis(1000));

    status.changed().await.expect("idle");
    assert_eq!(*status.borrow_and_update(), SyncStatus::Idle);
    assert_eq!(started.elapsed(), Duration::from_millis(2000));

    let stored = backend.snapshot(&data_path("1"));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["values"], serde_json::json!([true]));
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_reverts_after_three_seconds() {
    let backend = Arc::new(InMemorySyncBackend::new());
    backend.set_fail_writes(true);
    let notifier = Notifier::default();
    let mut notifications = notifier.subscribe();
    let controller = controller(backend, notifier);
    let mut status = controller.subscribe_status();
    let started = Instant::now();

    controller.sync_sample(&config(firebase_policy()), &sample());

    status.changed().await.expect("failed");
    assert_eq!(*status.borrow_and_update(), SyncStatus::Failed);
    assert_eq!(started.elapsed(), Duration::from_millis(1000));

    let notification = notifications.recv().await.expect("notification");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.title, "Cloud Sync Failed");
    assert!(notification.description.contains("Will retry automatically"));

    status.changed().await.expect("idle");
    assert_eq!(*status.borrow_and_update(), SyncStatus::Idle);
    assert_eq!(started.elapsed(), Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn unconfigured_backend_fails_without_delivery() {
    let backend = Arc::new(InMemorySyncBackend::unconfigured());
    let notifier = Notifier::default();
    let mut notifications = notifier.subscribe();
    let controller = controller(backend.clone(), notifier);
    let mut status = controller.subscribe_status();
    let started = Instant::now();

    let dispatch = controller.sync_sample(&config(firebase_policy()), &sample());
    assert_eq!(dispatch, SyncDispatch::Unavailable);
    assert_eq!(*status.borrow_and_update(), SyncStatus::Failed);

    let notification = notifications.try_recv().expect("notification");
    assert_eq!(
        notification.description,
        "Firebase is not properly configured. Please update your credentials."
    );

    status.changed().await.expect("idle");
    assert_eq!(*status.borrow_and_update(), SyncStatus::Idle);
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
    assert!(backend.snapshot(&data_path("1")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_provider_backend_is_unavailable() {
    let controller = CloudSyncController::new(
        BackendRegistry::new(),
        Notifier::default(),
        SyncTimings::default(),
    );
    let policy = Some(SyncPolicy {
        enabled: true,
        interval: 5,
        provider: SyncProvider::Azure,
    });
    assert_eq!(
        controller.sync_sample(&config(policy), &sample()),
        SyncDispatch::Unavailable
    );
    assert_eq!(controller.status(), SyncStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn disabled_policy_is_a_no_op() {
    let backend = Arc::new(InMemorySyncBackend::new());
    let controller = controller(backend.clone(), Notifier::default());
    let disabled = Some(SyncPolicy {
        enabled: false,
        interval: 5,
        provider: SyncProvider::Firebase,
    });

    for _ in 0..5 {
        assert_eq!(
            controller.sync_sample(&config(disabled.clone()), &sample()),
            SyncDispatch::Disabled
        );
        assert_eq!(controller.sync_sample(&config(None), &sample()), SyncDispatch::Disabled);
    }
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(controller.status(), SyncStatus::Idle);
    assert!(backend.snapshot(&data_path("1")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn newer_transition_supersedes_pending_revert() {
    let backend = Arc::new(InMemorySyncBackend::new());
    let timings = SyncTimings {
        network_delay: Duration::from_millis(1000),
        synced_hold: Duration::from_millis(1000),
        failed_hold: Duration::from_millis(3000),
    };
    let registry = BackendRegistry::new().with(SyncProvider::Firebase, backend);
    let controller = CloudSyncController::new(registry, Notifier::default(), timings);

    controller.sync_sample(&config(firebase_policy()), &sample());
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(controller.status(), SyncStatus::Synced);

    // 第二次尝试在第一次的回落定时器到期前开始
    controller.sync_sample(&config(firebase_policy()), &sample());
    assert_eq!(controller.status(), SyncStatus::Syncing);
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(controller.status(), SyncStatus::Syncing);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(controller.status(), SyncStatus::Synced);
}

#[tokio::test(start_paused = true)]
async fn save_configuration_writes_whole_record() {
    let backend = Arc::new(InMemorySyncBackend::new());
    let controller = controller(backend.clone(), Notifier::default());

    controller
        .save_configuration(&config(firebase_policy()))
        .await
        .expect("saved");

    let stored = backend.node("plc-configurations/1");
    assert_eq!(stored["name"], "Factory Floor PLC");
    assert_eq!(stored["ipAddress"], "192.168.1.10");
    assert_eq!(stored["cloudSync"]["provider"], "firebase");
}

#[tokio::test(start_paused = true)]
async fn test_connection_reports_through_notifications() {
    let notifier = Notifier::default();
    let mut notifications = notifier.subscribe();
    let controller = controller(Arc::new(InMemorySyncBackend::new()), notifier);

    controller
        .test_connection(SyncProvider::Firebase)
        .await
        .expect("reachable");
    assert_eq!(
        notifications.try_recv().expect("testing").title,
        "Testing Cloud Connection"
    );
    assert_eq!(
        notifications.try_recv().expect("result").title,
        "Connection Successful"
    );

    let err = controller
        .test_connection(SyncProvider::Aws)
        .await
        .expect_err("no aws backend");
    assert!(matches!(err, SyncError::Unavailable(_)));
    notifications.try_recv().expect("testing");
    assert_eq!(
        notifications.try_recv().expect("result").title,
        "Connection Test Failed"
    );
}

#[tokio::test(start_paused = true)]
async fn subscribe_sees_pushed_samples() {
    let backend = Arc::new(InMemorySyncBackend::new());
    let controller = controller(backend, Notifier::default());
    let mut subscription = controller
        .subscribe(SyncProvider::Firebase, "1")
        .await
        .expect("subscribe");
    assert!(subscription.current().is_empty());

    controller.sync_sample(&config(firebase_policy()), &sample());
    let values = subscription.changed().await.expect("changed");
    assert_eq!(values.len(), 1);
    subscription.unsubscribe();
}
