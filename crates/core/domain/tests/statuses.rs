use domain::{ConnectionStatus, Notification, NotificationLevel, SyncProvider, SyncStatus};

#[test]
fn statuses_default_to_idle_and_disconnected() {
    assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    assert_eq!(SyncStatus::default(), SyncStatus::Idle);
}

#[test]
fn statuses_serialize_lowercase() {
    assert_eq!(
        serde_json::to_string(&SyncStatus::Synced).expect("json"),
        "\"synced\""
    );
    assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
    assert_eq!(SyncProvider::Firebase.to_string(), "firebase");
}

#[test]
fn notification_builders_set_level() {
    let info = Notification::info("Connected to PLC", "ok");
    let error = Notification::error("Connection Failed", "nope");
    assert_eq!(info.level, NotificationLevel::Info);
    assert_eq!(error.level, NotificationLevel::Error);
    assert_eq!(error.title, "Connection Failed");
}
