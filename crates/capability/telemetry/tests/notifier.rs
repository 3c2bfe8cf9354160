use domain::{Notification, NotificationLevel};
use plc_telemetry::{Notifier, metrics, record_sample_emitted};

#[tokio::test]
async fn notifier_broadcasts_to_subscribers() {
    let notifier = Notifier::default();
    let mut first = notifier.subscribe();
    let mut second = notifier.subscribe();

    notifier.notify(Notification::error("Cloud Sync Failed", "backend offline"));

    let got = first.recv().await.expect("first");
    assert_eq!(got.level, NotificationLevel::Error);
    assert_eq!(got.title, "Cloud Sync Failed");
    assert_eq!(second.recv().await.expect("second"), got);
}

#[test]
fn notifier_without_subscribers_does_not_panic() {
    let notifier = Notifier::new(0);
    notifier.notify(Notification::info("Disconnected", "Successfully disconnected from PLC"));
}

#[test]
fn sample_metrics_accumulate() {
    let before = metrics().snapshot();
    record_sample_emitted(1);
    let after = metrics().snapshot();
    assert!(after.samples_emitted >= before.samples_emitted + 1);
    assert!(after.samples_evicted >= before.samples_evicted + 1);
}
