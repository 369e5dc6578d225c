mod common;

use chrono::Utc;
use common::{Behavior, RecordingNotifier};
use industry_risk_monitor::notify::dispatch;
use industry_risk_monitor::{
    ChannelOutcome, Configuration, DigestToggles, KeywordHits, Report, Severity, SkipReason,
    TriggerMode,
};

fn config(toggles: DigestToggles) -> Configuration {
    Configuration::new("Automobile", vec!["https://autos.test/rss"], vec!["tariff"])
        .unwrap()
        .with_emails(vec!["risk@example.com"])
        .unwrap()
        .with_messaging_recipients(vec!["+15550001111"])
        .unwrap()
        .with_toggles(toggles)
}

fn report(trigger: TriggerMode) -> Report {
    Report {
        trigger_mode: trigger,
        generated_at: Utc::now(),
        industry: "Automobile".into(),
        severity: Severity::Low,
        overview: "Automobile: low risk".into(),
        dominant_themes: vec!["tariff".into()],
        insights: vec![],
        recommendations: vec!["Maintain baseline monitoring cadence.".into()],
        keyword_hits: KeywordHits::zeroed(&["tariff"]),
    }
}

#[tokio::test]
async fn email_failure_does_not_affect_messaging() {
    let email = RecordingNotifier::new(Behavior::Fail);
    let messaging = RecordingNotifier::new(Behavior::Succeed);
    let cfg = config(DigestToggles::default());

    let out = dispatch(
        &report(TriggerMode::Realtime),
        &cfg,
        TriggerMode::Realtime,
        email.as_ref(),
        messaging.as_ref(),
    )
    .await;

    match &out.email {
        ChannelOutcome::Failed { error } => assert!(error.contains("550")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(out.messaging, ChannelOutcome::Sent);
    assert_eq!(email.call_count(), 1);
    assert_eq!(messaging.call_count(), 1);
}

#[tokio::test]
async fn messaging_failure_does_not_affect_email() {
    let email = RecordingNotifier::new(Behavior::Succeed);
    let messaging = RecordingNotifier::new(Behavior::Fail);
    let cfg = config(DigestToggles::default());

    let out = dispatch(
        &report(TriggerMode::Manual),
        &cfg,
        TriggerMode::Manual,
        email.as_ref(),
        messaging.as_ref(),
    )
    .await;

    assert_eq!(out.email, ChannelOutcome::Sent);
    assert!(out.messaging.is_failed());
}

#[tokio::test]
async fn panicking_channel_is_captured_as_failure() {
    let email = RecordingNotifier::new(Behavior::Panic);
    let messaging = RecordingNotifier::new(Behavior::Succeed);
    let cfg = config(DigestToggles::default());

    let out = dispatch(
        &report(TriggerMode::Realtime),
        &cfg,
        TriggerMode::Realtime,
        email.as_ref(),
        messaging.as_ref(),
    )
    .await;

    match &out.email {
        ChannelOutcome::Failed { error } => assert!(error.contains("transport exploded")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(out.messaging, ChannelOutcome::Sent);
}

#[tokio::test]
async fn daily_digest_off_skips_without_attempting() {
    let email = RecordingNotifier::new(Behavior::Succeed);
    let messaging = RecordingNotifier::new(Behavior::Succeed);
    let cfg = config(DigestToggles {
        daily: false,
        ..Default::default()
    });

    let out = dispatch(
        &report(TriggerMode::Daily),
        &cfg,
        TriggerMode::Daily,
        email.as_ref(),
        messaging.as_ref(),
    )
    .await;

    let disabled = ChannelOutcome::Skipped {
        reason: SkipReason::DisabledForTrigger,
    };
    assert_eq!(out.email, disabled);
    assert_eq!(out.messaging, disabled);
    assert_eq!(email.call_count(), 0);
    assert_eq!(messaging.call_count(), 0);
}

#[tokio::test]
async fn weekly_digest_goes_out_by_email_only() {
    let email = RecordingNotifier::new(Behavior::Succeed);
    let messaging = RecordingNotifier::new(Behavior::Succeed);
    let cfg = config(DigestToggles::default());

    let out = dispatch(
        &report(TriggerMode::Weekly),
        &cfg,
        TriggerMode::Weekly,
        email.as_ref(),
        messaging.as_ref(),
    )
    .await;

    assert!(out.email.is_sent());
    assert!(out.messaging.is_skipped());
    assert_eq!(messaging.call_count(), 0);
}
