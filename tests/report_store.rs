use chrono::{Duration, TimeZone, Utc};
use industry_risk_monitor::store::{JsonlReportStore, ReportSink};
use industry_risk_monitor::{KeywordHits, Report, Severity, TriggerMode};

fn report(hour: u32, severity: Severity) -> Report {
    Report {
        trigger_mode: TriggerMode::Realtime,
        generated_at: Utc.with_ymd_and_hms(2025, 10, 15, hour, 0, 0).unwrap(),
        industry: "Automobile".into(),
        severity,
        overview: format!("run at {hour}"),
        dominant_themes: vec![],
        insights: vec![],
        recommendations: vec!["Maintain baseline monitoring cadence.".into()],
        keyword_hits: KeywordHits::zeroed(&["tariff"]),
    }
}

#[tokio::test]
async fn load_recent_returns_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlReportStore::new(dir.path().join("state/reports.jsonl"));

    for (h, sev) in [(6, Severity::Low), (9, Severity::High), (7, Severity::Medium)] {
        store.persist(&report(h, sev)).await.unwrap();
    }

    let recent = store.load_recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].severity, Severity::High);
    assert_eq!(recent[1].severity, Severity::Medium);
    assert!(recent[0].generated_at - recent[1].generated_at == Duration::hours(2));
}

#[tokio::test]
async fn stored_report_round_trips_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlReportStore::new(dir.path().join("reports.jsonl"));
    let original = report(8, Severity::NoSignificantRisk);
    store.persist(&original).await.unwrap();

    let back = store.load_recent(10).await.unwrap();
    assert_eq!(back, vec![original]);
}

#[tokio::test]
async fn unreadable_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.jsonl");
    let store = JsonlReportStore::new(&path);
    store.persist(&report(6, Severity::Low)).await.unwrap();
    tokio::fs::write(
        &path,
        format!(
            "{}{{not json}}\n\n",
            tokio::fs::read_to_string(&path).await.unwrap()
        ),
    )
    .await
    .unwrap();

    let recent = store.load_recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn missing_file_is_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlReportStore::new(dir.path().join("nope.jsonl"));
    assert!(store.load_recent(10).await.unwrap().is_empty());
}
