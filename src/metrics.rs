use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tower_http::trace::TraceLayer;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe every
    /// series the monitor emits. Later calls reuse the installed recorder.
    pub fn init() -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                // Default buckets avoid API differences across exporter versions.
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")?;
                describe_all();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// `/metrics` in Prometheus exposition format plus a `/health` liveness route.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/metrics",
                get(move || {
                    let h = handle.clone();
                    async move { h.render() }
                }),
            )
            .layer(TraceLayer::new_for_http())
    }
}

fn describe_all() {
    describe_counter!("scan_runs_total", "Scans started, by trigger mode");
    describe_counter!("scan_source_errors_total", "Sources skipped because fetching failed");
    describe_counter!("scan_articles_total", "Articles fetched across all sources");
    describe_counter!("scan_insights_total", "Articles judged relevant by the scorer");
    describe_histogram!("scan_duration_ms", Unit::Milliseconds, "Wall time of one scan");
    describe_gauge!("scan_last_run_ts", Unit::Seconds, "Unix time of the last scheduled scan");
    describe_counter!("notify_sent_total", "Reports delivered, by channel");
    describe_counter!("notify_failed_total", "Report deliveries that failed, by channel");
    describe_counter!("notify_skipped_total", "Channels skipped (disabled or no recipients)");
    describe_histogram!("ingest_parse_ms", Unit::Milliseconds, "Feed parse time");
    describe_counter!("ingest_events_total", "Feed items parsed");
}
