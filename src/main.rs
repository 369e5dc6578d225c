//! Industry Risk Monitor: binary entrypoint
//!
//! `industry-risk-monitor`                 run schedules + serve /health and /metrics
//! `industry-risk-monitor scan [trigger]`  run one scan, print the ScanResult as JSON
//! `industry-risk-monitor history [n]`     print the n newest stored reports

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use industry_risk_monitor::config::load_default;
use industry_risk_monitor::metrics::Metrics;
use industry_risk_monitor::scheduler::{spawn_schedules, ScheduleCfg};
use industry_risk_monitor::store::{JsonlReportStore, DEFAULT_RECENT_LIMIT};
use industry_risk_monitor::{scanner_from_env, TriggerMode};

/// Compact logs by default; RISK_MONITOR_LOG_JSON=1 switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("industry_risk_monitor=info,scan=info,ingest=info,notify=info,warn"));

    let json = std::env::var("RISK_MONITOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let file = load_default().context("loading monitor config")?;
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("scan") => {
            let trigger: TriggerMode = match args.next() {
                Some(t) => t.parse()?,
                None => TriggerMode::default(),
            };
            let scanner = scanner_from_env(&file)?;
            // the process exits right after, so the report must be on disk first
            let result = scanner.run_scan_persisted(&file.monitor, trigger).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some("history") => {
            let limit = match args.next() {
                Some(n) => n.parse().context("history limit must be a number")?,
                None => DEFAULT_RECENT_LIMIT,
            };
            let store = JsonlReportStore::new(file.runtime.report_store_path.clone());
            let reports = store.load_recent(limit).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            Ok(())
        }
        Some(other) => anyhow::bail!("unknown command `{other}` (expected scan|history)"),
        None => serve(file).await,
    }
}

async fn serve(file: industry_risk_monitor::config::MonitorFile) -> Result<()> {
    let metrics = Metrics::init()?;
    let scanner = Arc::new(scanner_from_env(&file)?);

    let _schedules = spawn_schedules(
        scanner,
        file.monitor.clone(),
        ScheduleCfg::with_realtime_secs(file.runtime.realtime_interval_secs),
    );

    let listener = tokio::net::TcpListener::bind(&file.runtime.bind_addr)
        .await
        .with_context(|| format!("binding {}", file.runtime.bind_addr))?;
    tracing::info!(addr = %file.runtime.bind_addr, industry = file.monitor.industry(), "monitor up");
    axum::serve(listener, metrics.router()).await?;
    Ok(())
}
