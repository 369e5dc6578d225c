//! # Scan orchestrator
//! One invocation runs fetch → score → aggregate → dispatch to completion and
//! always returns a `ScanResult`. Only an invalid configuration is rejected,
//! and that happens before any stage starts.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;

use crate::aggregate::{build_report, ReportContext};
use crate::analyze::{score_all, RiskScorer, ScoredBatch};
use crate::config::{ConfigError, Configuration, ConfigurationInput, RuntimeSettings};
use crate::ingest::fetch_all;
use crate::ingest::types::{SourceFailure, SourceFetcher};
use crate::model::{Article, KeywordHits, Report, TriggerMode};
use crate::notify::{dispatch, NotificationResult, Notifier};
use crate::store::ReportSink;

/// Stages of one scan, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanStage {
    Idle,
    Fetching,
    Scoring,
    Aggregating,
    Dispatching,
    Done,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub report: Report,
    pub notifications: NotificationResult,
    /// Articles fetched across all succeeding sources.
    pub article_count: usize,
    pub fetch_failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub max_in_flight: usize,
    /// 0 = one per available CPU.
    pub scoring_workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            scoring_workers: 0,
        }
    }
}

impl From<&RuntimeSettings> for ScanOptions {
    fn from(rt: &RuntimeSettings) -> Self {
        Self {
            max_in_flight: rt.max_in_flight.max(1),
            scoring_workers: rt.scoring_workers,
        }
    }
}

/// Long-lived pipeline wiring. Holds capabilities only; no per-scan state,
/// so one `Scanner` can serve concurrent scans.
#[derive(Clone)]
pub struct Scanner {
    fetcher: Arc<dyn SourceFetcher>,
    scorer: Arc<dyn RiskScorer>,
    email: Arc<dyn Notifier>,
    messaging: Arc<dyn Notifier>,
    sink: Option<Arc<dyn ReportSink>>,
    options: ScanOptions,
}

impl Scanner {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        scorer: Arc<dyn RiskScorer>,
        email: Arc<dyn Notifier>,
        messaging: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            scorer,
            email,
            messaging,
            sink: None,
            options: ScanOptions::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate raw input, then scan. The only failing path of a scan.
    pub async fn scan(
        &self,
        input: ConfigurationInput,
        trigger: TriggerMode,
    ) -> Result<ScanResult, ConfigError> {
        let config = Configuration::try_from(input).map_err(|e| {
            tracing::warn!(target: "scan", error = %e, "scan rejected");
            e
        })?;
        Ok(self.run_scan(&config, trigger).await)
    }

    /// Run one scan. The report is handed to the sink in the background, so
    /// the result never waits on storage.
    pub async fn run_scan(&self, config: &Configuration, trigger: TriggerMode) -> ScanResult {
        let result = self.execute(config, trigger).await;
        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            let snapshot = result.report.clone();
            tokio::spawn(async move { persist(sink.as_ref(), &snapshot).await });
        }
        result
    }

    /// Like `run_scan`, but the report is persisted before returning. For
    /// one-shot callers that exit right after the scan.
    pub async fn run_scan_persisted(
        &self,
        config: &Configuration,
        trigger: TriggerMode,
    ) -> ScanResult {
        let result = self.execute(config, trigger).await;
        if let Some(sink) = &self.sink {
            persist(sink.as_ref(), &result.report).await;
        }
        result
    }

    async fn execute(&self, config: &Configuration, trigger: TriggerMode) -> ScanResult {
        let started = Instant::now();
        let mut stage = ScanStage::Idle;
        counter!("scan_runs_total", "trigger" => trigger.as_str()).increment(1);
        tracing::info!(
            target: "scan",
            industry = config.industry(),
            %trigger,
            sources = config.sources().len(),
            keywords = config.keywords().len(),
            "scan started"
        );

        advance(&mut stage, ScanStage::Fetching);
        let fetched = fetch_all(
            self.fetcher.as_ref(),
            config.sources(),
            self.options.max_in_flight,
        )
        .await;
        let article_count = fetched.articles.len();
        counter!("scan_articles_total").increment(article_count as u64);

        advance(&mut stage, ScanStage::Scoring);
        let batch = self.score(fetched.articles, config).await;
        counter!("scan_insights_total").increment(batch.insights.len() as u64);
        tracing::debug!(
            target: "scan",
            relevant = batch.insights.len(),
            excluded = batch.excluded,
            "scoring done"
        );

        advance(&mut stage, ScanStage::Aggregating);
        let report = build_report(
            batch.insights,
            batch.keyword_hits,
            &ReportContext {
                industry: config.industry(),
                trigger_mode: trigger,
                article_count,
                generated_at: Utc::now(),
            },
        );

        advance(&mut stage, ScanStage::Dispatching);
        let notifications = dispatch(
            &report,
            config,
            trigger,
            self.email.as_ref(),
            self.messaging.as_ref(),
        )
        .await;

        advance(&mut stage, ScanStage::Done);
        let elapsed_ms = started.elapsed().as_millis() as f64;
        histogram!("scan_duration_ms").record(elapsed_ms);
        tracing::info!(
            target: "scan",
            industry = config.industry(),
            %trigger,
            severity = %report.severity,
            articles = article_count,
            insights = report.insights.len(),
            failed_sources = fetched.failures.len(),
            email = ?notifications.email,
            messaging = ?notifications.messaging,
            elapsed_ms,
            "scan finished"
        );

        ScanResult {
            report,
            notifications,
            article_count,
            fetch_failures: fetched.failures,
        }
    }

    /// CPU-bound scoring runs off the async workers.
    async fn score(&self, articles: Vec<Article>, config: &Configuration) -> ScoredBatch {
        let scorer = Arc::clone(&self.scorer);
        let keywords = config.keywords().to_vec();
        let industry = config.industry().to_string();
        let workers = self.options.scoring_workers;

        let joined = tokio::task::spawn_blocking(move || {
            score_all(&articles, keywords.as_slice(), &industry, scorer.as_ref(), workers)
        })
        .await;

        match joined {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(target: "scan", error = %e, "scoring task failed; scoring skipped");
                ScoredBatch {
                    keyword_hits: KeywordHits::zeroed(config.keywords()),
                    ..Default::default()
                }
            }
        }
    }
}

async fn persist(sink: &dyn ReportSink, report: &Report) {
    if let Err(e) = sink.persist(report).await {
        tracing::warn!(target: "scan", error = ?e, "report persist failed");
    }
}

fn advance(stage: &mut ScanStage, next: ScanStage) {
    debug_assert!(next > *stage, "scan stage went backwards: {stage:?} -> {next:?}");
    tracing::debug!(target: "scan", from = ?*stage, to = ?next, "stage");
    *stage = next;
}
