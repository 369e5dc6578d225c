// tests/common/mod.rs
// Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use industry_risk_monitor::analyze::{RiskScorer, RuleScorer, ScoreRequest};
use industry_risk_monitor::config::ScoringPolicy;
use industry_risk_monitor::ingest::types::{RawArticle, SourceFetcher};
use industry_risk_monitor::{Insight, Notifier, Report, ScanOptions, Scanner};

pub fn raw(title: &str, url: &str, day: u32) -> RawArticle {
    RawArticle {
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        source: Some("Test Wire".to_string()),
        published_at: Some(Utc.with_ymd_and_hms(2025, 10, day, 8, 0, 0).unwrap()),
        summary: None,
    }
}

/// Serves canned items per source URL; unknown URLs fail.
#[derive(Default)]
pub struct FakeFetcher {
    feeds: HashMap<String, Vec<RawArticle>>,
    panics: HashSet<String>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, items: Vec<RawArticle>) -> Self {
        self.feeds.insert(url.to_string(), items);
        self
    }

    /// Fetching `url` panics instead of returning.
    pub fn panicking(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }
}

#[async_trait::async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch_source(&self, url: &str) -> Result<Vec<RawArticle>> {
        if self.panics.contains(url) {
            panic!("feed parser blew up: {url}");
        }
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {url}"))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Records every call; outcome chosen up front.
pub struct RecordingNotifier {
    behavior: Behavior,
    pub calls: Mutex<Vec<(Vec<String>, Report)>>,
}

impl RecordingNotifier {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()> {
        self.calls.lock().push((recipients.to_vec(), report.clone()));
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(anyhow!("smtp 550 mailbox unavailable")),
            Behavior::Panic => panic!("transport exploded"),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Rule scorer that panics on any article whose title contains `trigger`.
pub struct BrittleScorer {
    inner: RuleScorer,
    trigger: &'static str,
}

impl BrittleScorer {
    pub fn new(trigger: &'static str) -> Self {
        Self {
            inner: RuleScorer::new(ScoringPolicy::default()).unwrap(),
            trigger,
        }
    }
}

impl RiskScorer for BrittleScorer {
    fn score(&self, req: &ScoreRequest<'_>) -> Option<Insight> {
        if req.article.title.contains(self.trigger) {
            panic!("unexpected article shape");
        }
        self.inner.score(req)
    }

    fn name(&self) -> &'static str {
        "brittle"
    }
}

pub fn scanner(
    fetcher: FakeFetcher,
    email: Arc<RecordingNotifier>,
    messaging: Arc<RecordingNotifier>,
) -> Scanner {
    scanner_with_scorer(
        fetcher,
        Arc::new(RuleScorer::new(ScoringPolicy::default()).unwrap()),
        email,
        messaging,
    )
}

pub fn scanner_with_scorer(
    fetcher: FakeFetcher,
    scorer: Arc<dyn RiskScorer>,
    email: Arc<RecordingNotifier>,
    messaging: Arc<RecordingNotifier>,
) -> Scanner {
    Scanner::new(Arc::new(fetcher), scorer, email, messaging).with_options(ScanOptions {
        max_in_flight: 2,
        scoring_workers: 2,
    })
}
