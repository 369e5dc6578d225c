// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod analyze;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod scan;
pub mod scheduler;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::{ConfigError, Configuration, ConfigurationInput, DigestToggles};
pub use crate::model::{Article, Insight, KeywordHits, Report, RiskLevel, Severity, TriggerMode};
pub use crate::notify::{ChannelOutcome, NotificationResult, Notifier, SkipReason};
pub use crate::scan::{ScanOptions, ScanResult, Scanner};

use std::sync::Arc;

use crate::analyze::RuleScorer;
use crate::config::MonitorFile;
use crate::ingest::providers::HttpFeedFetcher;
use crate::notify::{
    Channel, SmtpEmailNotifier, TwilioWhatsAppNotifier, UnconfiguredNotifier,
};
use crate::store::JsonlReportStore;

/// Wire a `Scanner` from a loaded config file and the process environment.
/// A channel whose credentials are missing still exists; its sends fail.
pub fn scanner_from_env(file: &MonitorFile) -> anyhow::Result<Scanner> {
    let scorer = RuleScorer::new(file.scoring.clone())?;

    let email: Arc<dyn Notifier> = match SmtpEmailNotifier::from_env() {
        Ok(n) => Arc::new(n),
        Err(e) => {
            tracing::warn!(error = %e, "email channel disabled");
            Arc::new(UnconfiguredNotifier::new(Channel::Email, e.to_string()))
        }
    };
    let messaging: Arc<dyn Notifier> = match TwilioWhatsAppNotifier::from_env() {
        Ok(n) => Arc::new(n),
        Err(e) => {
            tracing::warn!(error = %e, "messaging channel disabled");
            Arc::new(UnconfiguredNotifier::new(Channel::Messaging, e.to_string()))
        }
    };

    Ok(Scanner::new(
        Arc::new(HttpFeedFetcher::new()),
        Arc::new(scorer),
        email,
        messaging,
    )
    .with_sink(Arc::new(JsonlReportStore::new(
        file.runtime.report_store_path.clone(),
    )))
    .with_options(ScanOptions::from(&file.runtime)))
}

/// Text of a caught panic payload, for logs and failure records.
pub(crate) fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
