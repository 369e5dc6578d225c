//! Report history as a JSON-lines file: one `Report` per line, appended.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

use crate::model::Report;

/// Default number of reports returned by `load_recent`.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Where finished reports go. Persisting is best-effort from the scan's
/// point of view; errors are logged by the caller, never surfaced.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    async fn persist(&self, report: &Report) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonlReportStore {
    path: PathBuf,
}

impl JsonlReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest reports first. A missing file is an empty history; lines that
    /// do not parse are skipped with a warning.
    pub async fn load_recent(&self, limit: usize) -> Result<Vec<Report>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };

        let mut reports: Vec<Report> = content
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .filter_map(|(i, l)| match serde_json::from_str::<Report>(l) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(target: "store", line = i + 1, error = %e, "skipping unreadable report");
                    None
                }
            })
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        reports.truncate(limit);
        Ok(reports)
    }
}

#[async_trait::async_trait]
impl ReportSink for JsonlReportStore {
    async fn persist(&self, report: &Report) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut line = serde_json::to_string(report).context("serialize report")?;
        line.push('\n');

        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        f.write_all(line.as_bytes()).await.context("append report")?;
        f.flush().await.context("flush report")?;
        Ok(())
    }
}
