//! model.rs: domain types shared by every pipeline stage.
//!
//! Articles are immutable once fetched; an `Insight` owns the article it was
//! derived from, and a `Report` owns its insights. Serialized field names are
//! camelCase so the JSON matches what dashboards and the report store expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Why a scan runs. Gates which notification channels fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    #[default]
    Manual,
    Daily,
    Weekly,
    Realtime,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::Manual => "manual",
            TriggerMode::Daily => "daily",
            TriggerMode::Weekly => "weekly",
            TriggerMode::Realtime => "realtime",
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(TriggerMode::Manual),
            "daily" => Ok(TriggerMode::Daily),
            "weekly" => Ok(TriggerMode::Weekly),
            "realtime" => Ok(TriggerMode::Realtime),
            other => Err(anyhow::anyhow!("unknown trigger mode `{other}`")),
        }
    }
}

/// A fetched news item. `url` is the identity key within one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// Normalized body/summary text, empty when the feed carries none.
    #[serde(default)]
    pub summary: String,
}

impl Article {
    /// Title and summary joined; the text keywords are matched against.
    pub fn text(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{}. {}", self.title, self.summary)
        }
    }
}

/// Per-article risk classification. Declaration order is severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        })
    }
}

/// Report-level aggregate risk. `NoSignificantRisk` is the neutral state of a
/// report without any qualifying insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "No significant risk")]
    NoSignificantRisk,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn is_neutral(&self) -> bool {
        matches!(self, Severity::NoSignificantRisk)
    }
}

impl From<RiskLevel> for Severity {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => Severity::Low,
            RiskLevel::Medium => Severity::Medium,
            RiskLevel::High => Severity::High,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::NoSignificantRisk => "No significant risk",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        })
    }
}

/// Scored, enriched representation of one relevant article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Short stable hash of the article URL.
    pub id: String,
    pub article: Article,
    pub risk_level: RiskLevel,
    pub impact_summary: String,
    #[serde(default)]
    pub key_quotes: Vec<String>,
    /// Distinct matched keywords, in first-match order.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// keyword → number of matches across every fetched article of one scan.
/// Every configured keyword is present, zero when unmatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordHits(BTreeMap<String, u32>);

impl KeywordHits {
    /// Histogram with an explicit zero for each keyword.
    pub fn zeroed<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self(
            keywords
                .iter()
                .map(|k| (k.as_ref().to_string(), 0))
                .collect(),
        )
    }

    pub fn add(&mut self, keyword: &str, n: u32) {
        *self.0.entry(keyword.to_string()).or_insert(0) += n;
    }

    /// Fold a partial histogram into this one.
    pub fn merge(&mut self, other: KeywordHits) {
        for (k, n) in other.0 {
            self.add(&k, n);
        }
    }

    pub fn get(&self, keyword: &str) -> Option<u32> {
        self.0.get(keyword).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, n)| (k.as_str(), *n))
    }

    /// Keywords with at least one hit, highest count first.
    pub fn hottest(&self, n: usize) -> Vec<(&str, u32)> {
        let mut v: Vec<(&str, u32)> = self.iter().filter(|(_, c)| *c > 0).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        v.truncate(n);
        v
    }
}

/// The structured outcome of one scan. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub trigger_mode: TriggerMode,
    /// Also the report identity within a session.
    pub generated_at: DateTime<Utc>,
    pub industry: String,
    pub severity: Severity,
    pub overview: String,
    pub dominant_themes: Vec<String>,
    /// Highest risk first; newest first within a level.
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
    pub keyword_hits: KeywordHits,
}

/// Short hex id derived from a URL (first 6 bytes of its SHA-256).
pub fn insight_id(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
