// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::normalize_text;
use crate::model::Article;

/// One item as a source returned it, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>, // feed/channel title, e.g. "Reuters Autos"
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl RawArticle {
    /// Normalize into an `Article`. Items without a link or title are dropped.
    pub fn into_article(self, fallback_source: &str) -> Option<Article> {
        let url = self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
        let title = normalize_text(self.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            return None;
        }
        let source = self
            .source
            .map(|s| normalize_text(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_source.to_string());
        Some(Article {
            title,
            url,
            source,
            published_at: self.published_at.unwrap_or_default(),
            summary: normalize_text(self.summary.as_deref().unwrap_or_default()),
        })
    }
}

/// A source that yields raw articles for one configured endpoint.
/// Timeouts are the implementation's business and surface as `Err`.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_source(&self, url: &str) -> Result<Vec<RawArticle>>;
    fn name(&self) -> &'static str;
}

/// A source that was skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}
