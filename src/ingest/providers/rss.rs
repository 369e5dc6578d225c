// src/ingest/providers/rss.rs
//! RSS 2.0 / Atom feed fetcher over HTTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::{RawArticle, SourceFetcher};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<AtomText>,
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS or Atom document into raw articles.
pub fn parse_feed(xml: &str) -> Result<Vec<RawArticle>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let out = if is_atom(&xml_clean) {
        let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
        let feed_title = feed.title.map(|t| t.value);
        feed.entry
            .into_iter()
            .map(|e| {
                let url = e
                    .link
                    .iter()
                    .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                    .or_else(|| e.link.first())
                    .map(|l| l.href.clone());
                RawArticle {
                    title: e.title.map(|t| t.value),
                    url,
                    source: feed_title.clone(),
                    published_at: e
                        .published
                        .as_deref()
                        .or(e.updated.as_deref())
                        .and_then(parse_rfc3339),
                    summary: e.summary.map(|t| t.value),
                }
            })
            .collect::<Vec<_>>()
    } else {
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
        let feed_title = rss.channel.title;
        rss.channel
            .item
            .into_iter()
            .map(|it| RawArticle {
                title: it.title,
                url: it.link,
                source: feed_title.clone(),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
                summary: it.description,
            })
            .collect::<Vec<_>>()
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_events_total").increment(out.len() as u64);
    Ok(out)
}

fn is_atom(xml: &str) -> bool {
    let head: String = xml.chars().take(512).collect();
    head.contains("<feed")
}

/// Fetches feeds with a shared `reqwest::Client` and a per-request timeout.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for HttpFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFeedFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl SourceFetcher for HttpFeedFetcher {
    async fn fetch_source(&self, url: &str) -> Result<Vec<RawArticle>> {
        let body = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} non-2xx"))?
            .text()
            .await
            .context("feed body")?;
        parse_feed(&body).with_context(|| format!("feed {url}"))
    }

    fn name(&self) -> &'static str {
        "http-feed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2822_dates_parse() {
        let dt = parse_rfc2822("Tue, 14 Oct 2025 08:30:00 +0000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-10-14T08:30:00+00:00");
        assert!(parse_rfc2822("yesterday").is_none());
    }

    #[test]
    fn atom_detection_looks_at_the_head() {
        assert!(is_atom(r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom">"#));
        assert!(!is_atom(r#"<?xml version="1.0"?><rss version="2.0"><channel>"#));
    }
}
