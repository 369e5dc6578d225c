// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::panic::AssertUnwindSafe;

use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use metrics::counter;

use crate::ingest::types::{RawArticle, SourceFailure, SourceFetcher};
use crate::model::Article;

/// Normalize text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Host part of a source URL, used when a feed carries no title.
pub fn source_label(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

/// Union of all articles from succeeding sources, plus the skipped ones.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub articles: Vec<Article>,
    pub failures: Vec<SourceFailure>,
}

/// Fetch every source independently, at most `max_in_flight` at a time.
/// A failing or panicking source is logged and skipped; it never aborts the
/// others. Output order follows the configured source order, not completion
/// order.
pub async fn fetch_all(
    fetcher: &dyn SourceFetcher,
    sources: &[String],
    max_in_flight: usize,
) -> FetchOutcome {
    // Boxed so the scan future stays `Send` for `tokio::spawn`.
    let fetches: Vec<BoxFuture<'_, (usize, &String, Result<Vec<RawArticle>>)>> = sources
        .iter()
        .enumerate()
        .map(|(idx, url)| {
            async move {
                let res = match AssertUnwindSafe(fetcher.fetch_source(url))
                    .catch_unwind()
                    .await
                {
                    Ok(res) => res,
                    Err(panic) => Err(anyhow!(
                        "fetcher panicked: {}",
                        crate::panic_text(panic.as_ref())
                    )),
                };
                (idx, url, res)
            }
            .boxed()
        })
        .collect();

    let mut results: Vec<_> = stream::iter(fetches)
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await;
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut out = FetchOutcome::default();
    for (_, url, res) in results {
        match res {
            Ok(raw) => {
                let label = source_label(url);
                let before = out.articles.len();
                out.articles
                    .extend(raw.into_iter().filter_map(|r| r.into_article(&label)));
                tracing::debug!(
                    target: "ingest",
                    source = %url,
                    kept = out.articles.len() - before,
                    "source fetched"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    error = ?e,
                    source = %url,
                    fetcher = fetcher.name(),
                    "source skipped"
                );
                counter!("scan_source_errors_total").increment(1);
                out.failures.push(SourceFailure {
                    source: url.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    out
}
