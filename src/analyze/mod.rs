// src/analyze/mod.rs
//! Scoring stage entry: keyword matching + risk scoring over a batch of articles.

pub mod keywords;
pub mod scoring;

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};

use crate::model::{Article, Insight, KeywordHits};

// Re-export convenient types.
pub use crate::analyze::keywords::{KeywordMatch, KeywordMatcher, KeywordMatches};
pub use crate::analyze::scoring::{level_for, RiskScorer, RiskSignals, RuleScorer, ScoreRequest};

/// Output of the scoring stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredBatch {
    /// Relevant articles, in input order.
    pub insights: Vec<Insight>,
    /// Every configured keyword, counted over all articles (retained or not).
    pub keyword_hits: KeywordHits,
    /// Articles the scorer declared not relevant, or panicked on.
    pub excluded: usize,
}

/// Score all articles. Work is split into contiguous chunks, one per worker;
/// each worker fills its own partial histogram and the partials are merged
/// once after all workers join, so no counter is shared between threads.
///
/// `workers == 0` means one per available CPU.
pub fn score_all<S: AsRef<str>>(
    articles: &[Article],
    keywords: &[S],
    industry: &str,
    scorer: &dyn RiskScorer,
    workers: usize,
) -> ScoredBatch {
    let matcher = KeywordMatcher::new(keywords);
    let mut out = ScoredBatch {
        insights: Vec::new(),
        keyword_hits: KeywordHits::zeroed(keywords),
        excluded: 0,
    };
    if articles.is_empty() {
        return out;
    }

    let workers = if workers == 0 {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    } else {
        workers
    };
    let chunk = articles.len().div_ceil(workers.min(articles.len()));

    let partials: Vec<ScoredBatch> = std::thread::scope(|scope| {
        let handles: Vec<_> = articles
            .chunks(chunk)
            .map(|part| {
                let matcher = &matcher;
                scope.spawn(move || score_chunk(part, matcher, industry, scorer))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    for p in partials {
        out.insights.extend(p.insights);
        out.keyword_hits.merge(p.keyword_hits);
        out.excluded += p.excluded;
    }
    out
}

fn score_chunk(
    articles: &[Article],
    matcher: &KeywordMatcher,
    industry: &str,
    scorer: &dyn RiskScorer,
) -> ScoredBatch {
    let mut part = ScoredBatch::default();
    for article in articles {
        let matches = matcher.find(article);
        matches.record_into(&mut part.keyword_hits);
        let req = ScoreRequest {
            article,
            matches: &matches,
            industry,
        };
        // Keyword hits are already recorded, so a panicking scorer only
        // costs this one article.
        match panic::catch_unwind(AssertUnwindSafe(|| scorer.score(&req))) {
            Ok(Some(insight)) => part.insights.push(insight),
            Ok(None) => part.excluded += 1,
            Err(payload) => {
                tracing::warn!(
                    target: "scan",
                    scorer = scorer.name(),
                    url = %article.url,
                    error = %crate::panic_text(payload.as_ref()),
                    "scorer panicked; article excluded"
                );
                part.excluded += 1;
            }
        }
    }
    part
}
