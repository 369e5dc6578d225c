//! Case-insensitive keyword matching over article text.

use crate::model::{Article, KeywordHits};

/// One configured keyword found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    /// The keyword as configured (original casing).
    pub keyword: String,
    /// Byte offset of the first occurrence in the lowercased text.
    pub first_at: usize,
    pub occurrences: u32,
}

/// All keyword matches of one article, in first-match order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMatches {
    pub hits: Vec<KeywordMatch>,
}

impl KeywordMatches {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn distinct(&self) -> usize {
        self.hits.len()
    }

    pub fn total_occurrences(&self) -> u32 {
        self.hits.iter().map(|m| m.occurrences).sum()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|m| m.keyword.as_str())
    }

    /// Add every occurrence to a histogram.
    pub fn record_into(&self, hits: &mut KeywordHits) {
        for m in &self.hits {
            hits.add(&m.keyword, m.occurrences);
        }
    }
}

/// Keywords compiled once per scan; shared read-only across scoring workers.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<(String, String)>, // (as configured, lowercased)
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().trim())
                .filter(|k| !k.is_empty())
                .map(|k| (k.to_string(), k.to_lowercase()))
                .collect(),
        }
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(k, _)| k.as_str())
    }

    /// Substring matching on title + summary.
    pub fn find(&self, article: &Article) -> KeywordMatches {
        self.find_in(&article.text())
    }

    pub fn find_in(&self, text: &str) -> KeywordMatches {
        let lower = text.to_lowercase();
        let mut hits: Vec<KeywordMatch> = self
            .keywords
            .iter()
            .filter_map(|(orig, needle)| {
                let mut it = lower.match_indices(needle.as_str());
                let (first_at, _) = it.next()?;
                Some(KeywordMatch {
                    keyword: orig.clone(),
                    first_at,
                    occurrences: 1 + it.count() as u32,
                })
            })
            .collect();
        hits.sort_by_key(|m| m.first_at);
        KeywordMatches { hits }
    }
}
