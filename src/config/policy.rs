//! Rule-scorer policy: weights, thresholds and severity cues.
//!
//! TOML shape (every field optional, see `Default`):
//! ```toml
//! [scoring]
//! keyword_weight = 1.0
//! medium_threshold = 2.0
//! high_threshold = 4.0
//!
//! [[scoring.cue_groups]]
//! name = "regulation"
//! weight = 1.5
//! terms = ["tariff", "sanction"]
//! ```
//!
//! Score = keyword_weight * distinct matches
//!       + repeat_weight * extra occurrences (capped at repeat_cap)
//!       + industry_weight if the industry is mentioned
//!       + weight of each cue group with at least one term present.
//! A level is reached only when the score is strictly above its threshold.
//! Cue terms match whole words, allowing the suffixes s/es/d/ed/ing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueGroup {
    pub name: String,
    pub weight: f32,
    pub terms: Vec<String>,
}

impl CueGroup {
    fn new(name: &str, weight: f32, terms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub keyword_weight: f32,
    pub repeat_weight: f32,
    pub repeat_cap: f32,
    pub industry_weight: f32,
    /// Industry words of 4+ chars also match on this many leading chars
    /// ("Automobile" → "autom" matches "automakers").
    pub industry_stem_len: usize,
    pub medium_threshold: f32,
    pub high_threshold: f32,
    pub max_quotes: usize,
    pub max_quote_chars: usize,
    pub cue_groups: Vec<CueGroup>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            keyword_weight: 1.0,
            repeat_weight: 0.25,
            repeat_cap: 1.0,
            industry_weight: 1.0,
            industry_stem_len: 5,
            medium_threshold: 2.0,
            high_threshold: 4.0,
            max_quotes: 3,
            max_quote_chars: 200,
            cue_groups: vec![
                CueGroup::new(
                    "disruption",
                    1.5,
                    &[
                        "disruption", "shortage", "outage", "shutdown", "strike", "halt",
                        "delay", "bankrupt", "bankruptcy", "layoff", "closure", "blockade",
                    ],
                ),
                CueGroup::new(
                    "regulation",
                    1.5,
                    &[
                        "tariff", "regulation", "regulator", "sanction", "ban", "banned",
                        "lawsuit", "penalty", "penalties", "probe", "investigation",
                        "antitrust", "embargo",
                    ],
                ),
                CueGroup::new(
                    "safety",
                    2.0,
                    &[
                        "recall", "safety", "explosion", "fire", "injury", "injuries",
                        "injured", "fatal", "fatality", "fatalities", "death", "hazard",
                        "contamination", "leak",
                    ],
                ),
                CueGroup::new(
                    "financial",
                    1.0,
                    &["loss", "downgrade", "default", "plunge", "slump", "writedown"],
                ),
            ],
        }
    }
}

impl ScoringPolicy {
    /// Clamp nonsensical values back to something usable.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if !self.medium_threshold.is_finite() || self.medium_threshold < 0.0 {
            self.medium_threshold = d.medium_threshold;
        }
        if !self.high_threshold.is_finite() || self.high_threshold < self.medium_threshold {
            self.high_threshold = self.medium_threshold.max(d.high_threshold);
        }
        if self.max_quote_chars < 20 {
            self.max_quote_chars = d.max_quote_chars;
        }
        self.cue_groups.retain(|g| !g.terms.is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let p: ScoringPolicy = toml::from_str("high_threshold = 5.5\nmax_quotes = 1").unwrap();
        assert_eq!(p.high_threshold, 5.5);
        assert_eq!(p.max_quotes, 1);
        assert_eq!(p.medium_threshold, 2.0);
        assert_eq!(p.cue_groups.len(), 4);
    }

    #[test]
    fn sanitize_fixes_inverted_thresholds() {
        let p = ScoringPolicy {
            medium_threshold: 3.0,
            high_threshold: 1.0,
            ..Default::default()
        }
        .sanitized();
        assert!(p.high_threshold >= p.medium_threshold);
    }
}
