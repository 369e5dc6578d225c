//! Risk scoring: the pluggable `RiskScorer` contract and the rule-based default.
//!
//! A scorer turns one article (plus its keyword matches and the industry) into
//! an `Insight`, or `None` when the article is not relevant. The rule scorer
//! combines keyword count/diversity, an industry mention and severity cues into
//! a score, then maps it onto a level with `ScoringPolicy` thresholds.

use anyhow::{Context, Result};
use regex::Regex;

use crate::analyze::keywords::KeywordMatches;
use crate::config::ScoringPolicy;
use crate::model::{insight_id, Article, Insight, RiskLevel};

/// Input handed to a scorer for one article.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest<'a> {
    pub article: &'a Article,
    pub matches: &'a KeywordMatches,
    pub industry: &'a str,
}

/// Article → Insight | not relevant. Implementations must be stateless
/// across calls; workers share one instance.
pub trait RiskScorer: Send + Sync {
    fn score(&self, req: &ScoreRequest<'_>) -> Option<Insight>;
    fn name(&self) -> &'static str;
}

/// Components behind a rule score, kept for explainability.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSignals {
    pub distinct: usize,
    pub extra_occurrences: u32,
    pub industry_mentioned: bool,
    /// Names of cue groups present, in policy order.
    pub cues: Vec<String>,
    pub score: f32,
}

#[derive(Debug)]
struct CompiledCue {
    name: String,
    weight: f32,
    re: Regex,
}

#[derive(Debug)]
pub struct RuleScorer {
    policy: ScoringPolicy,
    cues: Vec<CompiledCue>,
}

impl RuleScorer {
    pub fn new(policy: ScoringPolicy) -> Result<Self> {
        let cues = policy
            .cue_groups
            .iter()
            .filter(|g| !g.terms.is_empty())
            .map(|g| {
                let alts: Vec<String> = g.terms.iter().map(|t| regex::escape(t.trim())).collect();
                let pattern = format!(r"(?i)\b(?:{})(?:s|es|d|ed|ing)?\b", alts.join("|"));
                let re = Regex::new(&pattern)
                    .with_context(|| format!("cue group `{}` regex", g.name))?;
                Ok(CompiledCue {
                    name: g.name.clone(),
                    weight: g.weight,
                    re,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { policy, cues })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn signals(&self, text: &str, matches: &KeywordMatches, industry: &str) -> RiskSignals {
        let p = &self.policy;
        let lower = text.to_lowercase();

        let distinct = matches.distinct();
        let extra_occurrences = matches.total_occurrences().saturating_sub(distinct as u32);
        let industry_mentioned = industry_terms(industry, p.industry_stem_len)
            .iter()
            .any(|t| lower.contains(t.as_str()));
        let present: Vec<&CompiledCue> = self.cues.iter().filter(|c| c.re.is_match(text)).collect();

        let mut score = p.keyword_weight * distinct as f32;
        score += (p.repeat_weight * extra_occurrences as f32).min(p.repeat_cap);
        if industry_mentioned {
            score += p.industry_weight;
        }
        score += present.iter().map(|c| c.weight).sum::<f32>();

        RiskSignals {
            distinct,
            extra_occurrences,
            industry_mentioned,
            cues: present.iter().map(|c| c.name.clone()).collect(),
            score,
        }
    }
}

impl RiskScorer for RuleScorer {
    fn score(&self, req: &ScoreRequest<'_>) -> Option<Insight> {
        if req.matches.is_empty() {
            return None;
        }
        let text = req.article.text();
        let signals = self.signals(&text, req.matches, req.industry);
        let level = level_for(signals.score, &self.policy);
        let categories: Vec<String> = req.matches.keywords().map(str::to_string).collect();
        let kw_refs: Vec<&str> = req.matches.keywords().collect();

        Some(Insight {
            id: insight_id(&req.article.url),
            article: req.article.clone(),
            risk_level: level,
            impact_summary: impact_summary(level, req.industry, &categories, &signals),
            key_quotes: extract_quotes(
                &text,
                &kw_refs,
                self.policy.max_quotes,
                self.policy.max_quote_chars,
            ),
            categories,
        })
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

/// Map a score onto a level. Reaching a level requires exceeding its
/// threshold; a score sitting exactly on a boundary takes the lower level.
pub fn level_for(score: f32, policy: &ScoringPolicy) -> RiskLevel {
    if score > policy.high_threshold {
        RiskLevel::High
    } else if score > policy.medium_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Lowercased terms that count as an industry mention: the full name plus a
/// leading stem of each word with at least four chars.
pub fn industry_terms(industry: &str, stem_len: usize) -> Vec<String> {
    let lower = industry.trim().to_lowercase();
    if lower.is_empty() {
        return Vec::new();
    }
    let mut terms = vec![lower.clone()];
    if stem_len > 0 {
        for w in lower.split(|c: char| !c.is_alphanumeric()) {
            if w.chars().count() >= 4 {
                let stem: String = w.chars().take(stem_len).collect();
                if !terms.contains(&stem) {
                    terms.push(stem);
                }
            }
        }
    }
    terms
}

fn impact_summary(
    level: RiskLevel,
    industry: &str,
    categories: &[String],
    signals: &RiskSignals,
) -> String {
    let mut s = format!("{level} risk for {industry}: {} mentioned", categories.join(", "));
    if signals.extra_occurrences > 0 {
        let total = signals.distinct as u32 + signals.extra_occurrences;
        s.push_str(&format!(" ({total} mentions)"));
    }
    if !signals.cues.is_empty() {
        s.push_str(&format!(" with {} signals", signals.cues.join(", ")));
    }
    if !signals.industry_mentioned {
        s.push_str("; industry not named directly");
    }
    s.push('.');
    s
}

/// Sentences (or windows of long sentences) that contain a matched keyword.
/// Never returns anything when `keywords` is empty.
pub fn extract_quotes(text: &str, keywords: &[&str], max_quotes: usize, max_chars: usize) -> Vec<String> {
    static RE_SENTENCE: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
    let re = RE_SENTENCE.get_or_init(|| Regex::new(r"[^.!?\n]+[.!?]*").unwrap());

    let needles: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    let mut out: Vec<String> = Vec::new();
    if needles.is_empty() || max_quotes == 0 {
        return out;
    }

    for m in re.find_iter(text) {
        let sentence = m.as_str().trim();
        if sentence.is_empty() {
            continue;
        }
        let lower = sentence.to_lowercase();
        let first = needles.iter().filter_map(|n| lower.find(n.as_str())).min();
        let Some(pos) = first else { continue };
        let quote = snippet(sentence, &lower, pos, max_chars);
        if !out.contains(&quote) {
            out.push(quote);
        }
        if out.len() >= max_quotes {
            break;
        }
    }
    out
}

fn snippet(sentence: &str, lower: &str, pos: usize, max_chars: usize) -> String {
    let n = sentence.chars().count();
    if n <= max_chars {
        return sentence.to_string();
    }
    let at = lower[..pos].chars().count().min(n);
    let mut start = at.saturating_sub(max_chars / 3);
    let end = (start + max_chars).min(n);
    start = end.saturating_sub(max_chars);

    let mut s: String = sentence.chars().skip(start).take(end - start).collect();
    s = s.trim().to_string();
    if start > 0 {
        s.insert(0, '…');
    }
    if end < n {
        s.push('…');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::keywords::KeywordMatcher;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, summary: &str) -> Article {
        Article {
            title: title.into(),
            url: "https://a.test/1".into(),
            source: "a.test".into(),
            published_at: Utc.with_ymd_and_hms(2025, 10, 14, 8, 0, 0).unwrap(),
            summary: summary.into(),
        }
    }

    fn score(keywords: &[&str], industry: &str, a: &Article) -> Option<Insight> {
        let scorer = RuleScorer::new(ScoringPolicy::default()).unwrap();
        let matches = KeywordMatcher::new(keywords).find(a);
        scorer.score(&ScoreRequest {
            article: a,
            matches: &matches,
            industry,
        })
    }

    #[test]
    fn unmatched_article_is_not_relevant() {
        let a = article("Quarterly sales steady", "");
        assert!(score(&["tariff"], "Automobile", &a).is_none());
    }

    #[test]
    fn tariff_on_automakers_is_medium() {
        let a = article("New tariff hits automakers", "");
        let ins = score(&["tariff"], "Automobile", &a).unwrap();
        assert_eq!(ins.risk_level, RiskLevel::Medium);
        assert_eq!(ins.categories, vec!["tariff"]);
        assert_eq!(ins.key_quotes, vec!["New tariff hits automakers"]);
        assert!(ins.impact_summary.contains("regulation"));
    }

    #[test]
    fn many_keywords_with_safety_cue_is_high() {
        let a = article(
            "Automobile recall widens as battery fire probe expands",
            "Regulators open an investigation; supply shortage feared.",
        );
        let ins = score(&["recall", "battery", "shortage"], "Automobile", &a).unwrap();
        assert_eq!(ins.risk_level, RiskLevel::High);
        assert_eq!(ins.categories, vec!["recall", "battery", "shortage"]);
    }

    #[test]
    fn single_bare_keyword_is_low() {
        let a = article("Battery chemistry research update", "");
        let ins = score(&["battery"], "Automobile", &a).unwrap();
        assert_eq!(ins.risk_level, RiskLevel::Low);
    }

    #[test]
    fn boundary_score_takes_lower_level() {
        let p = ScoringPolicy::default();
        assert_eq!(level_for(p.medium_threshold, &p), RiskLevel::Low);
        assert_eq!(level_for(p.high_threshold, &p), RiskLevel::Medium);
        assert_eq!(level_for(p.high_threshold + 0.01, &p), RiskLevel::High);
    }

    #[test]
    fn cue_terms_match_whole_words_only() {
        let scorer = RuleScorer::new(ScoringPolicy::default()).unwrap();
        let m = KeywordMatcher::new(&["bank"]).find_in("Bank results");
        let s = scorer.signals("Bank results", &m, "Finance");
        assert!(s.cues.is_empty(), "`ban` must not match `bank`: {:?}", s.cues);
        let s2 = scorer.signals("Regulators banned exports", &m, "Finance");
        assert_eq!(s2.cues, vec!["regulation"]);
    }

    #[test]
    fn industry_terms_include_stems() {
        assert_eq!(industry_terms("Automobile", 5), vec!["automobile", "autom"]);
        assert_eq!(
            industry_terms("Oil & Gas", 5),
            vec!["oil & gas".to_string()]
        );
    }

    #[test]
    fn quotes_are_capped_and_never_fabricated() {
        let text = "Tariff one. Tariff two! Tariff three? Tariff four. Nothing here.";
        let q = extract_quotes(text, &["tariff"], 3, 200);
        assert_eq!(q, vec!["Tariff one.", "Tariff two!", "Tariff three?"]);
        assert!(extract_quotes(text, &[], 3, 200).is_empty());
        assert!(extract_quotes("No match at all.", &["tariff"], 3, 200).is_empty());
    }

    #[test]
    fn long_sentences_are_windowed_around_the_match() {
        let long = format!("{} tariff {}", "x".repeat(300), "y".repeat(300));
        let q = extract_quotes(&long, &["tariff"], 1, 60);
        assert_eq!(q.len(), 1);
        assert!(q[0].contains("tariff"));
        assert!(q[0].starts_with('…') && q[0].ends_with('…'));
        assert!(q[0].chars().count() <= 62);
    }
}
