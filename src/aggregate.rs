//! # Aggregator
//! Pure reduction of scored insights into one `Report`. No I/O, no clock:
//! the generation timestamp comes in through `ReportContext`, so the same
//! insights always yield the same severity, themes and recommendations.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{Insight, KeywordHits, Report, Severity, TriggerMode};

/// How many categories make it into `dominant_themes`.
pub const DOMINANT_THEME_COUNT: usize = 5;

/// Scan facts the report needs besides the insights themselves.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub industry: &'a str,
    pub trigger_mode: TriggerMode,
    pub article_count: usize,
    pub generated_at: DateTime<Utc>,
}

pub fn build_report(insights: Vec<Insight>, keyword_hits: KeywordHits, ctx: &ReportContext<'_>) -> Report {
    let mut insights = dedup_by_url(insights);
    rank(&mut insights);

    let severity = severity_of(&insights);
    let dominant_themes = dominant_themes(&insights, DOMINANT_THEME_COUNT);
    let recommendations = recommendations(severity, &dominant_themes, ctx.industry);
    let overview = overview(ctx.industry, severity, ctx.article_count, insights.len(), &dominant_themes);

    Report {
        trigger_mode: ctx.trigger_mode,
        generated_at: ctx.generated_at,
        industry: ctx.industry.to_string(),
        severity,
        overview,
        dominant_themes,
        insights,
        recommendations,
        keyword_hits,
    }
}

/// Keep one insight per article URL: the higher risk level wins, then the
/// newer article, then the lexicographically smaller title. Input order
/// does not affect which one survives.
pub fn dedup_by_url(insights: Vec<Insight>) -> Vec<Insight> {
    let mut best: HashMap<String, Insight> = HashMap::with_capacity(insights.len());
    let mut order: Vec<String> = Vec::new();
    for ins in insights {
        match best.get_mut(&ins.article.url) {
            Some(kept) => {
                if preference(&ins, kept) == Ordering::Greater {
                    *kept = ins;
                }
            }
            None => {
                order.push(ins.article.url.clone());
                best.insert(ins.article.url.clone(), ins);
            }
        }
    }
    order.into_iter().filter_map(|url| best.remove(&url)).collect()
}

fn preference(a: &Insight, b: &Insight) -> Ordering {
    a.risk_level
        .cmp(&b.risk_level)
        .then_with(|| a.article.published_at.cmp(&b.article.published_at))
        .then_with(|| b.article.title.cmp(&a.article.title))
        .then_with(|| b.impact_summary.cmp(&a.impact_summary))
}

/// High → Medium → Low; newest first within a level; URL as final tiebreak.
pub fn rank(insights: &mut [Insight]) {
    insights.sort_by(|a, b| {
        b.risk_level
            .cmp(&a.risk_level)
            .then_with(|| b.article.published_at.cmp(&a.article.published_at))
            .then_with(|| a.article.url.cmp(&b.article.url))
    });
}

pub fn severity_of(insights: &[Insight]) -> Severity {
    insights
        .iter()
        .map(|i| i.risk_level)
        .max()
        .map(Severity::from)
        .unwrap_or(Severity::NoSignificantRisk)
}

/// Top-`n` categories by number of insights carrying them, ties alphabetical.
pub fn dominant_themes(insights: &[Insight], n: usize) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for ins in insights {
        for c in &ins.categories {
            *freq.entry(c.as_str()).or_insert(0) += 1;
        }
    }
    let mut v: Vec<(&str, usize)> = freq.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    v.into_iter().take(n).map(|(c, _)| c.to_string()).collect()
}

/// Template-based next moves. Always at least one entry.
pub fn recommendations(severity: Severity, themes: &[String], industry: &str) -> Vec<String> {
    let mut out = Vec::new();
    let top = themes.first();
    match severity {
        Severity::High => {
            out.push(format!(
                "Escalate monitoring cadence to real-time alerts for {industry}."
            ));
            if let Some(t) = top {
                out.push(format!(
                    "Convene a risk review of {t} exposure within 24 hours."
                ));
            }
            for t in themes.iter().skip(1).take(2) {
                out.push(format!("Prepare contingency plans for {t} developments."));
            }
        }
        Severity::Medium => {
            out.push(format!(
                "Increase monitoring cadence to daily digests for {industry}."
            ));
            for t in themes.iter().take(2) {
                out.push(format!("Brief stakeholders on emerging {t} signals."));
            }
        }
        Severity::Low => {
            out.push("Maintain baseline monitoring cadence.".to_string());
            if let Some(t) = top {
                out.push(format!("Track {t} coverage for signs of escalation."));
            }
        }
        Severity::NoSignificantRisk => {
            out.push(format!(
                "Maintain baseline monitoring cadence for {industry}."
            ));
            out.push(
                "Review sources and keywords: none produced qualifying signals this run."
                    .to_string(),
            );
        }
    }
    out
}

pub fn overview(
    industry: &str,
    severity: Severity,
    article_count: usize,
    insight_count: usize,
    themes: &[String],
) -> String {
    let theme = themes
        .first()
        .map(|t| format!("top theme: {t}"))
        .unwrap_or_else(|| "no dominant theme".to_string());
    let posture = match severity {
        Severity::NoSignificantRisk => "no significant risk".to_string(),
        s => format!("{} risk", s.to_string().to_lowercase()),
    };
    format!(
        "{industry}: {posture} across {article_count} scanned articles; \
         {insight_count} relevant signal(s), {theme}."
    )
}
