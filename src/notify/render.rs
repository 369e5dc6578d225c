//! Plain-text renderings of a report for each channel.

use crate::model::Report;

/// Twilio rejects WhatsApp bodies above this many characters.
pub const MESSAGE_MAX_CHARS: usize = 1600;

/// How many insights a channel lists before summarizing the rest.
const EMAIL_TOP_INSIGHTS: usize = 10;
const MESSAGE_TOP_INSIGHTS: usize = 3;

pub fn email_subject(report: &Report) -> String {
    format!(
        "[{}] {} risk report ({})",
        report.severity, report.industry, report.trigger_mode
    )
}

pub fn email_body(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} risk report, generated {}\n\n",
        report.industry,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(&format!("Severity: {}\n", report.severity));
    out.push_str(&format!("{}\n\n", report.overview));

    if !report.dominant_themes.is_empty() {
        out.push_str(&format!("Themes: {}\n\n", report.dominant_themes.join(", ")));
    }

    if report.insights.is_empty() {
        out.push_str("No qualifying articles this run.\n\n");
    } else {
        out.push_str("Top insights:\n");
        for (i, ins) in report.insights.iter().take(EMAIL_TOP_INSIGHTS).enumerate() {
            out.push_str(&format!(
                "{}. [{}] {} ({})\n   {}\n   {}\n",
                i + 1,
                ins.risk_level,
                ins.article.title,
                ins.article.source,
                ins.impact_summary,
                ins.article.url
            ));
            for q in &ins.key_quotes {
                out.push_str(&format!("   > {q}\n"));
            }
        }
        let rest = report.insights.len().saturating_sub(EMAIL_TOP_INSIGHTS);
        if rest > 0 {
            out.push_str(&format!("   ... and {rest} more\n"));
        }
        out.push('\n');
    }

    out.push_str("Recommendations:\n");
    for r in &report.recommendations {
        out.push_str(&format!("- {r}\n"));
    }

    let hot = report.keyword_hits.hottest(5);
    if !hot.is_empty() {
        let parts: Vec<String> = hot.iter().map(|(k, n)| format!("{k} ({n})")).collect();
        out.push_str(&format!("\nKeyword hits: {}\n", parts.join(", ")));
    }
    out
}

/// Condensed message for chat channels, never longer than `max_chars`.
pub fn short_message(report: &Report, max_chars: usize) -> String {
    let mut lines = vec![
        format!("*{} risk: {}*", report.industry, report.severity),
        report.overview.clone(),
    ];
    for ins in report.insights.iter().take(MESSAGE_TOP_INSIGHTS) {
        lines.push(format!("- [{}] {} {}", ins.risk_level, ins.article.title, ins.article.url));
    }
    if let Some(r) = report.recommendations.first() {
        lines.push(format!("Next: {r}"));
    }
    truncate_chars(&lines.join("\n"), max_chars)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
