//! Scan configuration: a validated, immutable value passed into every scan.
//!
//! Raw input (`ConfigurationInput`, from a file or a request body) becomes a
//! `Configuration` only through `Configuration::try_from`, which trims and
//! deduplicates every list and rejects anything a scan cannot run with.

pub mod file;
pub mod policy;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

pub use file::{load_default, load_from, MonitorFile, RuntimeSettings};
pub use policy::{CueGroup, ScoringPolicy};

/// Rejections raised before any scan stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("industry must not be empty")]
    EmptyIndustry,

    #[error("at least one source is required")]
    NoSources,

    #[error("at least one keyword is required")]
    NoKeywords,

    #[error("invalid source url: {0}")]
    InvalidSource(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Reading or parsing a configuration file failed.
    #[error("configuration load failed: {0}")]
    Load(String),
}

fn yes() -> bool {
    true
}

/// Which digests / alerts are switched on. All on unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestToggles {
    pub realtime: bool,
    pub daily: bool,
    pub weekly: bool,
}

impl Default for DigestToggles {
    fn default() -> Self {
        Self {
            realtime: true,
            daily: true,
            weekly: true,
        }
    }
}

/// Unvalidated configuration as it arrives from a file or API body.
/// Accepts both snake_case and the camelCase names used by the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationInput {
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default, alias = "messagingRecipients", alias = "whatsappNumbers")]
    pub messaging_recipients: Vec<String>,
    #[serde(default = "yes", alias = "enableRealtimeAlerts")]
    pub enable_realtime_alerts: bool,
    #[serde(default = "yes", alias = "enableDailyDigest")]
    pub enable_daily_digest: bool,
    #[serde(default = "yes", alias = "enableWeeklyDigest")]
    pub enable_weekly_digest: bool,
}

/// Validated scan configuration. Fields are private so the invariants
/// (non-empty industry/sources/keywords, deduplicated lists) always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigurationInput", into = "ConfigurationInput")]
pub struct Configuration {
    industry: String,
    sources: Vec<String>,
    keywords: Vec<String>,
    emails: Vec<String>,
    messaging_recipients: Vec<String>,
    toggles: DigestToggles,
}

impl Configuration {
    pub fn new<A, B>(industry: &str, sources: A, keywords: B) -> Result<Self, ConfigError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self::try_from(ConfigurationInput {
            industry: industry.to_string(),
            sources: sources.into_iter().map(Into::into).collect(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..ConfigurationInput::with_defaults()
        })
    }

    /// Builder-style: replace email recipients (re-validated).
    pub fn with_emails<I, S>(self, emails: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut input = self.into_input();
        input.emails = emails.into_iter().map(Into::into).collect();
        Self::try_from(input)
    }

    /// Builder-style: replace messaging recipients.
    pub fn with_messaging_recipients<I, S>(self, recipients: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut input = self.into_input();
        input.messaging_recipients = recipients.into_iter().map(Into::into).collect();
        Self::try_from(input)
    }

    pub fn with_toggles(mut self, toggles: DigestToggles) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn messaging_recipients(&self) -> &[String] {
        &self.messaging_recipients
    }

    pub fn toggles(&self) -> DigestToggles {
        self.toggles
    }

    pub fn into_input(self) -> ConfigurationInput {
        ConfigurationInput {
            industry: self.industry,
            sources: self.sources,
            keywords: self.keywords,
            emails: self.emails,
            messaging_recipients: self.messaging_recipients,
            enable_realtime_alerts: self.toggles.realtime,
            enable_daily_digest: self.toggles.daily,
            enable_weekly_digest: self.toggles.weekly,
        }
    }
}

impl ConfigurationInput {
    /// Empty input with every toggle on, matching serde defaults.
    pub fn with_defaults() -> Self {
        Self {
            enable_realtime_alerts: true,
            enable_daily_digest: true,
            enable_weekly_digest: true,
            ..Default::default()
        }
    }
}

impl From<Configuration> for ConfigurationInput {
    fn from(cfg: Configuration) -> Self {
        cfg.into_input()
    }
}

impl TryFrom<ConfigurationInput> for Configuration {
    type Error = ConfigError;

    fn try_from(input: ConfigurationInput) -> Result<Self, Self::Error> {
        let industry = input.industry.trim().to_string();
        if industry.is_empty() {
            return Err(ConfigError::EmptyIndustry);
        }

        let sources = clean_list(input.sources, false);
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for s in &sources {
            validate_source(s)?;
        }

        let keywords = clean_list(input.keywords, true);
        if keywords.is_empty() {
            return Err(ConfigError::NoKeywords);
        }

        let emails: Vec<String> = clean_list(input.emails, true)
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect();
        for e in &emails {
            lettre::Address::from_str(e).map_err(|_| ConfigError::InvalidEmail(e.clone()))?;
        }

        Ok(Self {
            industry,
            sources,
            keywords,
            emails,
            messaging_recipients: clean_list(input.messaging_recipients, false),
            toggles: DigestToggles {
                realtime: input.enable_realtime_alerts,
                daily: input.enable_daily_digest,
                weekly: input.enable_weekly_digest,
            },
        })
    }
}

fn validate_source(s: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(s) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(()),
        _ => Err(ConfigError::InvalidSource(s.to_string())),
    }
}

/// Trim, drop blanks, dedup keeping first occurrence (optionally ignoring case).
fn clean_list(items: Vec<String>, fold_case: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() {
            continue;
        }
        let key = if fold_case {
            t.to_lowercase()
        } else {
            t.to_string()
        };
        if seen.insert(key) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_sources_and_keywords() {
        let no_src = Configuration::new("Automobile", Vec::<String>::new(), vec!["tariff"]);
        assert_eq!(no_src.unwrap_err(), ConfigError::NoSources);

        let no_kw = Configuration::new("Automobile", vec!["https://a.test"], vec!["  "]);
        assert_eq!(no_kw.unwrap_err(), ConfigError::NoKeywords);

        let no_ind = Configuration::new(" ", vec!["https://a.test"], vec!["tariff"]);
        assert_eq!(no_ind.unwrap_err(), ConfigError::EmptyIndustry);
    }

    #[test]
    fn rejects_non_http_sources() {
        let err = Configuration::new("Energy", vec!["ftp://feeds.test"], vec!["grid"]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidSource("ftp://feeds.test".into()));
    }

    #[test]
    fn dedups_lists_and_folds_email_case() {
        let cfg = Configuration::new(
            " Automobile ",
            vec!["https://a.test", "https://a.test", " https://b.test "],
            vec!["Tariff", "tariff", "recall"],
        )
        .unwrap()
        .with_emails(vec!["Ops@Example.com", "ops@example.com", ""])
        .unwrap();

        assert_eq!(cfg.industry(), "Automobile");
        assert_eq!(cfg.sources(), ["https://a.test", "https://b.test"]);
        assert_eq!(cfg.keywords(), ["Tariff", "recall"]);
        assert_eq!(cfg.emails(), ["ops@example.com"]);
    }

    #[test]
    fn bad_email_is_rejected() {
        let cfg = Configuration::new("Energy", vec!["https://a.test"], vec!["grid"]).unwrap();
        let err = cfg.with_emails(vec!["not-an-address"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEmail(_)));
    }

    #[test]
    fn deserializes_dashboard_shape() {
        let json = r#"{
            "industry": "Automobile",
            "sources": ["https://a.test/rss"],
            "keywords": ["tariff"],
            "whatsappNumbers": ["+15550001111"],
            "enableDailyDigest": false
        }"#;
        let cfg: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.messaging_recipients(), ["+15550001111"]);
        assert!(!cfg.toggles().daily);
        assert!(cfg.toggles().weekly && cfg.toggles().realtime);
    }
}
