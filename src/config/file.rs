// src/config/file.rs
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigError, Configuration, ScoringPolicy};

pub const ENV_CONFIG_PATH: &str = "RISK_MONITOR_CONFIG";
pub const DEFAULT_TOML_PATH: &str = "config/monitor.toml";
pub const DEFAULT_JSON_PATH: &str = "config/monitor.json";

fn default_max_in_flight() -> usize {
    4
}
fn default_realtime_interval() -> u64 {
    15 * 60
}
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("state/reports.jsonl")
}

/// Process-level knobs that are not part of a scan's Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// 0 = one worker per available CPU.
    #[serde(default)]
    pub scoring_workers: usize,
    #[serde(default = "default_realtime_interval")]
    pub realtime_interval_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_store_path")]
    pub report_store_path: PathBuf,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            scoring_workers: 0,
            realtime_interval_secs: default_realtime_interval(),
            bind_addr: default_bind_addr(),
            report_store_path: default_store_path(),
        }
    }
}

/// Everything a config file may carry.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorFile {
    pub monitor: Configuration,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

/// Load from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<MonitorFile, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("reading {}: {e}", path.display())))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse(&content, ext.as_str())
}

/// Load using env var + fallbacks:
/// 1) $RISK_MONITOR_CONFIG
/// 2) config/monitor.toml
/// 3) config/monitor.json
pub fn load_default() -> Result<MonitorFile, ConfigError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(ConfigError::Load(format!(
            "{ENV_CONFIG_PATH} points to non-existent path {}",
            pb.display()
        )));
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_from(&json_p);
    }
    Err(ConfigError::Load(format!(
        "no config found ({DEFAULT_TOML_PATH} or {DEFAULT_JSON_PATH})"
    )))
}

/// Parse file content; the extension decides the format, JSON is the fallback.
pub fn parse(s: &str, hint_ext: &str) -> Result<MonitorFile, ConfigError> {
    let mut file: MonitorFile = if hint_ext == "toml" {
        toml::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?
    } else {
        serde_json::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?
    };
    file.scoring = file.scoring.sanitized();
    if file.runtime.max_in_flight == 0 {
        file.runtime.max_in_flight = 1;
    }
    Ok(file)
}
