// tests/config_loading.rs
use std::io::Write;

use industry_risk_monitor::config::{file::ENV_CONFIG_PATH, load_default, load_from};
use industry_risk_monitor::ConfigError;
use serial_test::serial;

const TOML: &str = r#"
[monitor]
industry = "Automobile"
sources = ["https://autos.test/rss"]
keywords = ["tariff", "recall"]
messaging_recipients = ["+15550001111"]
enable_daily_digest = false

[scoring]
high_threshold = 5.0

[runtime]
max_in_flight = 8
realtime_interval_secs = 300
"#;

fn write_tmp(ext: &str, content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(&format!(".{ext}"))
        .tempfile()
        .unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

#[test]
#[serial]
fn env_path_takes_precedence() {
    let f = write_tmp("toml", TOML);
    std::env::set_var(ENV_CONFIG_PATH, f.path());
    let loaded = load_default();
    std::env::remove_var(ENV_CONFIG_PATH);

    let file = loaded.expect("config loads");
    assert_eq!(file.monitor.industry(), "Automobile");
    assert_eq!(file.monitor.keywords(), ["tariff", "recall"]);
    assert!(!file.monitor.toggles().daily);
    assert_eq!(file.scoring.high_threshold, 5.0);
    assert_eq!(file.runtime.max_in_flight, 8);
    assert_eq!(file.runtime.realtime_interval_secs, 300);
}

#[test]
#[serial]
fn env_path_to_missing_file_is_a_load_error() {
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let loaded = load_default();
    std::env::remove_var(ENV_CONFIG_PATH);
    assert!(matches!(loaded, Err(ConfigError::Load(_))));
}

#[test]
fn json_file_with_dashboard_names_loads() {
    let json = r#"{
        "monitor": {
            "industry": "Energy",
            "sources": ["https://grid.test/atom"],
            "keywords": ["outage"],
            "emails": ["Ops@Example.com"],
            "enableWeeklyDigest": false
        }
    }"#;
    let f = write_tmp("json", json);
    let file = load_from(f.path()).unwrap();
    assert_eq!(file.monitor.emails(), ["ops@example.com"]);
    assert!(!file.monitor.toggles().weekly);
    assert_eq!(file.runtime.max_in_flight, 4);
}
