// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::Configuration;
use crate::model::TriggerMode;
use crate::scan::Scanner;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleCfg {
    pub realtime_every: Duration,
    pub daily_every: Duration,
    pub weekly_every: Duration,
}

impl ScheduleCfg {
    pub fn with_realtime_secs(secs: u64) -> Self {
        Self {
            realtime_every: Duration::from_secs(secs.max(1)),
            ..Default::default()
        }
    }
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            realtime_every: Duration::from_secs(15 * 60),
            daily_every: DAY,
            weekly_every: WEEK,
        }
    }
}

/// Trigger modes that get a periodic task, with their period. A mode whose
/// toggle is off gets none.
pub fn planned(config: &Configuration, cfg: ScheduleCfg) -> Vec<(TriggerMode, Duration)> {
    let t = config.toggles();
    [
        (TriggerMode::Realtime, t.realtime, cfg.realtime_every),
        (TriggerMode::Daily, t.daily, cfg.daily_every),
        (TriggerMode::Weekly, t.weekly, cfg.weekly_every),
    ]
    .into_iter()
    .filter(|(_, on, _)| *on)
    .map(|(mode, _, every)| (mode, every))
    .collect()
}

/// Spawn one periodic scan task per enabled trigger mode. The first run of
/// each happens one full period after spawning.
pub fn spawn_schedules(
    scanner: Arc<Scanner>,
    config: Configuration,
    cfg: ScheduleCfg,
) -> Vec<JoinHandle<()>> {
    let config = Arc::new(config);
    planned(&config, cfg)
        .into_iter()
        .map(|(mode, every)| {
            let scanner = Arc::clone(&scanner);
            let config = Arc::clone(&config);
            tracing::info!(target: "scan", trigger = %mode, every_secs = every.as_secs(), "schedule armed");
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + every, every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let res = scanner.run_scan(&config, mode).await;
                    gauge!("scan_last_run_ts", "trigger" => mode.as_str())
                        .set(res.report.generated_at.timestamp() as f64);
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DigestToggles;

    #[test]
    fn disabled_toggles_are_not_scheduled() {
        let cfg = Configuration::new("Energy", vec!["https://a.test/rss"], vec!["grid"])
            .unwrap()
            .with_toggles(DigestToggles {
                realtime: false,
                daily: true,
                weekly: false,
            });
        let plan = planned(&cfg, ScheduleCfg::default());
        assert_eq!(plan, vec![(TriggerMode::Daily, DAY)]);
    }

    #[test]
    fn realtime_period_is_configurable() {
        let cfg = Configuration::new("Energy", vec!["https://a.test/rss"], vec!["grid"]).unwrap();
        let plan = planned(&cfg, ScheduleCfg::with_realtime_secs(60));
        assert_eq!(plan[0], (TriggerMode::Realtime, Duration::from_secs(60)));
        assert_eq!(plan.len(), 3);
    }
}
