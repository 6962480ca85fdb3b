use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::HealthConfig;
use crate::snapshot::Snapshot;
use crate::state::SharedState;

/// Silence threshold for one data source.
#[derive(Clone, Debug)]
pub struct SourceHealth {
    pub name: &'static str,
    pub silence_threshold: Duration,
}

impl SourceHealth {
    pub fn new(name: &'static str, silence_threshold: Duration) -> Self {
        SourceHealth {
            name,
            silence_threshold,
        }
    }

    /// Judge a source from the timestamp of its last good sample.
    pub fn status(&self, received_at: Option<DateTime<Utc>>, valid: bool, now: DateTime<Utc>) -> SourceStatus {
        let silence = received_at.map(|at| (now - at).to_std().unwrap_or(Duration::ZERO));
        let healthy = valid && silence.map(|d| d <= self.silence_threshold).unwrap_or(false);
        SourceStatus {
            name: self.name,
            healthy,
            silence,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceStatus {
    pub name: &'static str,
    pub healthy: bool,
    /// `None` when the source never delivered anything.
    pub silence: Option<Duration>,
}

impl SourceStatus {
    fn render(&self) -> String {
        match (self.healthy, self.silence) {
            (true, _) => format!("{} ✓", self.name),
            (false, Some(d)) => format!("{} ⚠ (silent {:.1}s)", self.name, d.as_secs_f64()),
            (false, None) => format!("{} ⚠ (no data)", self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HealthReport {
    pub base: SourceStatus,
    pub rover: SourceStatus,
    /// `None` when no inertial reader is scheduled.
    pub imu: Option<SourceStatus>,
}

impl HealthReport {
    fn sources(&self) -> impl Iterator<Item = &SourceStatus> {
        [Some(&self.base), Some(&self.rover), self.imu.as_ref()]
            .into_iter()
            .flatten()
    }
}

pub struct HealthMonitor {
    pub base: SourceHealth,
    pub rover: SourceHealth,
    pub imu: Option<SourceHealth>,
}

impl HealthMonitor {
    pub fn from_config(config: &HealthConfig, imu_scheduled: bool) -> Self {
        HealthMonitor {
            base: SourceHealth::new("base", config.gnss_silence()),
            rover: SourceHealth::new("rover", config.gnss_silence()),
            imu: imu_scheduled.then(|| SourceHealth::new("imu", config.imu_silence())),
        }
    }

    pub fn check(&self, snapshot: &Snapshot) -> HealthReport {
        let now = snapshot.taken_at;
        HealthReport {
            base: self.base.status(snapshot.base.received_at, snapshot.base.is_acquired(), now),
            rover: self.rover.status(snapshot.rover.received_at, snapshot.rover.is_acquired(), now),
            imu: self
                .imu
                .as_ref()
                .map(|imu| imu.status(snapshot.imu.received_at, snapshot.imu.valid, now)),
        }
    }

    /// One-line summary for the status log.
    pub fn format_status(&self, snapshot: &Snapshot) -> String {
        let report = self.check(snapshot);
        let parts: Vec<String> = report.sources().map(SourceStatus::render).collect();
        format!("Health: {}", parts.join(" | "))
    }
}

/// Log a warning when a source goes quiet and a note when it comes back.
pub async fn health_monitor_task(
    state: SharedState,
    monitor: HealthMonitor,
    check_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut previous: Option<HealthReport> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let report = monitor.check(&state.snapshot());
        for status in report.sources() {
            let was_healthy = previous
                .as_ref()
                .and_then(|p| p.sources().find(|s| s.name == status.name))
                .map(|s| s.healthy);

            match (was_healthy, status.healthy) {
                (Some(true), false) | (None, false) => match status.silence {
                    Some(d) => log::warn!("[health] {} silent for {:.1}s", status.name, d.as_secs_f64()),
                    None => log::warn!("[health] {} has not delivered data yet", status.name),
                },
                (Some(false), true) => log::info!("[health] {} recovered", status.name),
                _ => {}
            }
        }
        previous = Some(report);
    }
}
