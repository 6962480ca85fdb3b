use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{Config, InertialSource};
use crate::device::{DeviceReader, SerialOpener, TtyOpener};
use crate::error::ConfigError;
use crate::fusion::FusionEngine;
use crate::health::{health_monitor_task, HealthMonitor};
use crate::inertial::{IioGyro, InertialReader, RateSensor, SimulatedGyro};
use crate::sim::SimulatedOpener;
use crate::state::SharedState;
use crate::types::DeviceRole;

const SIMULATED_SENTENCE_PERIOD: Duration = Duration::from_secs(1);

/// Handles to every spawned task plus the shutdown signal they all watch.
pub struct Workers {
    shutdown: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
    imu_period: Option<Duration>,
}

impl Workers {
    pub fn imu_scheduled(&self) -> bool {
        self.imu_period.is_some()
    }

    /// Poll interval of the inertial reader, `None` when it was not scheduled.
    pub fn imu_period(&self) -> Option<Duration> {
        self.imu_period
    }

    /// Signal every task and wait for all of them to return.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                log::error!("[runtime] {} task ended abnormally: {}", name, e);
            }
        }
        log::info!("[runtime] all tasks stopped");
    }
}

/// Pick the rate sensor once. A sensor that fails its probe is never retried.
fn inertial_sensor(config: &Config) -> Option<Box<dyn RateSensor>> {
    let period = config.inertial.period(config.simulate);
    match &config.inertial.source {
        InertialSource::None => None,
        _ if config.simulate => Some(Box::new(SimulatedGyro::new(period))),
        InertialSource::Simulated => Some(Box::new(SimulatedGyro::new(period))),
        InertialSource::Iio { device } => match IioGyro::probe(device) {
            Ok(gyro) => Some(Box::new(gyro)),
            Err(e) => {
                log::warn!("[imu] {}; continuing with GNSS heading only", e);
                None
            }
        },
    }
}

/// Validate `config` and start both device readers, the inertial reader (when
/// a sensor is available), the fusion engine and the health monitor.
pub fn spawn(config: &Config, state: SharedState) -> Result<Workers, ConfigError> {
    config.validate()?;

    let opener: Arc<dyn SerialOpener> = if config.simulate {
        log::info!("[runtime] simulated receivers, {:.2} m baseline", config.fusion.baseline_length_m);
        Arc::new(SimulatedOpener::new(
            config.fusion.baseline_length_m,
            SIMULATED_SENTENCE_PERIOD,
        ))
    } else {
        Arc::new(TtyOpener)
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

    for (role, device) in [(DeviceRole::Base, &config.base), (DeviceRole::Rover, &config.rover)] {
        let reader = DeviceReader::new(role, device.clone(), opener.clone(), state.clone());
        handles.push((role.as_str(), tokio::spawn(reader.run(shutdown_rx.clone()))));
    }

    let mut imu_period = None;
    if let Some(sensor) = inertial_sensor(config) {
        let period = config.inertial.period(config.simulate);
        let reader = InertialReader::new(sensor, state.clone(), period, config.inertial.error_backoff());
        handles.push(("imu", tokio::spawn(reader.run(shutdown_rx.clone()))));
        imu_period = Some(period);
    }

    let engine = FusionEngine::new(state.clone(), config.fusion.clone());
    handles.push(("fusion", tokio::spawn(engine.run(shutdown_rx.clone()))));

    let monitor = HealthMonitor::from_config(&config.health, imu_period.is_some());
    handles.push((
        "health",
        tokio::spawn(health_monitor_task(
            state,
            monitor,
            config.health.check_interval(),
            shutdown_rx,
        )),
    ));

    Ok(Workers {
        shutdown: shutdown_tx,
        handles,
        imu_period,
    })
}
