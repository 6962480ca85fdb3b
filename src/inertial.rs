use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::error::SensorUnavailable;
use crate::state::SharedState;
use crate::types::InertialSample;

/// Anything that can report a yaw rate in degrees per second.
pub trait RateSensor: Send + 'static {
    fn read_rate_z(&mut self) -> Result<f64, SensorUnavailable>;

    fn name(&self) -> String;
}

/// Gyroscope exposed through the Linux IIO sysfs interface.
///
/// Reads `in_anglvel_z_raw`, adds `in_anglvel_z_offset` when present and
/// multiplies by the channel scale (rad/s per LSB).
#[derive(Debug)]
pub struct IioGyro {
    device: PathBuf,
    scale: f64,
    offset: f64,
}

impl IioGyro {
    /// Check the device once at startup, including one trial read.
    pub fn probe(device: &Path) -> Result<Self, SensorUnavailable> {
        if !device.join("in_anglvel_z_raw").exists() {
            return Err(SensorUnavailable::Missing(device.display().to_string()));
        }

        let scale = read_value(&device.join("in_anglvel_z_scale"))
            .or_else(|_| read_value(&device.join("in_anglvel_scale")))?;
        let offset = read_value(&device.join("in_anglvel_z_offset")).unwrap_or(0.0);

        let mut gyro = IioGyro {
            device: device.to_path_buf(),
            scale,
            offset,
        };
        gyro.read_rate_z()?;
        Ok(gyro)
    }
}

impl RateSensor for IioGyro {
    fn read_rate_z(&mut self) -> Result<f64, SensorUnavailable> {
        let raw = read_value(&self.device.join("in_anglvel_z_raw"))?;
        Ok(((raw + self.offset) * self.scale).to_degrees())
    }

    fn name(&self) -> String {
        format!("iio {}", self.device.display())
    }
}

fn read_value(path: &Path) -> Result<f64, SensorUnavailable> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SensorUnavailable::ReadFailed(format!("{}: {}", path.display(), e)))?;
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            SensorUnavailable::ReadFailed(format!("{}: not a number: {:?}", path.display(), text.trim()))
        })
}

/// Deterministic yaw-rate waveform bounded by ±10 deg/s.
#[derive(Debug)]
pub struct SimulatedGyro {
    step: Duration,
    ticks: u64,
}

impl SimulatedGyro {
    pub fn new(step: Duration) -> Self {
        Self { step, ticks: 0 }
    }
}

impl RateSensor for SimulatedGyro {
    fn read_rate_z(&mut self) -> Result<f64, SensorUnavailable> {
        let t = self.ticks as f64 * self.step.as_secs_f64();
        self.ticks += 1;
        Ok(8.0 * (t * 0.7).sin() + 2.0 * (t * 3.1).sin())
    }

    fn name(&self) -> String {
        "simulated gyro".to_string()
    }
}

pub struct InertialReader {
    sensor: Box<dyn RateSensor>,
    state: SharedState,
    period: Duration,
    error_backoff: Duration,
}

impl InertialReader {
    pub fn new(
        sensor: Box<dyn RateSensor>,
        state: SharedState,
        period: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            sensor,
            state,
            period,
            error_backoff,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "[imu] polling {} every {} ms",
            self.sensor.name(),
            self.period.as_millis()
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sample_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            match self.sensor.read_rate_z() {
                Ok(rate) => {
                    self.state.set_imu(InertialSample::new(rate, Utc::now()));
                    sample_count += 1;
                    if sample_count % 1000 == 0 {
                        log::debug!("[imu] {} samples", sample_count);
                    }
                }
                Err(e) => {
                    self.state.mark_imu_invalid();
                    log::warn!("[imu] {}", e);
                    tokio::select! {
                        _ = sleep(self.error_backoff) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }

        log::info!("[imu] reader stopped after {} samples", sample_count);
    }
}
