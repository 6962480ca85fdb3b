use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::nmea::SentenceKind;

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

// ─── Serial sources ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub path: PathBuf,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: f64,
    /// An open (including the stty setup) that takes longer than this is abandoned.
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: f64,
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: f64,
    /// Multiplier applied to the backoff after each failed attempt. 1.0 keeps it fixed.
    #[serde(default = "default_backoff_growth")]
    pub backoff_growth: f64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: f64,
    /// Consecutive empty reads (or read timeouts) before the link counts as stalled.
    #[serde(default = "default_max_empty_reads")]
    pub max_empty_reads: u32,
    /// Consecutive non-ASCII lines before the link counts as garbled (usually a baud mismatch).
    #[serde(default = "default_max_garbled_lines")]
    pub max_garbled_lines: u32,
    #[serde(default = "default_accept")]
    pub accept: Vec<SentenceKind>,
}

fn default_baud_rate() -> u32 {
    9600
}
fn default_read_timeout_secs() -> f64 {
    1.0
}
fn default_open_timeout_secs() -> f64 {
    5.0
}
fn default_reconnect_backoff_secs() -> f64 {
    5.0
}
fn default_backoff_growth() -> f64 {
    1.0
}
fn default_max_backoff_secs() -> f64 {
    30.0
}
fn default_max_empty_reads() -> u32 {
    5
}
fn default_max_garbled_lines() -> u32 {
    10
}
fn default_accept() -> Vec<SentenceKind> {
    vec![SentenceKind::Gga]
}

impl DeviceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            baud_rate: default_baud_rate(),
            read_timeout_secs: default_read_timeout_secs(),
            open_timeout_secs: default_open_timeout_secs(),
            reconnect_backoff_secs: default_reconnect_backoff_secs(),
            backoff_growth: default_backoff_growth(),
            max_backoff_secs: default_max_backoff_secs(),
            max_empty_reads: default_max_empty_reads(),
            max_garbled_lines: default_max_garbled_lines(),
            accept: default_accept(),
        }
    }

    pub fn read_timeout(&self) -> Duration {
        secs(self.read_timeout_secs)
    }

    pub fn open_timeout(&self) -> Duration {
        secs(self.open_timeout_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        secs(self.reconnect_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        secs(self.max_backoff_secs)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(invalid(format!("{}.baud_rate must be positive", name)));
        }
        positive(&format!("{}.read_timeout_secs", name), self.read_timeout_secs)?;
        positive(&format!("{}.open_timeout_secs", name), self.open_timeout_secs)?;
        positive(&format!("{}.reconnect_backoff_secs", name), self.reconnect_backoff_secs)?;
        if !(self.backoff_growth >= 1.0 && self.backoff_growth.is_finite()) {
            return Err(invalid(format!("{}.backoff_growth must be >= 1.0", name)));
        }
        if !(self.max_backoff_secs >= self.reconnect_backoff_secs && self.max_backoff_secs.is_finite()) {
            return Err(invalid(format!(
                "{}.max_backoff_secs must be >= reconnect_backoff_secs",
                name
            )));
        }
        if self.max_empty_reads == 0 || self.max_garbled_lines == 0 {
            return Err(invalid(format!(
                "{}.max_empty_reads and max_garbled_lines must be at least 1",
                name
            )));
        }
        if self.accept.is_empty() {
            return Err(invalid(format!("{}.accept lists no sentence types", name)));
        }
        Ok(())
    }
}

// ─── Fusion ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    pub period_secs: f64,
    /// Physical separation between the two antennas.
    pub baseline_length_m: f64,
    /// Weight of the geodetic bearing in the complementary blend.
    pub blend_weight: f64,
    pub imu_stale_after_secs: f64,
    pub max_integration_step_secs: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            period_secs: 0.5,
            baseline_length_m: 0.70,
            blend_weight: 0.8,
            imu_stale_after_secs: 1.0,
            max_integration_step_secs: 1.0,
        }
    }
}

impl FusionParams {
    pub fn period(&self) -> Duration {
        secs(self.period_secs)
    }

    pub fn imu_stale_after(&self) -> Duration {
        secs(self.imu_stale_after_secs)
    }

    pub fn max_integration_step(&self) -> Duration {
        secs(self.max_integration_step_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("fusion.period_secs", self.period_secs)?;
        positive("fusion.imu_stale_after_secs", self.imu_stale_after_secs)?;
        positive("fusion.max_integration_step_secs", self.max_integration_step_secs)?;
        if !(self.baseline_length_m >= 0.0 && self.baseline_length_m.is_finite()) {
            return Err(invalid("fusion.baseline_length_m must be >= 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.blend_weight) {
            return Err(invalid("fusion.blend_weight must be within [0, 1]".to_string()));
        }
        Ok(())
    }
}

// ─── Inertial ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InertialSource {
    None,
    Simulated,
    /// Linux IIO gyroscope, e.g. `/sys/bus/iio/devices/iio:device0`.
    Iio { device: PathBuf },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InertialConfig {
    pub source: InertialSource,
    pub period_secs: f64,
    pub simulated_period_secs: f64,
    pub error_backoff_secs: f64,
}

impl Default for InertialConfig {
    fn default() -> Self {
        Self {
            source: InertialSource::Iio {
                device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            },
            period_secs: 0.05,
            simulated_period_secs: 0.1,
            error_backoff_secs: 1.0,
        }
    }
}

impl InertialConfig {
    /// Poll interval for the configured source. `simulate` swaps any hardware
    /// source for the synthetic gyro, which runs at the simulated rate.
    pub fn period(&self, simulate: bool) -> Duration {
        if simulate || self.source == InertialSource::Simulated {
            secs(self.simulated_period_secs)
        } else {
            secs(self.period_secs)
        }
    }

    pub fn error_backoff(&self) -> Duration {
        secs(self.error_backoff_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("inertial.period_secs", self.period_secs)?;
        positive("inertial.simulated_period_secs", self.simulated_period_secs)?;
        positive("inertial.error_backoff_secs", self.error_backoff_secs)
    }
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub gnss_silence_secs: f64,
    pub imu_silence_secs: f64,
    pub check_interval_secs: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            gnss_silence_secs: 5.0,
            imu_silence_secs: 1.0,
            check_interval_secs: 2.0,
        }
    }
}

impl HealthConfig {
    pub fn gnss_silence(&self) -> Duration {
        secs(self.gnss_silence_secs)
    }

    pub fn imu_silence(&self) -> Duration {
        secs(self.imu_silence_secs)
    }

    pub fn check_interval(&self) -> Duration {
        secs(self.check_interval_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("health.gnss_silence_secs", self.gnss_silence_secs)?;
        positive("health.imu_silence_secs", self.imu_silence_secs)?;
        positive("health.check_interval_secs", self.check_interval_secs)
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base: DeviceConfig,
    pub rover: DeviceConfig,
    pub fusion: FusionParams,
    pub inertial: InertialConfig,
    pub health: HealthConfig,
    /// Replace both receivers and the gyro with synthetic sources.
    pub simulate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: DeviceConfig::new("/dev/ttyUSB0"),
            rover: DeviceConfig::new("/dev/ttyUSB1"),
            fusion: FusionParams::default(),
            inertial: InertialConfig::default(),
            health: HealthConfig::default(),
            simulate: false,
        }
    }
}

impl Config {
    /// Read a JSON config file; missing sections fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base.validate("base")?;
        self.rover.validate("rover")?;
        if self.base.path == self.rover.path && !self.simulate {
            return Err(invalid(format!(
                "base and rover both use {}",
                self.base.path.display()
            )));
        }
        self.fusion.validate()?;
        self.inertial.validate()?;
        self.health.validate()
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{} must be a positive number of seconds", name)))
    }
}
