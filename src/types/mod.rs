use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// HDOP reported until a receiver gives us a real value.
pub const UNKNOWN_HDOP: f64 = 99.9;

/// Which of the two receivers a fix came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Base,
    Rover,
}

impl DeviceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceRole::Base => "base",
            DeviceRole::Rover => "rover",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a serial source, owned by its `DeviceReader`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Streaming,
    Faulted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_dilution: f64,
    pub role: DeviceRole,
    pub received_at: Option<DateTime<Utc>>,
}

impl PositionFix {
    /// The (0, 0) placeholder held until the receiver reports a position.
    pub fn unacquired(role: DeviceRole) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            horizontal_dilution: UNKNOWN_HDOP,
            role,
            received_at: None,
        }
    }

    /// A zero latitude or longitude is never trusted as a real position.
    pub fn is_acquired(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Yaw rate in degrees per second.
    pub angular_rate_z: f64,
    pub valid: bool,
    pub received_at: Option<DateTime<Utc>>,
}

impl InertialSample {
    pub fn new(angular_rate_z: f64, received_at: DateTime<Utc>) -> Self {
        Self {
            angular_rate_z,
            valid: true,
            received_at: Some(received_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusedEstimate {
    pub heading_degrees: f64,
    /// Geodetic bearing before any inertial blending.
    pub gps_bearing_degrees: f64,
    pub distance_meters: f64,
    pub baseline_error_meters: f64,
    pub imu_contributing: bool,
    pub base_fix: PositionFix,
    pub rover_fix: PositionFix,
    pub computed_at: DateTime<Utc>,
}
