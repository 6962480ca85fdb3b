use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::state::DeviceDiagnostics;
use crate::types::{FusedEstimate, InertialSample, PositionFix};

/// Everything a presentation layer needs, read in one call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// `None` until the first fusion cycle with two acquired fixes.
    pub estimate: Option<FusedEstimate>,
    pub base: PositionFix,
    pub rover: PositionFix,
    pub imu: InertialSample,
    pub base_device: DeviceDiagnostics,
    pub rover_device: DeviceDiagnostics,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Write as pretty JSON. Goes through a temp file so pollers never see half a write.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// One-line human summary for the status log.
    pub fn summary(&self) -> String {
        let estimate = match &self.estimate {
            Some(e) => format!(
                "heading {:.2}° (gps {:.2}°{}) dist {:.3} m err {:.3} m",
                e.heading_degrees,
                e.gps_bearing_degrees,
                if e.imu_contributing { ", imu" } else { "" },
                e.distance_meters,
                e.baseline_error_meters
            ),
            None => "no estimate yet".to_string(),
        };
        format!(
            "{} | base {:?} hdop {:.1} | rover {:?} hdop {:.1} | imu {}",
            estimate,
            self.base_device.state,
            self.base.horizontal_dilution,
            self.rover_device.state,
            self.rover.horizontal_dilution,
            if self.imu.valid { "ok" } else { "off" }
        )
    }
}
