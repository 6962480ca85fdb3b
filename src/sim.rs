//! Synthetic receivers for running the whole pipeline without hardware.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::io::{duplex, AsyncWriteExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::DeviceConfig;
use crate::device::{LineStream, SerialOpener};
use crate::error::ConnectionFailure;
use crate::geodesy::EARTH_RADIUS_M;
use crate::nmea::format_gga;
use crate::types::DeviceRole;

/// Tokyo Station, roughly.
pub const DEFAULT_ORIGIN: (f64, f64) = (35.681236, 139.767125);

/// Describes where the two simulated antennas are at any instant.
///
/// The base wanders a few decimetres around `origin` with an error shared by both
/// receivers, and the rover sits `baseline_m` away on a heading that sweeps slowly
/// between 15° and 75°. Positions are a pure function of wall-clock time so two
/// independently opened streams stay consistent.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub origin: (f64, f64),
    pub baseline_m: f64,
}

impl Scenario {
    pub fn heading_at(&self, at: DateTime<Utc>) -> f64 {
        45.0 + 30.0 * (seconds(at) * 0.05).sin()
    }

    pub fn position(&self, role: DeviceRole, at: DateTime<Utc>) -> (f64, f64) {
        let t = seconds(at);
        // common-mode error, the part a two-antenna baseline cancels out
        let north = 0.3 * (t * 0.11).sin();
        let east = 0.3 * (t * 0.07).cos();
        let (lat, lon) = offset(self.origin, north, east);

        match role {
            DeviceRole::Base => (lat, lon),
            DeviceRole::Rover => {
                let heading = self.heading_at(at).to_radians();
                let wobble = 0.01 * (t * 1.7).sin();
                offset(
                    (lat, lon),
                    self.baseline_m * heading.cos() + wobble,
                    self.baseline_m * heading.sin() - wobble,
                )
            }
        }
    }
}

fn seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// Shift a position by metres north and east on a local tangent plane.
fn offset((lat, lon): (f64, f64), north_m: f64, east_m: f64) -> (f64, f64) {
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlon = (east_m / (EARTH_RADIUS_M * lat.to_radians().cos())).to_degrees();
    (lat + dlat, lon + dlon)
}

/// Serves one GGA sentence per `period` from a [`Scenario`] over an in-memory pipe.
#[derive(Clone, Debug)]
pub struct SimulatedOpener {
    scenario: Scenario,
    period: Duration,
}

impl SimulatedOpener {
    pub fn new(baseline_m: f64, period: Duration) -> Self {
        Self {
            scenario: Scenario {
                origin: DEFAULT_ORIGIN,
                baseline_m,
            },
            period,
        }
    }
}

impl SerialOpener for SimulatedOpener {
    fn open(&self, role: DeviceRole, _config: &DeviceConfig) -> Result<LineStream, ConnectionFailure> {
        let (reader, mut writer) = duplex(4096);
        let scenario = self.scenario.clone();
        let period = self.period;

        // ends on its own once the reader drops its half
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0u64;
            loop {
                ticker.tick().await;
                let now = Utc::now();
                let (lat, lon) = scenario.position(role, now);
                let hdop = 0.8 + 0.3 * (seq as f64 * 0.1).sin();
                let line = format!("{}\r\n", format_gga(now, lat, lon, hdop));
                if writer.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                seq += 1;
            }
            log::trace!("[{}] simulated stream closed after {} sentences", role, seq);
        });

        Ok(Box::new(BufReader::new(reader)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::{haversine_distance, initial_bearing};
    use crate::nmea::parse_line;
    use approx::assert_abs_diff_eq;
    use tokio::io::AsyncBufReadExt;

    #[test]
    fn test_scenario_keeps_baseline() {
        let scenario = Scenario {
            origin: DEFAULT_ORIGIN,
            baseline_m: 0.70,
        };
        let start = Utc::now();
        for k in 0..50 {
            let at = start + chrono::Duration::seconds(k * 7);
            let (blat, blon) = scenario.position(DeviceRole::Base, at);
            let (rlat, rlon) = scenario.position(DeviceRole::Rover, at);
            let distance = haversine_distance(blat, blon, rlat, rlon);
            assert_abs_diff_eq!(distance, 0.70, epsilon = 0.02);
            let bearing = initial_bearing(blat, blon, rlat, rlon);
            assert_abs_diff_eq!(bearing, scenario.heading_at(at), epsilon = 2.0);
        }
    }

    #[tokio::test]
    async fn test_opener_streams_valid_sentences() {
        let opener = SimulatedOpener::new(0.70, Duration::from_millis(10));
        let config = DeviceConfig::new("sim://rover");
        let mut stream = opener.open(DeviceRole::Rover, &config).unwrap();

        for _ in 0..3 {
            let mut line = Vec::new();
            tokio::time::timeout(Duration::from_secs(1), stream.read_until(b'\n', &mut line))
                .await
                .expect("simulated receiver went quiet")
                .unwrap();
            let fix = parse_line(&line).unwrap();
            assert_abs_diff_eq!(fix.latitude, DEFAULT_ORIGIN.0, epsilon = 1e-4);
            assert_abs_diff_eq!(fix.longitude, DEFAULT_ORIGIN.1, epsilon = 1e-4);
            assert!(fix.horizontal_dilution.unwrap() > 0.0);
        }
    }
}
