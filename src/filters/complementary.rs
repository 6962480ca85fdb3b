use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::geodesy::{angle_difference, normalize_degrees};

#[derive(Clone, Debug, PartialEq)]
pub struct ComplementaryFilterState {
    pub heading_deg: f64,
    /// Previous heading advanced by the integrated yaw rate, when available.
    pub imu_heading_deg: Option<f64>,
    pub imu_contributing: bool,
}

/// Fixed-weight heading blend of the geodetic bearing and a gyro-propagated heading.
///
/// The gyro only measures rate, so its heading proxy is the last published heading
/// advanced by `rate * dt`. The blend is taken along the shortest arc so that
/// 359° and 1° average to 0° rather than 180°. A gap longer than `max_step`
/// drops the history, so the first cycle after an outage is the bearing alone.
pub struct ComplementaryFilter {
    heading: Option<f64>,
    last_update: Option<DateTime<Utc>>,

    // 0.8 = 80% trust GPS bearing
    gps_weight: f64,
    max_step: Duration,
}

impl ComplementaryFilter {
    pub fn new(gps_weight: f64, max_step: Duration) -> Self {
        Self {
            heading: None,
            last_update: None,
            gps_weight: gps_weight.clamp(0.0, 1.0),
            max_step,
        }
    }

    /// Fold in one cycle. `rate_z` is `None` when the inertial sample is unusable,
    /// in which case the GPS bearing is returned untouched.
    pub fn update(&mut self, gps_bearing: f64, rate_z: Option<f64>, now: DateTime<Utc>) -> ComplementaryFilterState {
        let dt = self
            .last_update
            .map(|last| (now - last).to_std().unwrap_or(Duration::ZERO))
            .filter(|dt| *dt <= self.max_step)
            .map(|dt| dt.as_secs_f64());
        self.last_update = Some(now);

        let state = match (rate_z, self.heading, dt) {
            (Some(rate), Some(previous), Some(dt)) => {
                let imu_heading = normalize_degrees(previous + rate * dt);
                let correction = (1.0 - self.gps_weight) * angle_difference(gps_bearing, imu_heading);
                ComplementaryFilterState {
                    heading_deg: normalize_degrees(gps_bearing + correction),
                    imu_heading_deg: Some(imu_heading),
                    imu_contributing: true,
                }
            }
            _ => ComplementaryFilterState {
                heading_deg: gps_bearing,
                imu_heading_deg: None,
                imu_contributing: false,
            },
        };

        self.heading = Some(state.heading_deg);
        state
    }

    pub fn reset(&mut self) {
        self.heading = None;
        self.last_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Duration as ChronoDuration;

    fn filter() -> ComplementaryFilter {
        ComplementaryFilter::new(0.8, Duration::from_secs(1))
    }

    #[test]
    fn test_first_cycle_is_pure_gps() {
        let mut f = filter();
        let state = f.update(42.0, Some(5.0), Utc::now());
        assert_eq!(state.heading_deg, 42.0);
        assert!(!state.imu_contributing);
        assert_eq!(f.heading, Some(42.0));
    }

    #[test]
    fn test_linear_blend_away_from_seam() {
        let mut f = filter();
        let t0 = Utc::now();
        f.update(10.0, None, t0);
        let state = f.update(20.0, Some(0.0), t0 + ChronoDuration::milliseconds(500));
        // 0.8 * 20 + 0.2 * 10
        assert_abs_diff_eq!(state.heading_deg, 18.0, epsilon = 1e-9);
        assert!(state.imu_contributing);
    }

    #[test]
    fn test_rate_is_integrated_over_elapsed_time() {
        let mut f = filter();
        let t0 = Utc::now();
        f.update(100.0, None, t0);
        let state = f.update(100.0, Some(10.0), t0 + ChronoDuration::milliseconds(500));
        assert_abs_diff_eq!(state.imu_heading_deg.unwrap(), 105.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.heading_deg, 101.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_at_limit_still_integrates() {
        let mut f = filter();
        let t0 = Utc::now();
        f.update(100.0, None, t0);
        let state = f.update(100.0, Some(10.0), t0 + ChronoDuration::seconds(1));
        assert_abs_diff_eq!(state.imu_heading_deg.unwrap(), 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_long_gap_restarts_from_bearing() {
        let mut f = filter();
        let t0 = Utc::now();
        f.update(0.0, None, t0);
        let state = f.update(90.0, Some(0.0), t0 + ChronoDuration::seconds(60));
        assert_eq!(state.heading_deg, 90.0);
        assert!(!state.imu_contributing);

        // history resumes from the restart
        let state = f.update(90.0, Some(0.0), t0 + ChronoDuration::milliseconds(60_500));
        assert!(state.imu_contributing);
        assert_abs_diff_eq!(state.heading_deg, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_blend_across_north() {
        let mut f = filter();
        let t0 = Utc::now();
        f.update(359.0, None, t0);
        let state = f.update(1.0, Some(0.0), t0 + ChronoDuration::milliseconds(500));
        assert_abs_diff_eq!(state.heading_deg, 0.6, epsilon = 1e-9);

        let state = f.update(359.5, Some(0.0), t0 + ChronoDuration::seconds(1));
        assert!((0.0..360.0).contains(&state.heading_deg));
    }

    #[test]
    fn test_invalid_rate_returns_exact_bearing() {
        let mut f = filter();
        let t0 = Utc::now();
        f.update(10.0, None, t0);
        f.update(20.0, Some(3.0), t0 + ChronoDuration::milliseconds(500));
        let state = f.update(123.456789, None, t0 + ChronoDuration::seconds(1));
        assert_eq!(state.heading_deg, 123.456789);
        assert!(!state.imu_contributing);
        assert_eq!(state.imu_heading_deg, None);
    }

    #[test]
    fn test_reset_forgets_heading() {
        let mut f = filter();
        f.update(10.0, None, Utc::now());
        f.reset();
        assert_eq!(f.heading, None);
        assert_eq!(f.last_update, None);
    }
}
