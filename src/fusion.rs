//! Periodic base→rover geometry and heading fusion.
//!
//! Each cycle copies the two fixes and the inertial sample out of
//! [`SharedState`], computes bearing, distance and baseline error without
//! holding any lock, and publishes one whole [`FusedEstimate`]. A cycle that
//! cannot produce a trustworthy estimate publishes nothing, so readers keep
//! seeing the previous one.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::FusionParams;
use crate::error::ComputationSkipped;
use crate::filters::complementary::ComplementaryFilter;
use crate::geodesy::{haversine_distance, initial_bearing};
use crate::state::SharedState;
use crate::types::{DeviceRole, FusedEstimate, InertialSample, PositionFix};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaselineGeometry {
    pub bearing_deg: f64,
    pub distance_m: f64,
    pub baseline_error_m: f64,
}

/// Bearing, distance and deviation from the surveyed baseline for one fix pair.
pub fn baseline_geometry(
    base: &PositionFix,
    rover: &PositionFix,
    baseline_length_m: f64,
) -> Result<BaselineGeometry, ComputationSkipped> {
    if !base.is_acquired() {
        return Err(ComputationSkipped::FixNotAcquired(DeviceRole::Base));
    }
    if !rover.is_acquired() {
        return Err(ComputationSkipped::FixNotAcquired(DeviceRole::Rover));
    }

    let distance_m = haversine_distance(base.latitude, base.longitude, rover.latitude, rover.longitude);
    if !distance_m.is_finite() {
        return Err(ComputationSkipped::NonFinite("distance"));
    }
    let bearing_deg = initial_bearing(base.latitude, base.longitude, rover.latitude, rover.longitude);
    if !bearing_deg.is_finite() {
        return Err(ComputationSkipped::NonFinite("bearing"));
    }

    Ok(BaselineGeometry {
        bearing_deg,
        distance_m,
        baseline_error_m: (distance_m - baseline_length_m).abs(),
    })
}

pub struct FusionEngine {
    state: SharedState,
    params: FusionParams,
    filter: ComplementaryFilter,
    published: u64,
    last_skip: Option<ComputationSkipped>,
}

impl FusionEngine {
    pub fn new(state: SharedState, params: FusionParams) -> Self {
        let filter = ComplementaryFilter::new(params.blend_weight, params.max_integration_step());
        Self {
            state,
            params,
            filter,
            published: 0,
            last_skip: None,
        }
    }

    /// Run one cycle at `now`, publishing on success.
    pub fn step(&mut self, now: DateTime<Utc>) -> Result<FusedEstimate, ComputationSkipped> {
        let (base, rover) = self.state.get_fixes();
        let imu = self.state.get_imu();

        // a skipped cycle breaks the heading history the gyro proxy is built on
        let geometry = match baseline_geometry(&base, &rover, self.params.baseline_length_m) {
            Ok(geometry) => geometry,
            Err(skip) => {
                self.filter.reset();
                return Err(skip);
            }
        };
        let rate = self.usable_rate(&imu, now);
        let blended = self.filter.update(geometry.bearing_deg, rate, now);
        if !blended.heading_deg.is_finite() {
            self.filter.reset();
            return Err(ComputationSkipped::NonFinite("heading"));
        }

        let estimate = FusedEstimate {
            heading_degrees: blended.heading_deg,
            gps_bearing_degrees: geometry.bearing_deg,
            distance_meters: geometry.distance_m,
            baseline_error_meters: geometry.baseline_error_m,
            imu_contributing: blended.imu_contributing,
            base_fix: base,
            rover_fix: rover,
            computed_at: now,
        };
        self.state.publish_estimate(estimate.clone());
        self.published += 1;
        Ok(estimate)
    }

    /// Yaw rate from a sample that is valid, finite and fresh enough.
    fn usable_rate(&self, imu: &InertialSample, now: DateTime<Utc>) -> Option<f64> {
        if !imu.valid || !imu.angular_rate_z.is_finite() {
            return None;
        }
        let age = (now - imu.received_at?).to_std().unwrap_or(Duration::ZERO);
        if age > self.params.imu_stale_after() {
            return None;
        }
        Some(imu.angular_rate_z)
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "[fusion] every {} ms, baseline {:.3} m, gps weight {:.2}",
            self.params.period().as_millis(),
            self.params.baseline_length_m,
            self.params.blend_weight
        );

        let mut ticker = interval(self.params.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            match self.step(Utc::now()) {
                Ok(estimate) => {
                    if self.last_skip.take().is_some() {
                        log::info!("[fusion] publishing again");
                    }
                    log::trace!(
                        "[fusion] heading {:.2} dist {:.3} err {:.3}",
                        estimate.heading_degrees,
                        estimate.distance_meters,
                        estimate.baseline_error_meters
                    );
                }
                Err(skip) => {
                    if self.last_skip.as_ref() != Some(&skip) {
                        match skip {
                            ComputationSkipped::FixNotAcquired(_) => log::debug!("[fusion] skipping: {}", skip),
                            ComputationSkipped::NonFinite(_) => log::warn!("[fusion] skipping: {}", skip),
                        }
                    }
                    self.last_skip = Some(skip);
                }
            }
        }

        log::info!("[fusion] stopped after {} estimates", self.published);
    }
}
