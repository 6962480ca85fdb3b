use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::snapshot::Snapshot;
use crate::types::{DeviceConnectionState, DeviceRole, FusedEstimate, InertialSample, PositionFix};

/// Counters and connection state for one serial source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDiagnostics {
    pub state: DeviceConnectionState,
    pub connects: u64,
    pub failed_opens: u64,
    pub faults: u64,
    pub fixes_published: u64,
    pub parse_failures: u64,
    pub last_error: Option<String>,
    pub state_since: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
struct FixPair {
    base: PositionFix,
    rover: PositionFix,
}

#[derive(Clone, Debug, Default)]
struct DevicePair {
    base: DeviceDiagnostics,
    rover: DeviceDiagnostics,
}

impl DevicePair {
    fn get_mut(&mut self, role: DeviceRole) -> &mut DeviceDiagnostics {
        match role {
            DeviceRole::Base => &mut self.base,
            DeviceRole::Rover => &mut self.rover,
        }
    }
}

struct Inner {
    fixes: RwLock<FixPair>,
    imu: RwLock<InertialSample>,
    estimate: RwLock<Option<FusedEstimate>>,
    devices: RwLock<DevicePair>,
}

/// Latest fixes, inertial sample, fused estimate and device diagnostics.
///
/// Cloning gives another handle to the same store. Each field group has its own
/// lock and every critical section is a plain copy in or out, so a reader never
/// waits on I/O or math. A poisoned lock is recovered rather than propagated.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Inner>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SharedState {
    pub fn new() -> Self {
        SharedState {
            inner: Arc::new(Inner {
                fixes: RwLock::new(FixPair {
                    base: PositionFix::unacquired(DeviceRole::Base),
                    rover: PositionFix::unacquired(DeviceRole::Rover),
                }),
                imu: RwLock::new(InertialSample::default()),
                estimate: RwLock::new(None),
                devices: RwLock::new(DevicePair::default()),
            }),
        }
    }

    /// Base and rover fixes from the same instant.
    pub fn get_fixes(&self) -> (PositionFix, PositionFix) {
        let fixes = read(&self.inner.fixes);
        (fixes.base.clone(), fixes.rover.clone())
    }

    /// Replace the fix for `fix.role`.
    pub fn set_fix(&self, fix: PositionFix) {
        let mut fixes = write(&self.inner.fixes);
        match fix.role {
            DeviceRole::Base => fixes.base = fix,
            DeviceRole::Rover => fixes.rover = fix,
        }
    }

    pub fn get_imu(&self) -> InertialSample {
        read(&self.inner.imu).clone()
    }

    pub fn set_imu(&self, sample: InertialSample) {
        *write(&self.inner.imu) = sample;
    }

    /// Flag the last read as failed, keeping the previous rate and timestamp.
    pub fn mark_imu_invalid(&self) {
        write(&self.inner.imu).valid = false;
    }

    /// `None` until the fusion engine has published once.
    pub fn get_estimate(&self) -> Option<FusedEstimate> {
        read(&self.inner.estimate).clone()
    }

    pub fn publish_estimate(&self, estimate: FusedEstimate) {
        *write(&self.inner.estimate) = Some(estimate);
    }

    pub fn device(&self, role: DeviceRole) -> DeviceDiagnostics {
        let devices = read(&self.inner.devices);
        match role {
            DeviceRole::Base => devices.base.clone(),
            DeviceRole::Rover => devices.rover.clone(),
        }
    }

    /// Mutate one device's diagnostics in place. Keep `f` to field assignments.
    pub fn update_device<F>(&self, role: DeviceRole, f: F)
    where
        F: FnOnce(&mut DeviceDiagnostics),
    {
        let mut devices = write(&self.inner.devices);
        f(devices.get_mut(role));
    }

    pub fn snapshot(&self) -> Snapshot {
        let (base, rover) = self.get_fixes();
        Snapshot {
            estimate: self.get_estimate(),
            base,
            rover,
            imu: self.get_imu(),
            base_device: self.device(DeviceRole::Base),
            rover_device: self.device(DeviceRole::Rover),
            taken_at: Utc::now(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
