//! Heading and baseline error from two GNSS receivers, optionally steadied by a gyro.
//!
//! Two [`device::DeviceReader`]s keep the latest base and rover fixes in a
//! [`state::SharedState`], an [`inertial::InertialReader`] adds the yaw rate,
//! and a [`fusion::FusionEngine`] turns both into a [`types::FusedEstimate`]
//! on a fixed period. [`runtime::spawn`] wires everything up from a
//! [`config::Config`].

pub mod config;
pub mod device;
pub mod error;
pub mod filters;
pub mod fusion;
pub mod geodesy;
pub mod health;
pub mod inertial;
pub mod nmea;
pub mod reconnect;
pub mod runtime;
pub mod sim;
pub mod snapshot;
pub mod state;
pub mod types;

pub use config::Config;
pub use error::{ComputationSkipped, ConfigError, ConnectionFailure, ParseFailure, SensorUnavailable};
pub use snapshot::Snapshot;
pub use state::SharedState;
pub use types::{DeviceConnectionState, DeviceRole, FusedEstimate, InertialSample, PositionFix};
