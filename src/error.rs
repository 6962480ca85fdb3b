use thiserror::Error;

use crate::types::DeviceRole;

/// Why a line from a receiver did not produce a fix. Always discarded, never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseFailure {
    #[error("sentence contains non-ASCII bytes")]
    NonAscii,

    #[error("sentence does not start with '$'")]
    MissingStart,

    #[error("sentence has no '*hh' checksum")]
    MissingChecksum,

    #[error("checksum mismatch: computed {expected:02X}, sentence says {found}")]
    ChecksumMismatch { expected: u8, found: String },

    #[error("unsupported sentence type: {0}")]
    UnsupportedSentence(String),

    #[error("malformed {field} field: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("receiver reports no position fix")]
    NoFix,
}

/// Open, read or decode fault on a serial source.
#[derive(Error, Debug)]
pub enum ConnectionFailure {
    #[error("device {0} not found")]
    NotFound(String),

    #[error("failed to configure {path}: {reason}")]
    Configure { path: String, reason: String },

    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("opening {0} timed out")]
    OpenTimedOut(String),

    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("no data for {0} consecutive reads")]
    Stalled(u32),

    #[error("{0} consecutive undecodable lines")]
    Garbled(u32),
}

/// The inertial sensor is missing or a read failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorUnavailable {
    #[error("no inertial sensor at {0}")]
    Missing(String),

    #[error("inertial read failed: {0}")]
    ReadFailed(String),
}

/// A fusion cycle that published nothing. Expected during startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationSkipped {
    #[error("{0} fix not acquired yet")]
    FixNotAcquired(DeviceRole),

    #[error("non-finite result ({0})")]
    NonFinite(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
