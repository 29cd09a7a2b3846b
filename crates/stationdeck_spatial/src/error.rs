use std::io;

/// Errors surfaced when loading or saving configuration. Per-frame
/// interaction paths never produce these; they abort quietly and return a
/// falsy value instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("pinch end threshold {end} must be larger than start threshold {start}")]
    PinchThresholds { start: f32, end: f32 },

    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("teleport normal threshold {0} must be within [0, 1]")]
    NormalThreshold(f32),

    #[error("smoothing {0} must be within [0, 1)")]
    Smoothing(f32),
}

/// Failure reported by the external position store. Logged, never
/// propagated back into local interaction state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("position update rejected: {0}")]
    Rejected(String),

    #[error("position store unavailable")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
