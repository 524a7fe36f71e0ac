use thiserror::Error;

use super::state::{EndpointState, StreamDirection};

/// Reasons a stream queue could not be reserved.
///
/// Every variant is fatal to pipeline setup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("insufficient memory for a {requested} byte sound queue")]
    InsufficientMemory { requested: u64 },

    #[error("queue duration of {0} ms is outside 1..=1000")]
    InvalidDuration(u32),

    #[error("queue size of {0} frames is outside 1..=sample rate")]
    InvalidFrameCount(usize),
}

/// Errors that can occur while setting up or running the passthrough pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PassthroughError {
    #[error("configuration failed: {0}")]
    Configuration(String),

    #[error("queue allocation failed: {0}")]
    Alloc(#[from] AllocError),

    #[error("cannot start {device}: {reason}")]
    StartFailed { device: String, reason: String },

    #[error("illegal endpoint transition {from:?} -> {to:?}")]
    InvalidTransition { from: EndpointState, to: EndpointState },

    #[error("{device} is not a {expected:?} device")]
    DirectionMismatch { device: String, expected: StreamDirection },

    #[error("device error: {0}")]
    Device(String),

    #[error("session already running")]
    SessionAlreadyRunning,

    #[error("session not running")]
    SessionNotRunning,

    #[error("thread error: {0}")]
    Thread(String),
}
