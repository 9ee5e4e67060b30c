//! Error taxonomy for the simulation core

use thiserror::Error;

/// A coordinate pair used in error payloads, kept free of a dependency on
/// `packrunner-grid` so the core crate stays leaf-level.
pub type RawCoordinate = (i32, i32);

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("path error: unreachable or out of bounds from {from:?} to {to:?}")]
    Path {
        from: RawCoordinate,
        to: RawCoordinate,
    },

    #[error("handler error: {0}")]
    Handler(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("fatal invariant violation: {0}")]
    Fatal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SimError::Config(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        SimError::Validation(msg.into())
    }

    pub fn capacity<S: Into<String>>(msg: S) -> Self {
        SimError::Capacity(msg.into())
    }

    pub fn path(from: RawCoordinate, to: RawCoordinate) -> Self {
        SimError::Path { from, to }
    }

    pub fn handler<S: Into<String>>(msg: S) -> Self {
        SimError::Handler(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        SimError::Timeout(msg.into())
    }

    pub fn fatal<S: Into<String>>(msg: S) -> Self {
        SimError::Fatal(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
