//! Error types for the formcheck engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid lifecycle call: cannot {operation} while {state}")]
    InvalidLifecycle {
        operation: &'static str,
        state: String,
    },

    #[error("Weight count mismatch: expected {expected}, got {actual}")]
    WeightMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Session sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
