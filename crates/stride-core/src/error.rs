//! Error types for stride-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid tuning: {field} must be {requirement}, got {value}")]
    InvalidTuning {
        field: &'static str,
        requirement: &'static str,
        value: f32,
    },

    #[error("Invalid tick rate: {0} Hz")]
    InvalidTickRate(u32),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
