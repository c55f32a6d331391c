//! Error types for vista-ph
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for vista-ph module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from vista-common
    #[error(transparent)]
    Common(#[from] vista_common::Error),

    /// Invalid scenario or simulation input
    #[error("Invalid scenario: {0}")]
    Scenario(String),

    /// Driver channel closed or runtime failure
    #[error("Driver error: {0}")]
    Driver(String),
}

/// Convenience Result type using vista-ph Error
pub type Result<T> = std::result::Result<T, Error>;
