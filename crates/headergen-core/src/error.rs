//! Error types for Headergen Core
//!
//! Errors never escape a run; the orchestrator folds them into a
//! [`RunOutcome`](crate::RunOutcome). They surface directly only from
//! configuration loading and client construction.

use crate::state::RunState;
use headergen_service::ServiceError;
use std::path::PathBuf;

/// Main Headergen error type
#[derive(Debug, thiserror::Error)]
pub enum HeadergenError {
    /// Analysis service failed
    #[error("analysis service error: {0}")]
    Service(#[from] ServiceError),

    /// Configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Another run is in flight
    #[error("an analysis run is already in progress")]
    Busy,

    /// Run state machine was driven along an edge it does not have
    #[error("illegal run state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: RunState,
        /// Requested state
        to: RunState,
    },
}

impl HeadergenError {
    /// Check if trying again later could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service(e) => e.is_retryable(),
            Self::Busy => true,
            _ => false,
        }
    }

    /// Check if error comes from configuration
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ConfigIo { .. } | Self::ConfigParse(_)
        )
    }

    /// Short description suitable for the failure notice
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Service(e) => e.summary(),
            other => other.to_string(),
        }
    }
}

/// Result alias for Headergen Core
pub type Result<T> = std::result::Result<T, HeadergenError>;
