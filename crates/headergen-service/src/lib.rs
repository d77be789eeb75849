//! Headergen Analysis Service
//!
//! The [`AnalysisService`] capability and its HTTP implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use headergen_service::{AnalysisService, HttpAnalysisService, HttpServiceConfig};
//!
//! # async fn run() -> Result<(), headergen_service::ServiceError> {
//! let service = HttpAnalysisService::new(&HttpServiceConfig::new("http://localhost:8000"))?;
//! let snapshot = serde_json::json!({"cells": [], "metadata": {}, "nbformat": 4, "nbformat_minor": 5});
//! let parsed = service.submit(&snapshot, "demo.ipynb").await?;
//! println!("{} cells analyzed", parsed.payload.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod http;
pub mod service;

// Re-exports
pub use error::ServiceError;
pub use http::{
    HttpAnalysisService, HttpServiceConfig, DEFAULT_ENDPOINT_PATH, DEFAULT_SERVER_URL, UPLOAD_FIELD,
};
pub use service::AnalysisService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
