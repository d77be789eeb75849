//! Analysis service capability

use crate::error::ServiceError;
use async_trait::async_trait;
use headergen_analysis::ParsedPayload;
use serde_json::Value;
use std::sync::Arc;

/// Produces an analysis payload for a notebook snapshot
///
/// `file_name` is the notebook path as the host reports it; the service uses
/// it to name the uploaded document.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit a snapshot and decode the response
    ///
    /// # Errors
    /// Returns `ServiceError` on transport failure, non-success status or a
    /// body that is not JSON. Structural problems inside a JSON body are not
    /// errors; they are reported in `ParsedPayload::issues`.
    async fn submit(&self, snapshot: &Value, file_name: &str) -> Result<ParsedPayload, ServiceError>;
}

#[async_trait]
impl<S: AnalysisService + ?Sized> AnalysisService for Arc<S> {
    async fn submit(&self, snapshot: &Value, file_name: &str) -> Result<ParsedPayload, ServiceError> {
        (**self).submit(snapshot, file_name).await
    }
}

#[async_trait]
impl<S: AnalysisService + ?Sized> AnalysisService for Box<S> {
    async fn submit(&self, snapshot: &Value, file_name: &str) -> Result<ParsedPayload, ServiceError> {
        (**self).submit(snapshot, file_name).await
    }
}
