//! Error types for notebook hosts

/// Errors while loading a notebook document
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    /// Document is not valid JSON
    #[error("notebook is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Document is JSON but not an nbformat notebook
    #[error("invalid notebook: {0}")]
    InvalidNotebook(String),

    /// Cell index out of range
    #[error("cell index {index} out of range (notebook has {len} cells)")]
    CellOutOfRange {
        /// Requested index
        index: usize,
        /// Number of cells
        len: usize,
    },
}
