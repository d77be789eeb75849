//! Payload error types
//!
//! None of these fail an analysis run. They describe the parts of a
//! response that were dropped while building the typed payload.

use crate::payload::CellPosition;

/// Problems found while reading the `cell_mapping` of a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Response has no `cell_mapping` field
    #[error("payload has no cell_mapping field")]
    MissingCellMapping,

    /// `cell_mapping` is present but not an object
    #[error("cell_mapping is not an object (found {0})")]
    InvalidCellMapping(&'static str),

    /// Key is not a 1-based cell position
    #[error("cell_mapping key is not a 1-based cell position: '{0}'")]
    InvalidCellKey(String),

    /// Record could not be decoded
    #[error("record for cell {position} is malformed: {message}")]
    InvalidRecord {
        /// Cell the record belongs to
        position: CellPosition,
        /// Decoder message
        message: String,
    },
}

impl PayloadError {
    /// Whether the whole mapping was discarded
    #[inline]
    #[must_use]
    pub fn discards_mapping(&self) -> bool {
        matches!(self, Self::MissingCellMapping | Self::InvalidCellMapping(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_error_display() {
        let err = PayloadError::InvalidCellKey("abc".to_string());
        assert!(err.to_string().contains("'abc'"));

        let err = PayloadError::InvalidRecord {
            position: CellPosition::FIRST,
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "record for cell 1 is malformed: bad");
    }

    #[test]
    fn discards_mapping_classification() {
        assert!(PayloadError::MissingCellMapping.discards_mapping());
        assert!(PayloadError::InvalidCellMapping("array").discards_mapping());
        assert!(!PayloadError::InvalidCellKey("0".into()).discards_mapping());
    }
}
