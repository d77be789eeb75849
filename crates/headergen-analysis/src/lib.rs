//! Headergen Analysis Model
//!
//! Typed view over the result returned by the notebook static-analysis
//! service, plus the pure derivations the renderers need.
//!
//! # Overview
//!
//! - **AnalysisPayload**: cell position → [`CellRecord`] (phases + function calls)
//! - **PhaseIndex**: phase → ascending cell positions
//! - **FunctionIndex**: cell position → functions grouped by library
//! - **highlight_headings**: docstring heading detection
//!
//! # Example
//!
//! ```rust
//! use headergen_analysis::{AnalysisPayload, CellPosition};
//!
//! let body = r#"{"cell_mapping": {"1": {"ml_phase": ["load"], "functions": {}}}}"#;
//! let parsed = AnalysisPayload::from_json_str(body).unwrap();
//! assert!(parsed.issues.is_empty());
//!
//! let index = parsed.payload.index();
//! assert_eq!(index.phases.cells("load"), &[CellPosition::FIRST]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod arguments;
pub mod docstring;
pub mod error;
pub mod grouping;
pub mod payload;
pub mod phase_index;

// Re-exports
pub use arguments::{display_value, merge_argument_sets, MergedArguments};
pub use docstring::{highlight_headings, DocSegment};
pub use error::PayloadError;
pub use grouping::{group_by_library, library_of, FunctionIndex, LibraryGroup, LIBRARY_SEPARATOR};
pub use payload::{
    AnalysisIndex, AnalysisPayload, ArgumentSet, CellPosition, CellRecord, FunctionDetail,
    ParsedPayload,
};
pub use phase_index::PhaseIndex;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with analysis payloads
    pub use crate::{
        group_by_library, highlight_headings, library_of, AnalysisIndex, AnalysisPayload,
        CellPosition, CellRecord, DocSegment, FunctionDetail, LibraryGroup, PhaseIndex,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
