//! Headergen Core
//!
//! Drives an analysis run against a notebook page:
//! - Serializes the notebook and submits it to the analysis service
//! - Renders the phase sidebar and annotates every analyzed cell
//! - Guards against overlapping runs with a small state machine
//! - Loads configuration and sets up tracing
//!
//! # Example
//!
//! ```rust,no_run
//! use headergen_core::{HeadergenConfig, Orchestrator};
//! use headergen_dom::MemoryNotebook;
//!
//! # async fn example() -> headergen_core::Result<()> {
//! let config = HeadergenConfig::default().apply_env_overrides()?;
//! headergen_core::init_tracing(&config)?;
//!
//! let orchestrator = Orchestrator::from_config(config)?;
//! let mut notebook = MemoryNotebook::new("train.ipynb").with_code_cell("import torch");
//!
//! let outcome = orchestrator.run(&mut notebook).await;
//! if let Some(summary) = outcome.summary() {
//!     println!("annotated {} cells", summary.cells_annotated);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod telemetry;

// Re-exports
pub use config::HeadergenConfig;
pub use error::{HeadergenError, Result};
pub use orchestrator::{ClickEffect, Orchestrator, RunFailure, RunOutcome, RunSummary};
pub use state::{allowed_transitions, validate_transition, RunState};
pub use telemetry::init_tracing;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving analysis runs
    pub use crate::{
        ClickEffect, HeadergenConfig, HeadergenError, Orchestrator, RunOutcome, RunState,
        RunSummary,
    };
    pub use headergen_dom::{MemoryNotebook, NotebookHost};
    pub use headergen_service::{AnalysisService, HttpAnalysisService};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
