//! Headergen Rendering
//!
//! Turns an analysis payload into widgets inside a live notebook page.
//!
//! # Components
//!
//! - [`ToggleRegistry`]: expanded/collapsed state per widget id
//! - [`SidebarRenderer`]: phase → cell index, rebuilt wholesale every run
//! - [`CellAnnotator`]: per-cell phase header and function details, updated in place
//! - [`Toolbar`]: trigger, headers/sidebar toggles, spinner, failure notice
//!
//! Widgets are addressed by deterministic ids ([`WidgetId`]) and looked up
//! again on every run, so nothing here keeps node handles between runs.
//!
//! # Example
//!
//! ```rust
//! use headergen_analysis::{CellPosition, CellRecord};
//! use headergen_dom::{Dom, MemoryDom};
//! use headergen_render::{CellAnnotator, ToggleRegistry};
//!
//! let mut dom = MemoryDom::new();
//! let root = dom.root();
//! let cell = dom.build("div", Some("cell"), None);
//! dom.append_child(root, cell);
//!
//! let mut registry = ToggleRegistry::new();
//! let record = CellRecord::with_phases(["train", "eval"]);
//! CellAnnotator::new().annotate(&mut dom, &mut registry, CellPosition::FIRST, &record, &[], cell);
//!
//! let header = dom.element_by_id("ml-header-1").unwrap();
//! assert_eq!(dom.text_content(header), "train | eval");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod annotator;
pub mod registry;
pub mod sidebar;
pub mod toolbar;
pub mod widget;

// Re-exports
pub use annotator::{Annotation, CellAnnotator, DEFAULT_PHASE_SEPARATOR};
pub use registry::ToggleRegistry;
pub use sidebar::{SidebarRenderer, SIDEBAR_ID};
pub use toolbar::{Toolbar, ToolbarAction};
pub use widget::{release_foreign_ids, WidgetId, TOGGLE_ATTRIBUTE};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for rendering
    pub use crate::{CellAnnotator, SidebarRenderer, ToggleRegistry, Toolbar, WidgetId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
