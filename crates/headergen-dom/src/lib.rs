//! Headergen Document Capabilities
//!
//! The annotation engine never owns the notebook page. It reaches the page
//! through two capabilities:
//!
//! - [`Dom`]: a mutable document tree addressed by opaque [`NodeId`]s
//! - [`NotebookHost`]: ordered cells, the notebook path and a JSON snapshot
//!
//! [`MemoryDom`] and [`MemoryNotebook`] are complete in-memory
//! implementations used for headless runs and tests.
//!
//! # Example
//!
//! ```rust
//! use headergen_dom::{Dom, MemoryDom};
//!
//! let mut dom = MemoryDom::new();
//! let root = dom.root();
//! let header = dom.create_element("h1");
//! dom.set_id(header, "ml-header-1");
//! dom.set_text(header, "load");
//! dom.append_child(root, header);
//!
//! assert_eq!(dom.element_by_id("ml-header-1"), Some(header));
//! assert_eq!(dom.outer_html(header), r#"<h1 id="ml-header-1">load</h1>"#);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod dom;
pub mod error;
pub mod host;
pub mod memory;

// Re-exports
pub use dom::{Dom, NodeId};
pub use error::NotebookError;
pub use host::{CellHandle, MemoryNotebook, NotebookHost};
pub use memory::MemoryDom;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
