//! Widget identities
//!
//! Every toggleable widget has a deterministic document id derived from the
//! cell position and its role, so ids stay stable across runs and toggle state
//! can be carried over a rebuild.

use headergen_analysis::CellPosition;
use headergen_dom::{Dom, NodeId};
use std::collections::HashMap;
use std::fmt;

/// Class of the per-cell header container
pub const HEADER_CONTAINER_CLASS: &str = "ml-phase-container";
/// Class of the heading inside the header container
pub const HEADER_HEADING_CLASS: &str = "ml-phase-header";
/// Class of the "View Function Calls" control
pub const DETAILS_TOGGLE_CLASS: &str = "view-function-calls";
/// Class of the function details container
pub const DETAILS_CLASS: &str = "function-details";
/// Class wrapped around docstring headings
pub const HIGHLIGHTED_HEADING_CLASS: &str = "highlighted-heading";
/// Attribute naming the widget a control toggles
pub const TOGGLE_ATTRIBUTE: &str = "data-toggle";

/// Identity of a toggleable (or linkable) widget
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetId {
    /// Phase header container of a cell
    Header(CellPosition),
    /// "View Function Calls" control of a cell
    DetailsToggle(CellPosition),
    /// Function details container of a cell
    Details(CellPosition),
    /// Library bucket inside a cell's details
    Library {
        /// Owning cell
        cell: CellPosition,
        /// Library name
        library: String,
    },
    /// Docstring panel of one function
    Function {
        /// Owning cell
        cell: CellPosition,
        /// Qualified function name
        name: String,
    },
    /// Argument list of one function
    Arguments {
        /// Owning cell
        cell: CellPosition,
        /// Qualified function name
        name: String,
    },
    /// Cell list of a phase in the sidebar
    SidebarPhase(String),
    /// Function tree of one cell under one phase in the sidebar
    SidebarCellFunctions {
        /// Phase the entry is listed under
        phase: String,
        /// Cell the entry links to
        cell: CellPosition,
    },
}

impl WidgetId {
    /// Library bucket id
    #[must_use]
    pub fn library(cell: CellPosition, library: impl Into<String>) -> Self {
        Self::Library {
            cell,
            library: library.into(),
        }
    }

    /// Function docstring panel id
    #[must_use]
    pub fn function(cell: CellPosition, name: impl Into<String>) -> Self {
        Self::Function {
            cell,
            name: name.into(),
        }
    }

    /// Function argument list id
    #[must_use]
    pub fn arguments(cell: CellPosition, name: impl Into<String>) -> Self {
        Self::Arguments {
            cell,
            name: name.into(),
        }
    }

    /// Sidebar phase bucket id
    #[must_use]
    pub fn sidebar_phase(phase: impl Into<String>) -> Self {
        Self::SidebarPhase(phase.into())
    }

    /// Sidebar per-cell function tree id
    #[must_use]
    pub fn sidebar_cell_functions(phase: impl Into<String>, cell: CellPosition) -> Self {
        Self::SidebarCellFunctions {
            phase: phase.into(),
            cell,
        }
    }

    /// Owning cell, if the widget is part of a cell's inline annotation
    #[must_use]
    pub fn cell(&self) -> Option<CellPosition> {
        match self {
            Self::Header(cell)
            | Self::DetailsToggle(cell)
            | Self::Details(cell)
            | Self::Library { cell, .. }
            | Self::Function { cell, .. }
            | Self::Arguments { cell, .. } => Some(*cell),
            Self::SidebarPhase(_) | Self::SidebarCellFunctions { .. } => None,
        }
    }

    /// Whether the widget lives inside a cell's details container
    #[must_use]
    pub fn is_detail_content(&self) -> bool {
        matches!(
            self,
            Self::Library { .. } | Self::Function { .. } | Self::Arguments { .. }
        )
    }

    /// Whether the widget lives in the sidebar
    #[must_use]
    pub fn is_sidebar(&self) -> bool {
        matches!(
            self,
            Self::SidebarPhase(_) | Self::SidebarCellFunctions { .. }
        )
    }

    /// Document id
    #[must_use]
    pub fn dom_id(&self) -> String {
        self.to_string()
    }

    /// `#id` fragment linking to the widget
    #[must_use]
    pub fn anchor(&self) -> String {
        format!("#{self}")
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(cell) => write!(f, "ml-header-{cell}"),
            Self::DetailsToggle(cell) => write!(f, "view-funcs-{cell}"),
            Self::Details(cell) => write!(f, "funcs-{cell}"),
            Self::Library { cell, library } => write!(f, "lib-{cell}-{library}"),
            Self::Function { cell, name } => write!(f, "func-{cell}-{name}"),
            Self::Arguments { cell, name } => write!(f, "args-{cell}-{name}"),
            Self::SidebarPhase(phase) => write!(f, "sidebar-phase-{phase}"),
            Self::SidebarCellFunctions { phase, cell } => {
                write!(f, "sidebar-funcs-{phase}-{cell}")
            }
        }
    }
}

/// Give `node` the id of `widget`
pub fn assign_id<D: Dom + ?Sized>(dom: &mut D, node: NodeId, widget: &WidgetId) {
    dom.set_id(node, &widget.dom_id());
}

/// Strip ids claimed by the `owners` subtrees from every other node
///
/// The document is walked once for the whole batch. When two owners claim
/// the same id the first one keeps it. Returns how many nodes lost their id.
pub fn release_foreign_ids<D: Dom + ?Sized>(dom: &mut D, owners: &[NodeId]) -> usize {
    let mut claimed: HashMap<String, NodeId> = HashMap::new();
    for &owner in owners {
        for node in dom.subtree(owner) {
            if let Some(id) = dom.id_of(node) {
                claimed.entry(id).or_insert(node);
            }
        }
    }
    if claimed.is_empty() {
        return 0;
    }

    let foreign: Vec<NodeId> = dom
        .subtree(dom.root())
        .into_iter()
        .filter(|&node| {
            dom.id_of(node)
                .and_then(|id| claimed.get(&id))
                .is_some_and(|&claimant| claimant != node)
        })
        .collect();

    for &node in &foreign {
        dom.remove_attribute(node, "id");
    }
    foreign.len()
}
