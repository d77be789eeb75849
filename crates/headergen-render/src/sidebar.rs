//! Sidebar index of ML phases
//!
//! The sidebar content is thrown away and rebuilt on every run. Toggle state
//! of its collapsible parts lives in the [`ToggleRegistry`], so a rebuilt
//! phase bucket opens exactly as the user left it.

use crate::registry::ToggleRegistry;
use crate::widget::{release_foreign_ids, WidgetId, TOGGLE_ATTRIBUTE};
use headergen_analysis::{AnalysisIndex, CellPosition, FunctionIndex};
use headergen_dom::{Dom, NodeId};
use tracing::debug;

/// Fixed id of the sidebar element
pub const SIDEBAR_ID: &str = "headergen-sidebar";
/// Base class of the sidebar element
pub const SIDEBAR_CLASS: &str = "sidebar";
/// Class of an open sidebar
pub const SIDEBAR_OPEN_CLASS: &str = "sidebar-open";
/// Class of a closed sidebar
pub const SIDEBAR_CLOSED_CLASS: &str = "sidebar-closed";
/// Default sidebar title
pub const DEFAULT_TITLE: &str = "Index of ML Operations";

/// Renders the phase → cell → function tree
#[derive(Debug, Clone)]
pub struct SidebarRenderer {
    title: String,
}

impl Default for SidebarRenderer {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl SidebarRenderer {
    /// Renderer with the default title
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the sidebar title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Find the sidebar element, creating it closed at the end of the page
    pub fn ensure_container<D: Dom + ?Sized>(dom: &mut D) -> NodeId {
        if let Some(sidebar) = dom.element_by_id(SIDEBAR_ID) {
            return sidebar;
        }
        let root = dom.root();
        let sidebar = dom.build(
            "div",
            Some(&format!("{SIDEBAR_CLASS} {SIDEBAR_CLOSED_CLASS}")),
            None,
        );
        dom.set_id(sidebar, SIDEBAR_ID);
        dom.append_child(root, sidebar);
        sidebar
    }

    /// Whether the sidebar exists and is open
    #[must_use]
    pub fn is_open<D: Dom + ?Sized>(dom: &D) -> bool {
        dom.element_by_id(SIDEBAR_ID)
            .is_some_and(|sidebar| dom.has_class(sidebar, SIDEBAR_OPEN_CLASS))
    }

    /// Open or close the sidebar, creating it if needed
    pub fn set_open<D: Dom + ?Sized>(dom: &mut D, open: bool) {
        let sidebar = Self::ensure_container(dom);
        let (add, drop) = if open {
            (SIDEBAR_OPEN_CLASS, SIDEBAR_CLOSED_CLASS)
        } else {
            (SIDEBAR_CLOSED_CLASS, SIDEBAR_OPEN_CLASS)
        };
        dom.remove_class(sidebar, drop);
        dom.add_class(sidebar, add);
    }

    /// Replace the sidebar content
    ///
    /// Phases appear in index order, cells ascending within a phase. Toggle
    /// entries for sidebar widgets that were not rendered this time are
    /// dropped from the registry.
    pub fn render<D: Dom + ?Sized>(
        &self,
        dom: &mut D,
        registry: &mut ToggleRegistry,
        index: &AnalysisIndex<'_>,
    ) -> NodeId {
        let sidebar = Self::ensure_container(dom);
        dom.clear_children(sidebar);

        let content = dom.build("div", Some("sidebar-content"), None);
        let header = dom.build("div", Some("sidebar-header"), None);
        let title = dom.build("h3", None, Some(&self.title));
        dom.append_child(header, title);
        dom.append_child(content, header);

        let list = dom.build("ul", Some("phase-list"), None);
        let mut rendered = Vec::new();

        for (phase, cells) in index.phases.iter() {
            let item = dom.build("li", Some("phase-item"), None);
            let bucket = WidgetId::sidebar_phase(phase);

            let phase_header = dom.build("div", Some("collapsible-header"), None);
            dom.set_attribute(phase_header, TOGGLE_ATTRIBUTE, &bucket.dom_id());
            let name = dom.build("strong", None, Some(phase));
            dom.append_child(phase_header, name);
            dom.append_child(item, phase_header);

            let cell_list = dom.build("ul", Some("collapsible-content"), None);
            registry.bind(dom, cell_list, &bucket, false);
            for &cell in cells {
                let entry =
                    Self::cell_entry(dom, registry, phase, cell, &index.functions, &mut rendered);
                dom.append_child(cell_list, entry);
            }
            dom.append_child(item, cell_list);
            dom.append_child(list, item);
            rendered.push(bucket);
        }

        dom.append_child(content, list);
        dom.append_child(sidebar, content);
        release_foreign_ids(dom, &[sidebar]);

        registry.retain(|widget| !widget.is_sidebar() || rendered.contains(widget));
        debug!(phases = index.phases.len(), "sidebar rendered");
        sidebar
    }

    fn cell_entry<D: Dom + ?Sized>(
        dom: &mut D,
        registry: &mut ToggleRegistry,
        phase: &str,
        cell: CellPosition,
        functions: &FunctionIndex<'_>,
        rendered: &mut Vec<WidgetId>,
    ) -> NodeId {
        let entry = dom.build("li", Some("cell-container"), None);
        let link = dom.build("a", None, Some(&format!("Go to Cell {cell}")));
        dom.set_attribute(link, "href", &WidgetId::Header(cell).anchor());
        dom.append_child(entry, link);

        let groups = functions.groups(cell);
        if groups.is_empty() {
            return entry;
        }

        let tree_id = WidgetId::sidebar_cell_functions(phase, cell);
        let wrapper = dom.build("div", Some("view-functions"), None);

        let count = functions.function_count(cell);
        let noun = if count == 1 { "function" } else { "functions" };
        let summary = dom.build(
            "div",
            Some("details-summary"),
            Some(&format!("View Function Calls ({count} {noun})")),
        );
        dom.set_attribute(summary, TOGGLE_ATTRIBUTE, &tree_id.dom_id());
        dom.append_child(wrapper, summary);

        let libraries = dom.build("ul", Some("nested-list"), None);
        registry.bind(dom, libraries, &tree_id, false);
        for group in groups {
            let library = dom.build("li", None, None);
            let label = dom.build("strong", None, Some(group.library));
            dom.append_child(library, label);

            let functions = dom.build("ul", None, None);
            for &(name, _) in &group.functions {
                let item = dom.build("li", None, None);
                let span = dom.build("span", Some("function-link"), Some(name));
                dom.append_child(item, span);
                dom.append_child(functions, item);
            }
            dom.append_child(library, functions);
            dom.append_child(libraries, library);
        }
        dom.append_child(wrapper, libraries);
        dom.append_child(entry, wrapper);

        rendered.push(tree_id);
        entry
    }
}
