//! Cell Annotator
//!
//! Injects the phase header and the function details widgets into one cell.
//! The pass is create-or-update: existing widgets are found by class inside
//! the cell, re-keyed to their deterministic ids and updated in place, so
//! running it twice on the same record leaves the tree unchanged.
//!
//! A pass may leave an id on a node outside the cell that this cell now
//! claims (a header that moved). Call [`release_foreign_ids`] once with every
//! annotated header after the batch.
//!
//! [`release_foreign_ids`]: crate::widget::release_foreign_ids
//!
//! ```text
//! div#ml-header-N.ml-phase-container
//! ├── h1.ml-phase-header                 "train | eval"
//! ├── span#view-funcs-N.view-function-calls
//! └── div#funcs-N.function-details
//!     └── ul.nested-list
//!         └── li  h2.library-link + ul#lib-N-torch
//!             └── li  span.function-link
//!                     div#func-N-torch.nn.Linear.function-doc
//!                     ul#args-N-torch.nn.Linear.function-arguments
//! ```

use crate::registry::ToggleRegistry;
use crate::toolbar::Toolbar;
use crate::widget::{
    assign_id, WidgetId, DETAILS_CLASS, DETAILS_TOGGLE_CLASS,
    HEADER_CONTAINER_CLASS, HEADER_HEADING_CLASS, HIGHLIGHTED_HEADING_CLASS, TOGGLE_ATTRIBUTE,
};
use headergen_analysis::{
    highlight_headings, merge_argument_sets, CellPosition, CellRecord, DocSegment,
    FunctionDetail, LibraryGroup,
};
use headergen_dom::{Dom, NodeId};
use tracing::debug;

/// Default separator between phases in a header
pub const DEFAULT_PHASE_SEPARATOR: &str = " | ";

const DETAILS_TOGGLE_TEXT: &str = "View Function Calls";

/// What one annotation pass did to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    /// Header container of the cell
    pub header: NodeId,
    /// Whether the header was created by this pass
    pub created: bool,
    /// Number of functions rendered in the details container
    pub functions: usize,
}

/// Renders per-cell annotation widgets
#[derive(Debug, Clone)]
pub struct CellAnnotator {
    phase_separator: String,
}

impl Default for CellAnnotator {
    fn default() -> Self {
        Self {
            phase_separator: DEFAULT_PHASE_SEPARATOR.to_string(),
        }
    }
}

impl CellAnnotator {
    /// Annotator joining phases with `" | "`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the phase separator
    #[inline]
    #[must_use]
    pub fn with_phase_separator(mut self, separator: impl Into<String>) -> Self {
        self.phase_separator = separator.into();
        self
    }

    /// Header text for a record
    #[must_use]
    pub fn header_text(&self, record: &CellRecord) -> String {
        record.phases.join(self.phase_separator.as_str())
    }

    /// Annotate one cell
    ///
    /// `groups` are the cell's functions grouped by library, as held by the
    /// run's `FunctionIndex`. An empty slice removes the details widgets.
    pub fn annotate<D: Dom + ?Sized>(
        &self,
        dom: &mut D,
        registry: &mut ToggleRegistry,
        position: CellPosition,
        record: &CellRecord,
        groups: &[LibraryGroup<'_>],
        cell_root: NodeId,
    ) -> Annotation {
        let (header, created) = self.ensure_header(dom, position, record, cell_root);

        let functions = if groups.is_empty() {
            remove_details(dom, registry, position, header);
            0
        } else {
            render_details(dom, registry, position, groups, header);
            groups.iter().map(LibraryGroup::len).sum()
        };

        debug!(cell = %position, created, functions, "cell annotated");

        Annotation {
            header,
            created,
            functions,
        }
    }

    fn ensure_header<D: Dom + ?Sized>(
        &self,
        dom: &mut D,
        position: CellPosition,
        record: &CellRecord,
        cell_root: NodeId,
    ) -> (NodeId, bool) {
        let text = self.header_text(record);
        let mut existing = dom
            .find_all_by_class(cell_root, HEADER_CONTAINER_CLASS)
            .into_iter();

        let (header, created) = if let Some(header) = existing.next() {
            for duplicate in existing {
                dom.remove(duplicate);
            }
            (header, false)
        } else {
            let header = dom.build("div", Some(HEADER_CONTAINER_CLASS), None);
            dom.prepend_child(cell_root, header);
            (header, true)
        };
        assign_id(dom, header, &WidgetId::Header(position));

        let shown = Toolbar::headers_shown(dom);
        if dom.is_visible(header) != shown {
            dom.set_visible(header, shown);
        }

        let heading = child_with_class(dom, header, HEADER_HEADING_CLASS).unwrap_or_else(|| {
            let heading = dom.build("h1", Some(HEADER_HEADING_CLASS), None);
            dom.prepend_child(header, heading);
            heading
        });
        if dom.text_content(heading) != text {
            dom.set_text(heading, &text);
        }

        (header, created)
    }
}

fn render_details<D: Dom + ?Sized>(
    dom: &mut D,
    registry: &mut ToggleRegistry,
    position: CellPosition,
    groups: &[LibraryGroup<'_>],
    header: NodeId,
) {
    let details_id = WidgetId::Details(position);

    let control = child_with_class(dom, header, DETAILS_TOGGLE_CLASS).unwrap_or_else(|| {
        let control = dom.build("span", Some(DETAILS_TOGGLE_CLASS), Some(DETAILS_TOGGLE_TEXT));
        dom.append_child(header, control);
        control
    });
    assign_id(dom, control, &WidgetId::DetailsToggle(position));
    dom.set_attribute(control, TOGGLE_ATTRIBUTE, &details_id.dom_id());

    let container = child_with_class(dom, header, DETAILS_CLASS).unwrap_or_else(|| {
        let container = dom.build("div", Some(DETAILS_CLASS), None);
        dom.append_child(header, container);
        container
    });
    registry.bind(dom, container, &details_id, true);

    dom.clear_children(container);
    let mut live = Vec::new();
    let list = dom.build("ul", Some("nested-list"), None);
    for group in groups {
        let item = library_item(dom, registry, position, group, &mut live);
        dom.append_child(list, item);
    }
    dom.append_child(container, list);

    registry.prune_cell_details(position, &live);
}

fn library_item<D: Dom + ?Sized>(
    dom: &mut D,
    registry: &mut ToggleRegistry,
    position: CellPosition,
    group: &LibraryGroup<'_>,
    live: &mut Vec<WidgetId>,
) -> NodeId {
    let library_id = WidgetId::library(position, group.library);
    let item = dom.build("li", None, None);

    let label = dom.build("h2", Some("library-link"), Some(group.library));
    dom.set_attribute(label, TOGGLE_ATTRIBUTE, &library_id.dom_id());
    dom.append_child(item, label);

    let functions = dom.build("ul", Some("nested-list-1"), None);
    registry.bind(dom, functions, &library_id, false);
    for &(name, detail) in &group.functions {
        let function = function_item(dom, registry, position, name, detail, live);
        dom.append_child(functions, function);
    }
    dom.append_child(item, functions);

    live.push(library_id);
    item
}

fn function_item<D: Dom + ?Sized>(
    dom: &mut D,
    registry: &mut ToggleRegistry,
    position: CellPosition,
    name: &str,
    detail: &FunctionDetail,
    live: &mut Vec<WidgetId>,
) -> NodeId {
    let function_id = WidgetId::function(position, name);
    let item = dom.build("li", None, None);

    let link = dom.build("span", Some("function-link"), Some(name));
    dom.set_attribute(link, TOGGLE_ATTRIBUTE, &function_id.dom_id());
    dom.append_child(item, link);

    let doc = dom.build("div", Some("function-doc"), None);
    for segment in highlight_headings(&detail.docstring) {
        let node = match segment {
            DocSegment::Heading(text) => {
                dom.build("span", Some(HIGHLIGHTED_HEADING_CLASS), Some(&text))
            }
            DocSegment::Text(text) => dom.create_text(&text),
        };
        dom.append_child(doc, node);
    }
    registry.bind(dom, doc, &function_id, false);
    dom.append_child(item, doc);
    live.push(function_id);

    let merged = merge_argument_sets(&detail.argument_sets);
    if !merged.is_empty() {
        let arguments_id = WidgetId::arguments(position, name);
        let list = dom.build("ul", Some("function-arguments"), None);

        if let Some(args) = merged.args_line() {
            let row = argument_row(dom, "args", "Args:", &args);
            dom.append_child(list, row);
        }
        if !merged.keyword.is_empty() {
            let kwargs = merged
                .keyword
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            let row = argument_row(dom, "kwargs", "Kwargs:", &kwargs);
            dom.append_child(list, row);
        }

        registry.bind(dom, list, &arguments_id, true);
        dom.append_child(item, list);
        live.push(arguments_id);
    }

    item
}

fn argument_row<D: Dom + ?Sized>(dom: &mut D, kind: &str, label: &str, content: &str) -> NodeId {
    let row = dom.build("li", None, None);
    let label = dom.build("strong", Some(&format!("{kind}-label")), Some(label));
    let content = dom.build("span", Some(&format!("{kind}-content")), Some(content));
    dom.append_child(row, label);
    dom.append_child(row, content);
    row
}

fn remove_details<D: Dom + ?Sized>(
    dom: &mut D,
    registry: &mut ToggleRegistry,
    position: CellPosition,
    header: NodeId,
) {
    for class in [DETAILS_TOGGLE_CLASS, DETAILS_CLASS] {
        while let Some(node) = child_with_class(dom, header, class) {
            dom.remove(node);
        }
    }
    registry.forget_cell_details(position);
}

fn child_with_class<D: Dom + ?Sized>(dom: &D, parent: NodeId, class: &str) -> Option<NodeId> {
    dom.children(parent)
        .into_iter()
        .find(|&child| dom.has_class(child, class))
}
