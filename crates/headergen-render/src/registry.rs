//! Toggle Registry
//!
//! Owns the expanded/collapsed state of every toggleable widget, keyed by
//! document id. State is recorded even when no node carries the id, so a
//! widget rebuilt from scratch picks up where the user left it.
//!
//! Controls name their target through the `data-toggle` attribute and the
//! host forwards clicks to [`ToggleRegistry::dispatch`].

use crate::widget::{WidgetId, TOGGLE_ATTRIBUTE};
use headergen_analysis::CellPosition;
use headergen_dom::{Dom, NodeId};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ToggleEntry {
    widget: WidgetId,
    expanded: bool,
}

/// Expanded/collapsed state per widget
#[derive(Debug, Clone, Default)]
pub struct ToggleRegistry {
    entries: HashMap<String, ToggleEntry>,
}

impl ToggleRegistry {
    /// Empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state, `None` if the widget was never seen
    #[must_use]
    pub fn state(&self, widget: &WidgetId) -> Option<bool> {
        self.entries.get(&widget.dom_id()).map(|e| e.expanded)
    }

    /// Whether the widget is expanded (unseen widgets are collapsed)
    #[inline]
    #[must_use]
    pub fn is_expanded(&self, widget: &WidgetId) -> bool {
        self.state(widget).unwrap_or(false)
    }

    /// Expand a widget
    pub fn show<D: Dom + ?Sized>(&mut self, dom: &mut D, widget: &WidgetId) {
        self.set(dom, widget, true);
    }

    /// Collapse a widget
    pub fn hide<D: Dom + ?Sized>(&mut self, dom: &mut D, widget: &WidgetId) {
        self.set(dom, widget, false);
    }

    /// Flip a widget, returning the new state
    ///
    /// An unseen widget counts as collapsed, so its first toggle expands it.
    pub fn toggle<D: Dom + ?Sized>(&mut self, dom: &mut D, widget: &WidgetId) -> bool {
        let expanded = !self.is_expanded(widget);
        self.set(dom, widget, expanded);
        expanded
    }

    /// Attach `node` to `widget`
    ///
    /// Gives the node the widget's id and applies the recorded state, or
    /// records `default_expanded` for a widget seen for the first time.
    pub fn bind<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        node: NodeId,
        widget: &WidgetId,
        default_expanded: bool,
    ) -> bool {
        let id = widget.dom_id();
        let expanded = self
            .entries
            .entry(id.clone())
            .or_insert_with(|| ToggleEntry {
                widget: widget.clone(),
                expanded: default_expanded,
            })
            .expanded;
        dom.set_id(node, &id);
        dom.set_visible(node, expanded);
        expanded
    }

    /// Handle a click on a control carrying `data-toggle`
    ///
    /// Returns the target's new state, or `None` if the node is not a
    /// control or names a widget the registry has never bound.
    pub fn dispatch<D: Dom + ?Sized>(&mut self, dom: &mut D, control: NodeId) -> Option<bool> {
        let target = dom.attribute(control, TOGGLE_ATTRIBUTE)?;
        let widget = self.entries.get(&target)?.widget.clone();
        let expanded = self.toggle(dom, &widget);
        dom.set_attribute(control, "aria-expanded", if expanded { "true" } else { "false" });
        Some(expanded)
    }

    /// Keep only the widgets for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&WidgetId) -> bool) {
        self.entries.retain(|_, entry| keep(&entry.widget));
    }

    /// Drop every detail-content entry of `cell` not listed in `live`
    pub fn prune_cell_details(&mut self, cell: CellPosition, live: &[WidgetId]) {
        self.retain(|widget| {
            !(widget.is_detail_content() && widget.cell() == Some(cell)) || live.contains(widget)
        });
    }

    /// Drop every entry of `cell` except its header
    pub fn forget_cell_details(&mut self, cell: CellPosition) {
        self.retain(|widget| {
            widget.cell() != Some(cell) || matches!(widget, WidgetId::Header(_))
        });
    }

    /// Number of recorded widgets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded widgets and their state, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&WidgetId, bool)> {
        self.entries.values().map(|e| (&e.widget, e.expanded))
    }

    fn set<D: Dom + ?Sized>(&mut self, dom: &mut D, widget: &WidgetId, expanded: bool) {
        let id = widget.dom_id();
        self.entries
            .entry(id.clone())
            .and_modify(|e| e.expanded = expanded)
            .or_insert_with(|| ToggleEntry {
                widget: widget.clone(),
                expanded,
            });

        if let Some(node) = dom.element_by_id(&id) {
            dom.set_visible(node, expanded);
        } else {
            trace!(widget = %id, expanded, "toggle target not in document");
        }
    }
}
