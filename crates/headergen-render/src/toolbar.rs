//! Toolbar chrome
//!
//! Buttons, busy spinner and failure notice. Everything is addressed by a
//! fixed element id, so installing twice is a no-op and no node handle has to
//! be kept between runs.

use crate::sidebar::SidebarRenderer;
use crate::widget::HEADER_CONTAINER_CLASS;
use headergen_dom::{Dom, NodeId};

/// Toolbar element id
pub const TOOLBAR_ID: &str = "headergen-toolbar";
/// "Run Headergen" button id
pub const RUN_BUTTON_ID: &str = "headergen-button";
/// "Hide/Show Headers" button id
pub const HEADERS_TOGGLE_ID: &str = "toggle-all-headers";
/// "Hide/Show Sidebar" button id
pub const SIDEBAR_TOGGLE_ID: &str = "toggle-sidebar";
/// Busy spinner id
pub const SPINNER_ID: &str = "headergen-spinner";
/// Failure notice id
pub const STATUS_ID: &str = "headergen-status";

const RUN_LABEL: &str = "Run Headergen";
const HIDE_HEADERS: &str = "Hide Headers";
const SHOW_HEADERS: &str = "Show Headers";
const HIDE_SIDEBAR: &str = "Hide Sidebar";
const SHOW_SIDEBAR: &str = "Show Sidebar";

/// What a click on a toolbar button asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    /// Start an analysis run
    Run,
    /// Headers were shown (`true`) or hidden (`false`)
    HeadersToggled(bool),
    /// Sidebar was opened (`true`) or closed (`false`)
    SidebarToggled(bool),
}

/// Toolbar operations on a document
#[derive(Debug, Clone, Copy, Default)]
pub struct Toolbar;

impl Toolbar {
    /// Create the toolbar, spinner and status elements that are missing
    pub fn install<D: Dom + ?Sized>(dom: &mut D) {
        let root = dom.root();

        let toolbar = if let Some(toolbar) = dom.element_by_id(TOOLBAR_ID) {
            toolbar
        } else {
            let toolbar = dom.build("div", Some("container toolbar"), None);
            dom.set_id(toolbar, TOOLBAR_ID);
            dom.prepend_child(root, toolbar);
            toolbar
        };

        ensure_button(dom, toolbar, RUN_BUTTON_ID, RUN_LABEL, "btn btn-primary", true);
        ensure_button(dom, toolbar, HEADERS_TOGGLE_ID, HIDE_HEADERS, "btn btn-secondary", false);
        ensure_button(dom, toolbar, SIDEBAR_TOGGLE_ID, HIDE_SIDEBAR, "btn btn-secondary", false);

        if dom.element_by_id(SPINNER_ID).is_none() {
            let spinner = dom.build("div", Some("headergen-spinner"), None);
            dom.set_id(spinner, SPINNER_ID);
            dom.set_visible(spinner, false);
            dom.append_child(root, spinner);
        }

        if dom.element_by_id(STATUS_ID).is_none() {
            let status = dom.build("div", Some("headergen-status"), None);
            dom.set_id(status, STATUS_ID);
            dom.set_attribute(status, "role", "status");
            dom.set_visible(status, false);
            dom.append_child(toolbar, status);
        }
    }

    /// Disable the trigger and show the spinner, or the reverse
    pub fn set_busy<D: Dom + ?Sized>(dom: &mut D, busy: bool) {
        if let Some(button) = dom.element_by_id(RUN_BUTTON_ID) {
            if busy {
                dom.set_attribute(button, "disabled", "disabled");
            } else {
                dom.remove_attribute(button, "disabled");
            }
        }
        if let Some(spinner) = dom.element_by_id(SPINNER_ID) {
            dom.set_visible(spinner, busy);
        }
    }

    /// Whether the trigger is currently disabled
    #[must_use]
    pub fn is_busy<D: Dom + ?Sized>(dom: &D) -> bool {
        dom.element_by_id(RUN_BUTTON_ID)
            .is_some_and(|button| dom.attribute(button, "disabled").is_some())
    }

    /// Make the headers and sidebar toggles visible
    pub fn reveal_toggles<D: Dom + ?Sized>(dom: &mut D) {
        for id in [HEADERS_TOGGLE_ID, SIDEBAR_TOGGLE_ID] {
            if let Some(button) = dom.element_by_id(id) {
                dom.set_visible(button, true);
            }
        }
    }

    /// Whether phase headers are currently shown
    ///
    /// The button label is the source of truth: "Hide Headers" means the
    /// headers are currently shown. Without a toolbar headers are shown.
    #[must_use]
    pub fn headers_shown<D: Dom + ?Sized>(dom: &D) -> bool {
        dom.element_by_id(HEADERS_TOGGLE_ID)
            .map_or(true, |button| dom.text_content(button) != SHOW_HEADERS)
    }

    /// Flip the visibility of every phase header, returning the new state
    ///
    /// Headers rendered later follow the new state through [`Self::headers_shown`].
    pub fn toggle_all_headers<D: Dom + ?Sized>(dom: &mut D) -> bool {
        let show = !Self::headers_shown(dom);
        let button = dom.element_by_id(HEADERS_TOGGLE_ID);

        let root = dom.root();
        for header in dom.find_all_by_class(root, HEADER_CONTAINER_CLASS) {
            dom.set_visible(header, show);
        }
        if let Some(button) = button {
            dom.set_text(button, if show { HIDE_HEADERS } else { SHOW_HEADERS });
        }
        show
    }

    /// Open or close the sidebar, returning whether it is now open
    pub fn toggle_sidebar<D: Dom + ?Sized>(dom: &mut D) -> bool {
        let open = !SidebarRenderer::is_open(dom);
        Self::set_sidebar(dom, open);
        open
    }

    /// Open the sidebar
    pub fn open_sidebar<D: Dom + ?Sized>(dom: &mut D) {
        Self::set_sidebar(dom, true);
    }

    /// Show a failure notice
    pub fn show_failure<D: Dom + ?Sized>(dom: &mut D, message: &str) {
        if let Some(status) = dom.element_by_id(STATUS_ID) {
            dom.set_text(status, &format!("Analysis failed: {message}"));
            dom.set_visible(status, true);
        }
    }

    /// Hide and empty the failure notice
    pub fn clear_failure<D: Dom + ?Sized>(dom: &mut D) {
        if let Some(status) = dom.element_by_id(STATUS_ID) {
            dom.clear_children(status);
            dom.set_visible(status, false);
        }
    }

    /// Text of the failure notice, if one is shown
    #[must_use]
    pub fn failure_notice<D: Dom + ?Sized>(dom: &D) -> Option<String> {
        dom.element_by_id(STATUS_ID)
            .filter(|&status| dom.is_visible(status))
            .map(|status| dom.text_content(status))
    }

    /// Handle a click on a toolbar button
    ///
    /// Returns `None` for nodes that are not toolbar buttons and for clicks
    /// on a disabled trigger.
    pub fn handle_click<D: Dom + ?Sized>(dom: &mut D, node: NodeId) -> Option<ToolbarAction> {
        match dom.id_of(node)?.as_str() {
            RUN_BUTTON_ID if dom.attribute(node, "disabled").is_none() => Some(ToolbarAction::Run),
            HEADERS_TOGGLE_ID => Some(ToolbarAction::HeadersToggled(Self::toggle_all_headers(dom))),
            SIDEBAR_TOGGLE_ID => Some(ToolbarAction::SidebarToggled(Self::toggle_sidebar(dom))),
            _ => None,
        }
    }

    fn set_sidebar<D: Dom + ?Sized>(dom: &mut D, open: bool) {
        SidebarRenderer::set_open(dom, open);
        if let Some(button) = dom.element_by_id(SIDEBAR_TOGGLE_ID) {
            dom.set_text(button, if open { HIDE_SIDEBAR } else { SHOW_SIDEBAR });
        }
    }
}

fn ensure_button<D: Dom + ?Sized>(
    dom: &mut D,
    toolbar: NodeId,
    id: &str,
    label: &str,
    class: &str,
    visible: bool,
) {
    if dom.element_by_id(id).is_some() {
        return;
    }
    let button = dom.build("button", Some(class), Some(label));
    dom.set_id(button, id);
    dom.set_visible(button, visible);
    dom.append_child(toolbar, button);
}

#[cfg(test)]
mod tests {
    use super::*;
    use headergen_dom::MemoryDom;
    use pretty_assertions::assert_eq;

    fn installed() -> MemoryDom {
        let mut dom = MemoryDom::new();
        Toolbar::install(&mut dom);
        dom
    }

    #[test]
    fn install_is_idempotent() {
        let mut dom = installed();
        let html = dom.document_html();
        let nodes = dom.live_nodes();
        Toolbar::install(&mut dom);
        assert_eq!(dom.document_html(), html);
        assert_eq!(dom.live_nodes(), nodes);

        let run = dom.element_by_id(RUN_BUTTON_ID).unwrap();
        assert_eq!(dom.text_content(run), "Run Headergen");
        assert!(dom.is_visible(run));
        assert!(!dom.is_visible(dom.element_by_id(HEADERS_TOGGLE_ID).unwrap()));
        assert!(!dom.is_visible(dom.element_by_id(SIDEBAR_TOGGLE_ID).unwrap()));
    }

    #[test]
    fn busy_disables_trigger_and_shows_spinner() {
        let mut dom = installed();
        Toolbar::set_busy(&mut dom, true);
        assert!(Toolbar::is_busy(&dom));
        assert!(dom.is_visible(dom.element_by_id(SPINNER_ID).unwrap()));

        let run = dom.element_by_id(RUN_BUTTON_ID).unwrap();
        assert_eq!(Toolbar::handle_click(&mut dom, run), None);

        Toolbar::set_busy(&mut dom, false);
        assert!(!Toolbar::is_busy(&dom));
        assert!(!dom.is_visible(dom.element_by_id(SPINNER_ID).unwrap()));
        assert_eq!(Toolbar::handle_click(&mut dom, run), Some(ToolbarAction::Run));
    }

    #[test]
    fn headers_toggle_flips_every_header() {
        let mut dom = installed();
        let root = dom.root();
        let headers: Vec<NodeId> = (0..2)
            .map(|_| {
                let header = dom.build("div", Some(HEADER_CONTAINER_CLASS), None);
                dom.append_child(root, header);
                header
            })
            .collect();

        let button = dom.element_by_id(HEADERS_TOGGLE_ID).unwrap();
        assert_eq!(
            Toolbar::handle_click(&mut dom, button),
            Some(ToolbarAction::HeadersToggled(false))
        );
        assert!(headers.iter().all(|&h| !dom.is_visible(h)));
        assert_eq!(dom.text_content(button), "Show Headers");

        assert!(!Toolbar::headers_shown(&dom));

        assert!(Toolbar::toggle_all_headers(&mut dom));
        assert!(headers.iter().all(|&h| dom.is_visible(h)));
        assert_eq!(dom.text_content(button), "Hide Headers");
        assert!(Toolbar::headers_shown(&dom));
    }

    #[test]
    fn headers_are_shown_without_a_toolbar() {
        assert!(Toolbar::headers_shown(&MemoryDom::new()));
    }

    #[test]
    fn sidebar_toggle_updates_label() {
        let mut dom = installed();
        Toolbar::reveal_toggles(&mut dom);
        Toolbar::open_sidebar(&mut dom);
        let button = dom.element_by_id(SIDEBAR_TOGGLE_ID).unwrap();
        assert!(dom.is_visible(button));
        assert_eq!(dom.text_content(button), "Hide Sidebar");

        assert!(!Toolbar::toggle_sidebar(&mut dom));
        assert_eq!(dom.text_content(button), "Show Sidebar");
        assert!(!SidebarRenderer::is_open(&dom));
    }

    #[test]
    fn failure_notice_round_trip() {
        let mut dom = installed();
        assert_eq!(Toolbar::failure_notice(&dom), None);

        Toolbar::show_failure(&mut dom, "server returned 500");
        assert_eq!(
            Toolbar::failure_notice(&dom).as_deref(),
            Some("Analysis failed: server returned 500")
        );

        Toolbar::clear_failure(&mut dom);
        assert_eq!(Toolbar::failure_notice(&dom), None);
    }
}
