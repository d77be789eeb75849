//! Analysis run orchestration
//!
//! One run: serialize the notebook, submit it, render the sidebar, annotate
//! every analyzed cell, reveal the toggles. Runs never fail from the caller's
//! point of view; every outcome is a [`RunOutcome`].
//!
//! The only suspension point is the service round-trip. No lock is held
//! across it, and the state machine doubles as the reentrancy guard: a run
//! requested while another is in flight is rejected immediately.
//!
//! A run future dropped mid-flight (timeout, `select!`, task abort) still
//! returns the state machine to idle. The busy chrome it left behind is
//! cleared by the next click or install.

use crate::config::HeadergenConfig;
use crate::error::{HeadergenError, Result};
use crate::state::{validate_transition, RunState};
use chrono::{DateTime, Utc};
use headergen_analysis::{AnalysisPayload, CellPosition, PayloadError};
use headergen_dom::{CellHandle, Dom, NodeId, NotebookHost};
use headergen_render::{
    release_foreign_ids, CellAnnotator, SidebarRenderer, ToggleRegistry, Toolbar, ToolbarAction,
    WidgetId,
};
use headergen_service::{AnalysisService, HttpAnalysisService};
use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use ulid::Ulid;

/// Statistics of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Run identifier, also recorded on the tracing span
    pub run_id: Ulid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Cells that received an annotation
    pub cells_annotated: usize,
    /// Distinct phases in the sidebar
    pub phases: usize,
    /// Function calls rendered across all annotated cells
    pub functions: usize,
    /// Parts of the response that were dropped
    pub payload_issues: Vec<PayloadError>,
}

/// Details of a failed run
#[derive(Debug)]
pub struct RunFailure {
    /// Run identifier
    pub run_id: Ulid,
    /// What went wrong
    pub error: HeadergenError,
}

/// Result of requesting a run
#[derive(Debug)]
pub enum RunOutcome {
    /// Payload applied
    Succeeded(RunSummary),
    /// Nothing applied, previous annotations left as they were
    Failed(RunFailure),
    /// Another run was in flight
    Rejected,
}

impl RunOutcome {
    /// Whether the payload was applied
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Whether the request bounced off the reentrancy guard
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Summary of a successful run
    #[must_use]
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Succeeded(summary) => Some(summary),
            _ => None,
        }
    }

    /// Error of a failed run
    #[must_use]
    pub fn error(&self) -> Option<&HeadergenError> {
        match self {
            Self::Failed(failure) => Some(&failure.error),
            _ => None,
        }
    }
}

/// What a forwarded click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickEffect {
    /// The trigger was clicked; the host should start a run
    RunRequested,
    /// A toolbar toggle was clicked
    Toolbar(ToolbarAction),
    /// A collapsible widget was expanded (`true`) or collapsed (`false`)
    Widget(bool),
}

/// Drives analysis runs against a notebook host
pub struct Orchestrator<S> {
    service: S,
    config: HeadergenConfig,
    annotator: CellAnnotator,
    sidebar: SidebarRenderer,
    state: Mutex<RunState>,
    registry: Mutex<ToggleRegistry>,
    last_summary: Mutex<Option<RunSummary>>,
}

impl<S> std::fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .field("widgets", &self.registry.lock().len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator<HttpAnalysisService> {
    /// Orchestrator talking to the configured HTTP server
    ///
    /// # Errors
    /// Returns a configuration error if `config` is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: HeadergenConfig) -> Result<Self> {
        config.validate()?;
        let service = HttpAnalysisService::new(&config.service_config())?;
        Ok(Self::new(service, config))
    }
}

impl<S: AnalysisService> Orchestrator<S> {
    /// Orchestrator over any analysis service
    #[must_use]
    pub fn new(service: S, config: HeadergenConfig) -> Self {
        let annotator = CellAnnotator::new().with_phase_separator(config.phase_separator.clone());
        Self {
            service,
            config,
            annotator,
            sidebar: SidebarRenderer::new(),
            state: Mutex::new(RunState::Idle),
            registry: Mutex::new(ToggleRegistry::new()),
            last_summary: Mutex::new(None),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HeadergenConfig {
        &self.config
    }

    /// Current run state
    #[inline]
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Whether a run is in flight
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state().is_busy()
    }

    /// Recorded toggle state of a widget
    #[must_use]
    pub fn toggle_state(&self, widget: &WidgetId) -> Option<bool> {
        self.registry.lock().state(widget)
    }

    /// Summary of the last successful run
    #[must_use]
    pub fn last_summary(&self) -> Option<RunSummary> {
        self.last_summary.lock().clone()
    }

    /// Install the toolbar chrome on the host page
    pub fn install<H: NotebookHost>(&self, host: &mut H) {
        Toolbar::install(host.dom_mut());
        self.clear_stale_busy(host.dom_mut());
    }

    /// Route a click on `node`
    ///
    /// Toolbar buttons are handled first, then any control carrying
    /// `data-toggle`. Returns `None` for clicks the engine does not own.
    pub fn handle_click<D: Dom + ?Sized>(&self, dom: &mut D, node: NodeId) -> Option<ClickEffect> {
        self.clear_stale_busy(dom);
        if let Some(action) = Toolbar::handle_click(dom, node) {
            return Some(match action {
                ToolbarAction::Run => ClickEffect::RunRequested,
                other => ClickEffect::Toolbar(other),
            });
        }
        self.registry.lock().dispatch(dom, node).map(ClickEffect::Widget)
    }

    /// Run one analysis end to end
    pub async fn run<H: NotebookHost>(&self, host: &mut H) -> RunOutcome {
        if let Err(e) = self.transition(RunState::Running) {
            warn!(state = %self.state(), error = %e, "analysis run rejected");
            return RunOutcome::Rejected;
        }

        let _guard = RunGuard { state: &self.state };

        let run_id = Ulid::new();
        let span = info_span!("analysis_run", run_id = %run_id);
        self.run_inner(host, run_id).instrument(span).await
    }

    /// Re-enable a trigger left disabled by a run that never finished
    fn clear_stale_busy<D: Dom + ?Sized>(&self, dom: &mut D) {
        if !self.is_running() && Toolbar::is_busy(dom) {
            debug!("clearing busy chrome of an abandoned run");
            Toolbar::set_busy(dom, false);
        }
    }

    async fn run_inner<H: NotebookHost>(&self, host: &mut H, run_id: Ulid) -> RunOutcome {
        let started_at = Utc::now();
        Toolbar::install(host.dom_mut());
        Toolbar::set_busy(host.dom_mut(), true);

        let snapshot = host.serialize();
        let file_name = host.current_path();
        info!(file_name = %file_name, "analysis run started");

        let response = self.service.submit(&snapshot, &file_name).await;

        let outcome = match response {
            Ok(parsed) => {
                for issue in &parsed.issues {
                    warn!(issue = %issue, "dropped part of analysis response");
                }
                let (cells_annotated, phases, functions) = self.apply(host, &parsed.payload);

                Toolbar::clear_failure(host.dom_mut());
                Toolbar::reveal_toggles(host.dom_mut());
                if self.config.open_sidebar_after_run {
                    Toolbar::open_sidebar(host.dom_mut());
                }

                let summary = RunSummary {
                    run_id,
                    started_at,
                    finished_at: Utc::now(),
                    cells_annotated,
                    phases,
                    functions,
                    payload_issues: parsed.issues,
                };
                self.finish(RunState::Succeeded);
                info!(cells_annotated, phases, functions, "analysis run succeeded");
                *self.last_summary.lock() = Some(summary.clone());
                RunOutcome::Succeeded(summary)
            }
            Err(e) => {
                let error = HeadergenError::from(e);
                warn!(error = %error, retryable = error.is_retryable(), "analysis run failed");
                if self.config.surface_failures {
                    Toolbar::show_failure(host.dom_mut(), &error.summary());
                }
                self.finish(RunState::Failed);
                RunOutcome::Failed(RunFailure { run_id, error })
            }
        };

        Toolbar::set_busy(host.dom_mut(), false);
        outcome
    }

    /// Render the sidebar then annotate every analyzed cell, in notebook order
    fn apply<H: NotebookHost>(&self, host: &mut H, payload: &AnalysisPayload) -> (usize, usize, usize) {
        let index = payload.index();
        let cells: Vec<CellHandle> = host.cells();
        let dom = host.dom_mut();
        let mut registry = self.registry.lock();

        self.sidebar.render(dom, &mut registry, &index);

        let mut headers = Vec::new();
        let mut functions = 0;
        for cell in cells {
            let Some(position) = CellPosition::from_index(cell.index()) else {
                continue;
            };
            let Some(record) = payload.record(position) else {
                continue;
            };
            let annotation = self.annotator.annotate(
                dom,
                &mut registry,
                position,
                record,
                index.functions.groups(position),
                cell.dom_root(),
            );
            headers.push(annotation.header);
            functions += annotation.functions;
        }

        let released = release_foreign_ids(dom, &headers);
        if released > 0 {
            debug!(released, "ids taken over from moved headers");
        }

        let annotated = headers.len();
        let unmatched = payload.len() - annotated;
        if unmatched > 0 {
            debug!(unmatched, "payload names cells the notebook no longer has");
        }
        (annotated, index.phases.len(), functions)
    }

    fn finish(&self, to: RunState) {
        if let Err(e) = self.transition(to) {
            error!(error = %e, "run state machine out of sync");
        }
    }

    fn transition(&self, to: RunState) -> Result<()> {
        let mut state = self.state.lock();
        validate_transition(*state, to)?;
        debug!(from = %*state, to = %to, "run state transition");
        *state = to;
        Ok(())
    }
}

/// Returns the state machine to idle when a run ends, however it ends
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if *state == RunState::Running {
            warn!("analysis run abandoned before completion");
            *state = RunState::Failed;
        }
        if let Err(e) = validate_transition(*state, RunState::Idle) {
            error!(error = %e, "run state machine out of sync");
        }
        debug!(from = %*state, to = %RunState::Idle, "run state transition");
        *state = RunState::Idle;
    }
}
