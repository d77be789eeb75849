//! Analysis runs against an in-memory notebook page

use std::sync::Arc;

use async_trait::async_trait;
use headergen_analysis::{AnalysisPayload, CellRecord, ParsedPayload};
use headergen_core::{ClickEffect, HeadergenConfig, HeadergenError, Orchestrator, RunState};
use headergen_dom::{Dom, MemoryNotebook, NotebookHost};
use headergen_render::toolbar::{HEADERS_TOGGLE_ID, RUN_BUTTON_ID, SIDEBAR_TOGGLE_ID, SPINNER_ID};
use headergen_render::{SidebarRenderer, Toolbar, ToolbarAction, WidgetId};
use headergen_service::{AnalysisService, ServiceError};
use headergen_test_utils::{
    cell, header_only_payload, linear_payload, notebook_with_cells, pipeline_payload,
    FailingService, GatedService, StaticAnalysisService,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn orchestrator<S: AnalysisService>(service: S) -> Orchestrator<S> {
    Orchestrator::new(service, HeadergenConfig::default())
}

fn heading(notebook: &MemoryNotebook, id: &str) -> String {
    let dom = notebook.dom();
    let header = dom.element_by_id(id).unwrap();
    dom.text_content(dom.find_by_class(header, "ml-phase-header").unwrap())
}

fn headers(notebook: &MemoryNotebook) -> usize {
    let dom = notebook.dom();
    dom.find_all_by_class(dom.root(), "ml-phase-container").len()
}

#[tokio::test]
async fn header_only_cell_gets_no_details() {
    let orchestrator = orchestrator(StaticAnalysisService::new(header_only_payload()));
    let mut notebook = notebook_with_cells(2);

    let outcome = orchestrator.run(&mut notebook).await;

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.cells_annotated, 1);
    assert_eq!(summary.functions, 0);
    assert_eq!(heading(&notebook, "ml-header-1"), "load");
    assert!(notebook.dom().element_by_id("view-funcs-1").is_none());
    assert!(notebook.dom().element_by_id("funcs-1").is_none());
    assert_eq!(headers(&notebook), 1);
}

#[tokio::test]
async fn function_details_are_grouped_and_highlighted() {
    let orchestrator = orchestrator(StaticAnalysisService::new(linear_payload()));
    let mut notebook = notebook_with_cells(1);

    assert!(orchestrator.run(&mut notebook).await.is_success());

    assert_eq!(heading(&notebook, "ml-header-1"), "train | eval");
    let dom = notebook.dom();

    let details = dom.element_by_id("funcs-1").unwrap();
    assert!(dom.is_visible(details));
    let library = dom.element_by_id("lib-1-torch").unwrap();
    assert!(dom.text_content(library).starts_with("torch.nn.Linear"));

    let highlighted = dom.find_all_by_class(details, "highlighted-heading");
    assert_eq!(highlighted.len(), 1);
    assert_eq!(dom.text_content(highlighted[0]), "Linear");

    let args = dom.element_by_id("args-1-torch.nn.Linear").unwrap();
    assert!(dom.is_visible(args));
    let content = dom.find_by_class(args, "args-content").unwrap();
    assert_eq!(dom.text_content(content), "10");
}

#[tokio::test]
async fn identical_runs_leave_the_page_unchanged() {
    let service = StaticAnalysisService::new(pipeline_payload());
    let orchestrator = orchestrator(service);
    let mut notebook = notebook_with_cells(3);

    orchestrator.run(&mut notebook).await;
    let first = notebook.page_html();
    let nodes = notebook.memory_dom().live_nodes();

    orchestrator.run(&mut notebook).await;
    assert_eq!(notebook.page_html(), first);
    assert_eq!(notebook.memory_dom().live_nodes(), nodes);
    assert_eq!(headers(&notebook), 3);
}

#[tokio::test]
async fn user_toggles_survive_a_rerun() {
    let orchestrator = orchestrator(StaticAnalysisService::new(pipeline_payload()));
    let mut notebook = notebook_with_cells(3);
    orchestrator.run(&mut notebook).await;

    let control = notebook.dom().element_by_id("view-funcs-2").unwrap();
    assert_eq!(
        orchestrator.handle_click(notebook.dom_mut(), control),
        Some(ClickEffect::Widget(false))
    );
    let collapsed = notebook.page_html();

    orchestrator.run(&mut notebook).await;

    assert_eq!(notebook.page_html(), collapsed);
    let details = notebook.dom().element_by_id("funcs-2").unwrap();
    assert!(!notebook.dom().is_visible(details));
    assert_eq!(orchestrator.toggle_state(&WidgetId::Details(cell(2))), Some(false));
}

#[tokio::test]
async fn server_error_annotates_nothing_and_releases_trigger() {
    let orchestrator = orchestrator(FailingService::with_status(500));
    let mut notebook = notebook_with_cells(2);

    let outcome = orchestrator.run(&mut notebook).await;

    let Some(HeadergenError::Service(ServiceError::Status { status, .. })) = outcome.error() else {
        panic!("expected a status failure, got {outcome:?}");
    };
    assert_eq!(*status, 500);
    assert_eq!(headers(&notebook), 0);
    assert!(!Toolbar::is_busy(notebook.dom()));
    let spinner = notebook.dom().element_by_id(SPINNER_ID).unwrap();
    assert!(!notebook.dom().is_visible(spinner));
    assert_eq!(
        Toolbar::failure_notice(notebook.dom()).as_deref(),
        Some("Analysis failed: server returned 500")
    );
    assert_eq!(orchestrator.state(), RunState::Idle);
    assert!(orchestrator.last_summary().is_none());
}

#[tokio::test]
async fn silent_failure_when_notices_are_disabled() {
    let config = HeadergenConfig::default().with_surface_failures(false);
    let orchestrator = Orchestrator::new(FailingService::with_status(503), config);
    let mut notebook = notebook_with_cells(1);

    let outcome = orchestrator.run(&mut notebook).await;

    assert!(outcome.error().is_some_and(HeadergenError::is_retryable));
    assert_eq!(Toolbar::failure_notice(notebook.dom()), None);
    assert!(!Toolbar::is_busy(notebook.dom()));
}

/// Serves `Some` payloads, fails with 503 on `None`
struct Switchable(Mutex<Option<AnalysisPayload>>);

#[async_trait]
impl AnalysisService for Switchable {
    async fn submit(&self, _: &Value, _: &str) -> Result<ParsedPayload, ServiceError> {
        match self.0.lock().clone() {
            Some(payload) => Ok(ParsedPayload {
                payload,
                issues: Vec::new(),
            }),
            None => Err(ServiceError::Status {
                status: 503,
                body: String::new(),
            }),
        }
    }
}

#[tokio::test]
async fn failed_run_keeps_previous_annotations() {
    let service = Arc::new(Switchable(Mutex::new(Some(linear_payload()))));
    let orchestrator = orchestrator(Arc::clone(&service));
    let mut notebook = notebook_with_cells(1);
    orchestrator.run(&mut notebook).await;
    let annotated = notebook.page_html();

    *service.0.lock() = None;
    let outcome = orchestrator.run(&mut notebook).await;
    assert!(outcome.error().is_some());
    assert_eq!(heading(&notebook, "ml-header-1"), "train | eval");
    assert!(Toolbar::failure_notice(notebook.dom()).is_some());

    *service.0.lock() = Some(linear_payload());
    assert!(orchestrator.run(&mut notebook).await.is_success());
    assert_eq!(Toolbar::failure_notice(notebook.dom()), None);
    assert_eq!(notebook.page_html(), annotated);
}

#[tokio::test]
async fn overlapping_run_is_rejected() {
    let service = Arc::new(GatedService::new(linear_payload()));
    let orchestrator = orchestrator(Arc::clone(&service));
    let mut first = notebook_with_cells(1);
    let mut second = notebook_with_cells(1);

    let (outcome, rejected) = tokio::join!(orchestrator.run(&mut first), async {
        service.wait_entered().await;
        assert_eq!(orchestrator.state(), RunState::Running);
        let rejected = orchestrator.run(&mut second).await;
        service.release();
        rejected
    });

    assert!(outcome.is_success());
    assert!(rejected.is_rejected());
    assert_eq!(service.calls(), 1);
    assert_eq!(headers(&second), 0);
    assert_eq!(orchestrator.state(), RunState::Idle);
}

#[tokio::test]
async fn dropped_run_frees_the_trigger() {
    let service = Arc::new(GatedService::new(linear_payload()));
    let orchestrator = orchestrator(Arc::clone(&service));
    let mut notebook = notebook_with_cells(1);

    tokio::select! {
        _ = orchestrator.run(&mut notebook) => panic!("gated run finished"),
        () = service.wait_entered() => {}
    }

    assert_eq!(orchestrator.state(), RunState::Idle);
    assert!(Toolbar::is_busy(notebook.dom()));
    let trigger = notebook.dom().element_by_id(RUN_BUTTON_ID).unwrap();
    assert_eq!(
        orchestrator.handle_click(notebook.dom_mut(), trigger),
        Some(ClickEffect::RunRequested)
    );
    assert!(!Toolbar::is_busy(notebook.dom()));

    service.release();
    assert!(orchestrator.run(&mut notebook).await.is_success());
    assert_eq!(service.calls(), 2);
    assert_eq!(headers(&notebook), 1);
}

#[tokio::test]
async fn hidden_headers_stay_hidden_on_rerun() {
    let service = Arc::new(StaticAnalysisService::new(header_only_payload()));
    let orchestrator = orchestrator(Arc::clone(&service));
    let mut notebook = notebook_with_cells(2);
    orchestrator.run(&mut notebook).await;

    let toggle = notebook.dom().element_by_id(HEADERS_TOGGLE_ID).unwrap();
    assert_eq!(
        orchestrator.handle_click(notebook.dom_mut(), toggle),
        Some(ClickEffect::Toolbar(ToolbarAction::HeadersToggled(false)))
    );

    service.replace_payload(
        AnalysisPayload::new()
            .with_cell(cell(1), CellRecord::with_phases(["load"]))
            .with_cell(cell(2), CellRecord::with_phases(["train"])),
    );
    assert!(orchestrator.run(&mut notebook).await.is_success());

    let dom = notebook.dom();
    for id in ["ml-header-1", "ml-header-2"] {
        assert!(!dom.is_visible(dom.element_by_id(id).unwrap()), "{id} is visible");
    }
    assert_eq!(dom.text_content(toggle), "Show Headers");
}

#[tokio::test]
async fn submission_carries_snapshot_and_path() {
    let service = Arc::new(StaticAnalysisService::new(header_only_payload()));
    let orchestrator = orchestrator(Arc::clone(&service));
    let mut notebook = MemoryNotebook::new("nested/dir/model.ipynb")
        .with_markdown_cell("# Title")
        .with_code_cell("import torch");

    orchestrator.run(&mut notebook).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(service.last_file_name().as_deref(), Some("nested/dir/model.ipynb"));
    let snapshot = service.last_snapshot().unwrap();
    assert_eq!(snapshot["nbformat"], 4);
    assert_eq!(snapshot["cells"].as_array().map(Vec::len), Some(2));
    assert_eq!(snapshot["cells"][1]["source"], "import torch");
}

#[tokio::test]
async fn cells_beyond_the_notebook_are_skipped() {
    let payload = pipeline_payload().with_cell(cell(9), CellRecord::with_phases(["deploy"]));
    let orchestrator = orchestrator(StaticAnalysisService::new(payload));
    let mut notebook = notebook_with_cells(2);

    let outcome = orchestrator.run(&mut notebook).await;

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.cells_annotated, 2);
    assert_eq!(summary.phases, 5);
    assert_eq!(headers(&notebook), 2);
    assert!(notebook.dom().element_by_id("sidebar-phase-deploy").is_some());
}

#[tokio::test]
async fn success_opens_sidebar_and_reveals_toggles() {
    let orchestrator = orchestrator(StaticAnalysisService::new(pipeline_payload()));
    let mut notebook = notebook_with_cells(3);
    orchestrator.install(&mut notebook);

    let toggle = notebook.dom().element_by_id(SIDEBAR_TOGGLE_ID).unwrap();
    assert!(!notebook.dom().is_visible(toggle));
    assert!(!SidebarRenderer::is_open(notebook.dom()));

    orchestrator.run(&mut notebook).await;

    assert!(notebook.dom().is_visible(toggle));
    assert!(SidebarRenderer::is_open(notebook.dom()));
    assert_eq!(
        orchestrator.handle_click(notebook.dom_mut(), toggle),
        Some(ClickEffect::Toolbar(ToolbarAction::SidebarToggled(false)))
    );
}

#[tokio::test]
async fn sidebar_stays_closed_when_configured() {
    let config = HeadergenConfig::default().with_open_sidebar_after_run(false);
    let orchestrator = Orchestrator::new(StaticAnalysisService::new(pipeline_payload()), config);
    let mut notebook = notebook_with_cells(3);

    orchestrator.run(&mut notebook).await;

    assert!(!SidebarRenderer::is_open(notebook.dom()));
    assert!(notebook.dom().element_by_id("sidebar-phase-train").is_some());
}

#[tokio::test]
async fn clicks_are_routed() {
    let orchestrator = orchestrator(StaticAnalysisService::new(pipeline_payload()));
    let mut notebook = notebook_with_cells(3);
    orchestrator.run(&mut notebook).await;

    let run = notebook.dom().element_by_id(RUN_BUTTON_ID).unwrap();
    assert_eq!(
        orchestrator.handle_click(notebook.dom_mut(), run),
        Some(ClickEffect::RunRequested)
    );

    let library = notebook
        .dom()
        .find_by_class(notebook.dom().root(), "library-link")
        .unwrap();
    assert_eq!(
        orchestrator.handle_click(notebook.dom_mut(), library),
        Some(ClickEffect::Widget(true))
    );
    assert_eq!(orchestrator.toggle_state(&WidgetId::library(cell(1), "pandas")), Some(true));

    let source = notebook.dom().find_by_class(notebook.dom().root(), "source").unwrap();
    assert_eq!(orchestrator.handle_click(notebook.dom_mut(), source), None);
}

#[tokio::test]
async fn header_is_rekeyed_when_a_cell_moves() {
    let service = Arc::new(StaticAnalysisService::new(header_only_payload()));
    let orchestrator = orchestrator(Arc::clone(&service));
    let mut notebook = notebook_with_cells(1);
    orchestrator.run(&mut notebook).await;

    notebook.insert_cell(0, "markdown", "# Intro").unwrap();
    service.replace_payload(
        AnalysisPayload::new().with_cell(cell(2), CellRecord::with_phases(["load"])),
    );
    orchestrator.run(&mut notebook).await;

    assert_eq!(headers(&notebook), 1);
    assert!(notebook.dom().element_by_id("ml-header-1").is_none());
    assert_eq!(heading(&notebook, "ml-header-2"), "load");
}
