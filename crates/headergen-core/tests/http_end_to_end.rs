//! Full runs against an in-process analysis server

use headergen_core::{HeadergenConfig, Orchestrator};
use headergen_dom::{Dom, MemoryNotebook, NotebookHost};
use headergen_render::Toolbar;
use pretty_assertions::assert_eq;
use warp::http::StatusCode;
use warp::Filter;

const RESPONSE: &str = r#"{
  "cell_mapping": {
    "1": {
      "ml_phase": ["train", "eval"],
      "functions": {
        "torch.nn.Linear": {
          "doc_string": "Linear\n-----",
          "arguments": [{"args": ["10"], "kwargs": {}}]
        }
      }
    },
    "7": {"ml_phase": ["load"], "functions": {}}
  }
}"#;

fn spawn_server(status: StatusCode, reply: &'static str) -> String {
    let route = warp::post()
        .and(warp::path("get_analysis_notebook"))
        .and(warp::body::bytes())
        .map(move |_| warp::reply::with_status(reply, status));
    let (address, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{address}")
}

fn orchestrator(url: &str) -> Orchestrator<headergen_service::HttpAnalysisService> {
    let config = HeadergenConfig::default()
        .with_server_url(url)
        .with_request_timeout_secs(5);
    Orchestrator::from_config(config).unwrap()
}

#[tokio::test]
async fn annotates_notebook_from_server_response() {
    let url = spawn_server(StatusCode::OK, RESPONSE);
    let orchestrator = orchestrator(&url);
    let mut notebook = MemoryNotebook::new("demo.ipynb")
        .with_code_cell("import torch")
        .with_code_cell("model = torch.nn.Linear(10, 2)");

    let outcome = orchestrator.run(&mut notebook).await;

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.cells_annotated, 1);
    assert_eq!(summary.functions, 1);
    assert_eq!(summary.phases, 3);
    let dom = notebook.dom();
    assert!(dom.element_by_id("lib-1-torch").is_some());
    assert!(dom.element_by_id("ml-header-2").is_none());
    assert!(dom.element_by_id("sidebar-phase-load").is_some());
}

#[tokio::test]
async fn server_failure_surfaces_notice() {
    let url = spawn_server(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let orchestrator = orchestrator(&url);
    let mut notebook = MemoryNotebook::new("demo.ipynb").with_code_cell("import torch");

    let outcome = orchestrator.run(&mut notebook).await;

    assert_eq!(
        outcome.error().map(|e| e.summary()).as_deref(),
        Some("server returned 500")
    );
    assert!(!Toolbar::is_busy(notebook.dom()));
    assert!(notebook.dom().find_by_class(notebook.dom().root(), "ml-phase-container").is_none());
}

#[tokio::test]
async fn unreachable_server_is_a_retryable_failure() {
    let orchestrator = orchestrator("http://127.0.0.1:1");
    let mut notebook = MemoryNotebook::new("demo.ipynb").with_code_cell("x = 1");

    let outcome = orchestrator.run(&mut notebook).await;

    assert!(outcome.error().is_some_and(|e| e.is_retryable()));
    assert!(Toolbar::failure_notice(notebook.dom()).is_some());
}
