//! Testing utilities for the Headergen workspace
//!
//! Payload fixtures, notebook builders and scripted analysis services.

#![allow(missing_docs)]

use async_trait::async_trait;
use headergen_analysis::{
    AnalysisPayload, ArgumentSet, CellPosition, CellRecord, FunctionDetail, ParsedPayload,
};
use headergen_dom::MemoryNotebook;
use headergen_service::{AnalysisService, ServiceError};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub fn cell(n: u32) -> CellPosition {
    CellPosition::new(n).unwrap()
}

/// One cell in phase "load", no functions
pub fn header_only_payload() -> AnalysisPayload {
    AnalysisPayload::new().with_cell(cell(1), CellRecord::with_phases(["load"]))
}

/// One cell in "train" and "eval" calling `torch.nn.Linear(10)`
pub fn linear_payload() -> AnalysisPayload {
    AnalysisPayload::new().with_cell(
        cell(1),
        CellRecord::with_phases(["train", "eval"]).with_function(
            "torch.nn.Linear",
            FunctionDetail::new("Linear\n-----").with_arguments(ArgumentSet::positional(["10"])),
        ),
    )
}

/// Three cells across four phases and two libraries
pub fn pipeline_payload() -> AnalysisPayload {
    AnalysisPayload::new()
        .with_cell(
            cell(1),
            CellRecord::with_phases(["load"])
                .with_function("pandas.read_csv", FunctionDetail::new("Read a CSV file")),
        )
        .with_cell(
            cell(2),
            CellRecord::with_phases(["preprocess", "train"])
                .with_function(
                    "sklearn.model_selection.train_test_split",
                    FunctionDetail::new("Split arrays\n----------\nrandomly")
                        .with_arguments(ArgumentSet::positional(["X", "y"]).with_keyword("test_size", 0.2)),
                )
                .with_function(
                    "torch.nn.Linear",
                    FunctionDetail::new("Linear").with_arguments(ArgumentSet::positional(["10", "2"])),
                ),
        )
        .with_cell(cell(3), CellRecord::with_phases(["eval"]))
}

/// Notebook with `n` code cells
pub fn notebook_with_cells(n: usize) -> MemoryNotebook {
    let mut notebook = MemoryNotebook::new("pipeline.ipynb");
    for i in 0..n {
        notebook.push_cell("code", &format!("x{i} = {i}"));
    }
    notebook
}

fn parsed(payload: AnalysisPayload) -> ParsedPayload {
    ParsedPayload {
        payload,
        issues: Vec::new(),
    }
}

/// Answers every submission with a fixed payload
#[derive(Debug)]
pub struct StaticAnalysisService {
    payload: Mutex<AnalysisPayload>,
    calls: AtomicUsize,
    last_file_name: Mutex<Option<String>>,
    last_snapshot: Mutex<Option<Value>>,
}

impl StaticAnalysisService {
    pub fn new(payload: AnalysisPayload) -> Self {
        Self {
            payload: Mutex::new(payload),
            calls: AtomicUsize::new(0),
            last_file_name: Mutex::new(None),
            last_snapshot: Mutex::new(None),
        }
    }

    /// Answer later submissions with `payload`
    pub fn replace_payload(&self, payload: AnalysisPayload) {
        *self.payload.lock() = payload;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_file_name(&self) -> Option<String> {
        self.last_file_name.lock().clone()
    }

    pub fn last_snapshot(&self) -> Option<Value> {
        self.last_snapshot.lock().clone()
    }
}

#[async_trait]
impl AnalysisService for StaticAnalysisService {
    async fn submit(&self, snapshot: &Value, file_name: &str) -> Result<ParsedPayload, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_file_name.lock() = Some(file_name.to_string());
        *self.last_snapshot.lock() = Some(snapshot.clone());
        Ok(parsed(self.payload.lock().clone()))
    }
}

/// Fails every submission with a fixed HTTP status
#[derive(Debug)]
pub struct FailingService {
    status: u16,
    calls: AtomicUsize,
}

impl FailingService {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for FailingService {
    async fn submit(&self, _: &Value, _: &str) -> Result<ParsedPayload, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Status {
            status: self.status,
            body: "Internal Server Error".to_string(),
        })
    }
}

/// Holds every submission until [`GatedService::release`] is called
#[derive(Debug)]
pub struct GatedService {
    payload: AnalysisPayload,
    entered: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedService {
    pub fn new(payload: AnalysisPayload) -> Self {
        Self {
            payload,
            entered: Notify::new(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait until a submission is parked at the gate
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked submission through
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for GatedService {
    async fn submit(&self, _: &Value, _: &str) -> Result<ParsedPayload, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(parsed(self.payload.clone()))
    }
}
