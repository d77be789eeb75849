//! Notebook host capability
//!
//! A [`NotebookHost`] is the page the engine annotates: an ordered list of
//! cells, each rendered under its own root node of the host's [`Dom`].

use crate::dom::{Dom, NodeId};
use crate::error::NotebookError;
use crate::memory::MemoryDom;
use serde_json::{json, Value};

/// A cell as seen by the engine during one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHandle {
    index: usize,
    root: NodeId,
}

impl CellHandle {
    /// Handle for the cell at 0-based `index`, rendered under `root`
    #[inline]
    #[must_use]
    pub fn new(index: usize, root: NodeId) -> Self {
        Self { index, root }
    }

    /// 0-based position in the notebook
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Root node of the cell's rendering
    #[inline]
    #[must_use]
    pub fn dom_root(&self) -> NodeId {
        self.root
    }
}

/// Notebook page the engine annotates
pub trait NotebookHost {
    /// Document tree type of the page
    type Dom: Dom;

    /// Cells in document order
    fn cells(&self) -> Vec<CellHandle>;

    /// Path of the notebook file
    fn current_path(&self) -> String;

    /// nbformat JSON snapshot of the notebook
    fn serialize(&self) -> Value;

    /// Page document
    fn dom(&self) -> &Self::Dom;

    /// Page document, mutable
    fn dom_mut(&mut self) -> &mut Self::Dom;
}

const NBFORMAT: u64 = 4;
const DEFAULT_NBFORMAT_MINOR: u64 = 5;

#[derive(Debug, Clone)]
struct MemoryCell {
    root: NodeId,
    json: Value,
}

/// Headless notebook page backed by a [`MemoryDom`]
///
/// Each cell renders as
/// `div.cell.<type>_cell > div.input > pre.source` inside a
/// `div#notebook-container`.
#[derive(Debug, Clone)]
pub struct MemoryNotebook {
    path: String,
    dom: MemoryDom,
    container: NodeId,
    cells: Vec<MemoryCell>,
    metadata: Value,
    nbformat_minor: u64,
}

impl MemoryNotebook {
    /// Empty notebook at `path`
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let container = dom.build("div", Some("container"), None);
        dom.set_id(container, "notebook-container");
        dom.append_child(root, container);

        Self {
            path: path.into(),
            dom,
            container,
            cells: Vec::new(),
            metadata: json!({}),
            nbformat_minor: DEFAULT_NBFORMAT_MINOR,
        }
    }

    /// Load an `.ipynb` document
    ///
    /// # Errors
    /// - `NotebookError::Json` if the text is not JSON
    /// - `NotebookError::InvalidNotebook` if it is not an nbformat notebook
    pub fn from_ipynb_str(path: impl Into<String>, text: &str) -> Result<Self, NotebookError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_ipynb(path, &value)
    }

    /// Load an already-parsed `.ipynb` document
    ///
    /// # Errors
    /// Returns `NotebookError::InvalidNotebook` if `cells` is missing or a
    /// cell is not an object.
    pub fn from_ipynb(path: impl Into<String>, value: &Value) -> Result<Self, NotebookError> {
        let cells = value
            .get("cells")
            .and_then(Value::as_array)
            .ok_or_else(|| NotebookError::InvalidNotebook("missing cells array".to_string()))?;

        let mut notebook = Self::new(path);
        if let Some(metadata) = value.get("metadata") {
            notebook.metadata = metadata.clone();
        }
        if let Some(minor) = value.get("nbformat_minor").and_then(Value::as_u64) {
            notebook.nbformat_minor = minor;
        }

        for (index, cell) in cells.iter().enumerate() {
            if !cell.is_object() {
                return Err(NotebookError::InvalidNotebook(format!(
                    "cell {index} is not an object"
                )));
            }
            let cell_type = cell
                .get("cell_type")
                .and_then(Value::as_str)
                .unwrap_or("code")
                .to_string();
            let source = cell.get("source").map(source_text).unwrap_or_default();

            let root = notebook.render_cell(&cell_type, &source);
            let mut json = cell.clone();
            json["source"] = Value::String(source);
            notebook.dom.append_child(notebook.container, root);
            notebook.cells.push(MemoryCell { root, json });
        }

        Ok(notebook)
    }

    /// Append a cell
    pub fn push_cell(&mut self, cell_type: &str, source: &str) -> CellHandle {
        let root = self.render_cell(cell_type, source);
        self.dom.append_child(self.container, root);
        self.cells.push(MemoryCell {
            root,
            json: cell_json(cell_type, source),
        });
        CellHandle::new(self.cells.len() - 1, root)
    }

    /// Append a code cell
    #[must_use]
    pub fn with_code_cell(mut self, source: &str) -> Self {
        self.push_cell("code", source);
        self
    }

    /// Append a markdown cell
    #[must_use]
    pub fn with_markdown_cell(mut self, source: &str) -> Self {
        self.push_cell("markdown", source);
        self
    }

    /// Insert a cell before `index`, shifting later cells down
    ///
    /// # Errors
    /// Returns `NotebookError::CellOutOfRange` if `index > len`.
    pub fn insert_cell(
        &mut self,
        index: usize,
        cell_type: &str,
        source: &str,
    ) -> Result<CellHandle, NotebookError> {
        if index > self.cells.len() {
            return Err(NotebookError::CellOutOfRange {
                index,
                len: self.cells.len(),
            });
        }

        let root = self.render_cell(cell_type, source);
        self.cells.insert(
            index,
            MemoryCell {
                root,
                json: cell_json(cell_type, source),
            },
        );
        self.relayout();
        Ok(CellHandle::new(index, root))
    }

    /// Delete the cell at `index` together with its rendering
    ///
    /// # Errors
    /// Returns `NotebookError::CellOutOfRange` if `index >= len`.
    pub fn remove_cell(&mut self, index: usize) -> Result<(), NotebookError> {
        if index >= self.cells.len() {
            return Err(NotebookError::CellOutOfRange {
                index,
                len: self.cells.len(),
            });
        }
        let cell = self.cells.remove(index);
        self.dom.remove(cell.root);
        Ok(())
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the notebook has no cells
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Handle of the cell at `index`
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<CellHandle> {
        self.cells
            .get(index)
            .map(|cell| CellHandle::new(index, cell.root))
    }

    /// Source text of the cell at `index`
    #[must_use]
    pub fn cell_source(&self, index: usize) -> Option<&str> {
        self.cells.get(index)?.json.get("source")?.as_str()
    }

    /// In-memory page
    #[inline]
    #[must_use]
    pub fn memory_dom(&self) -> &MemoryDom {
        &self.dom
    }

    /// Serialize the whole page as HTML
    #[must_use]
    pub fn page_html(&self) -> String {
        self.dom.document_html()
    }

    fn render_cell(&mut self, cell_type: &str, source: &str) -> NodeId {
        let class = format!("cell {cell_type}_cell");
        let root = self.dom.build("div", Some(&class), None);
        let input = self.dom.build("div", Some("input"), None);
        let code = self.dom.build("pre", Some("source"), Some(source));
        self.dom.append_child(input, code);
        self.dom.append_child(root, input);
        root
    }

    fn relayout(&mut self) {
        for cell in &self.cells {
            self.dom.append_child(self.container, cell.root);
        }
    }
}

impl NotebookHost for MemoryNotebook {
    type Dom = MemoryDom;

    fn cells(&self) -> Vec<CellHandle> {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| CellHandle::new(index, cell.root))
            .collect()
    }

    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn serialize(&self) -> Value {
        json!({
            "cells": self.cells.iter().map(|c| c.json.clone()).collect::<Vec<_>>(),
            "metadata": self.metadata,
            "nbformat": NBFORMAT,
            "nbformat_minor": self.nbformat_minor,
        })
    }

    fn dom(&self) -> &MemoryDom {
        &self.dom
    }

    fn dom_mut(&mut self) -> &mut MemoryDom {
        &mut self.dom
    }
}

fn source_text(source: &Value) -> String {
    match source {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn cell_json(cell_type: &str, source: &str) -> Value {
    if cell_type == "code" {
        json!({
            "cell_type": "code",
            "execution_count": null,
            "metadata": {},
            "outputs": [],
            "source": source,
        })
    } else {
        json!({
            "cell_type": cell_type,
            "metadata": {},
            "source": source,
        })
    }
}
