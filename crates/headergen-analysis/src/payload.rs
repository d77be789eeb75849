//! Analysis payload model
//!
//! Mirrors the JSON produced by the analysis service:
//!
//! ```text
//! { "cell_mapping": { "1": { "ml_phase": [..], "functions": { "torch.nn.Linear": {
//!       "doc_string": "..", "arguments": [ { "args": [..], "kwargs": {..} } ] } } } } }
//! ```
//!
//! Decoding is lenient: a missing or malformed mapping yields an empty
//! payload, and malformed entries are skipped. Everything dropped is
//! reported through [`ParsedPayload::issues`].

use crate::error::PayloadError;
use crate::grouping::FunctionIndex;
use crate::phase_index::PhaseIndex;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// 1-based position of a cell in the notebook at analysis time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CellPosition(NonZeroU32);

impl CellPosition {
    /// First cell of a notebook
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Create from a 1-based position; `None` for zero
    #[inline]
    #[must_use]
    pub fn new(position: u32) -> Option<Self> {
        NonZeroU32::new(position).map(Self)
    }

    /// Position of the cell at a 0-based notebook index
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(Self::new)
    }

    /// 1-based value
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for CellPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CellPosition {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| PayloadError::InvalidCellKey(s.to_string()))
    }
}

/// Analysis of a single cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Detected ML phases, in payload order
    #[serde(rename = "ml_phase", default, deserialize_with = "null_as_default")]
    pub phases: Vec<String>,

    /// Function calls keyed by qualified name, in payload order
    #[serde(default, deserialize_with = "null_as_default")]
    pub functions: IndexMap<String, FunctionDetail>,
}

impl CellRecord {
    /// Record with the given phases and no functions
    #[must_use]
    pub fn with_phases<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phases: phases.into_iter().map(Into::into).collect(),
            functions: IndexMap::new(),
        }
    }

    /// Add a function call
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>, detail: FunctionDetail) -> Self {
        self.functions.insert(name.into(), detail);
        self
    }

    /// Whether any function calls were reported
    #[inline]
    #[must_use]
    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }
}

/// Metadata of one called function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDetail {
    /// Raw docstring text
    #[serde(rename = "doc_string", default, deserialize_with = "null_as_default")]
    pub docstring: String,

    /// Argument sets, one per call site
    #[serde(rename = "arguments", default, deserialize_with = "null_as_default")]
    pub argument_sets: Vec<ArgumentSet>,
}

impl FunctionDetail {
    /// Detail with a docstring only
    #[must_use]
    pub fn new(docstring: impl Into<String>) -> Self {
        Self {
            docstring: docstring.into(),
            argument_sets: Vec::new(),
        }
    }

    /// Add an argument set
    #[must_use]
    pub fn with_arguments(mut self, set: ArgumentSet) -> Self {
        self.argument_sets.push(set);
        self
    }
}

/// Arguments observed at one call site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSet {
    /// Positional arguments
    #[serde(rename = "args", default, deserialize_with = "null_as_default")]
    pub positional: Vec<Value>,

    /// Keyword arguments
    #[serde(rename = "kwargs", default, deserialize_with = "null_as_default")]
    pub keyword: IndexMap<String, Value>,
}

impl ArgumentSet {
    /// Argument set from string positionals
    #[must_use]
    pub fn positional<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            positional: args.into_iter().map(|a| Value::String(a.into())).collect(),
            keyword: IndexMap::new(),
        }
    }

    /// Add a keyword argument
    #[must_use]
    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Result of one analysis run, keyed by cell position
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisPayload {
    /// Cell records in ascending position order
    pub cell_mapping: BTreeMap<CellPosition, CellRecord>,
}

/// Decoded payload plus everything that had to be dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPayload {
    /// Usable payload
    pub payload: AnalysisPayload,
    /// Dropped parts of the response
    pub issues: Vec<PayloadError>,
}

/// Indexes derived from a payload for one run
#[derive(Debug, Clone)]
pub struct AnalysisIndex<'a> {
    /// Phase → cells
    pub phases: PhaseIndex,
    /// Cell → grouped functions
    pub functions: FunctionIndex<'a>,
}

impl AnalysisPayload {
    /// Empty payload
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cell record
    #[must_use]
    pub fn with_cell(mut self, position: CellPosition, record: CellRecord) -> Self {
        self.cell_mapping.insert(position, record);
        self
    }

    /// Decode a response body
    ///
    /// # Errors
    /// Returns error only when the body is not JSON at all; structural
    /// problems are reported as issues.
    pub fn from_json_str(body: &str) -> Result<ParsedPayload, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::from_value(&value))
    }

    /// Decode an already-parsed response
    #[must_use]
    pub fn from_value(value: &Value) -> ParsedPayload {
        let mut parsed = ParsedPayload::default();

        let Some(raw) = value.get("cell_mapping") else {
            parsed.issues.push(PayloadError::MissingCellMapping);
            return parsed;
        };

        let Some(entries) = raw.as_object() else {
            parsed
                .issues
                .push(PayloadError::InvalidCellMapping(json_type_name(raw)));
            return parsed;
        };

        for (key, record) in entries {
            let position = match key.parse::<CellPosition>() {
                Ok(position) => position,
                Err(issue) => {
                    parsed.issues.push(issue);
                    continue;
                }
            };

            match CellRecord::deserialize(record) {
                Ok(record) => {
                    parsed.payload.cell_mapping.insert(position, record);
                }
                Err(e) => parsed.issues.push(PayloadError::InvalidRecord {
                    position,
                    message: e.to_string(),
                }),
            }
        }

        parsed
    }

    /// Record for a cell, if it was analyzed
    #[inline]
    #[must_use]
    pub fn record(&self, position: CellPosition) -> Option<&CellRecord> {
        self.cell_mapping.get(&position)
    }

    /// Number of analyzed cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cell_mapping.len()
    }

    /// Whether no cell was analyzed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell_mapping.is_empty()
    }

    /// Build the phase and function indexes for this payload
    #[must_use]
    pub fn index(&self) -> AnalysisIndex<'_> {
        AnalysisIndex {
            phases: PhaseIndex::build(&self.cell_mapping),
            functions: FunctionIndex::build(&self.cell_mapping),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
