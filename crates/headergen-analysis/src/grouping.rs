//! Function grouping by library
//!
//! The library of a function is the first segment of its qualified name.
//! Grouping is purely presentational, but it must be deterministic: widget
//! ids and re-render idempotence depend on it.

use crate::payload::{CellPosition, CellRecord, FunctionDetail};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Separator between segments of a qualified function name
pub const LIBRARY_SEPARATOR: char = '.';

/// Library a qualified function name belongs to
///
/// Total: a name without a separator is its own library.
///
/// ```rust
/// use headergen_analysis::library_of;
///
/// assert_eq!(library_of("torch.nn.Linear"), "torch");
/// assert_eq!(library_of("print"), "print");
/// ```
#[inline]
#[must_use]
pub fn library_of(qualified_name: &str) -> &str {
    qualified_name
        .split_once(LIBRARY_SEPARATOR)
        .map_or(qualified_name, |(library, _)| library)
}

/// Functions of one library, in payload order
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryGroup<'a> {
    /// Library name
    pub library: &'a str,
    /// Qualified name and detail of each function
    pub functions: Vec<(&'a str, &'a FunctionDetail)>,
}

impl LibraryGroup<'_> {
    /// Number of functions in the bucket
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the bucket is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Group a cell's functions by library
///
/// Libraries keep first-seen order, functions keep their relative order.
#[must_use]
pub fn group_by_library(functions: &IndexMap<String, FunctionDetail>) -> Vec<LibraryGroup<'_>> {
    let mut groups: IndexMap<&str, Vec<(&str, &FunctionDetail)>> = IndexMap::new();

    for (name, detail) in functions {
        groups
            .entry(library_of(name))
            .or_default()
            .push((name.as_str(), detail));
    }

    groups
        .into_iter()
        .map(|(library, functions)| LibraryGroup { library, functions })
        .collect()
}

/// Cell → grouped functions, for every cell that reported functions
#[derive(Debug, Clone, Default)]
pub struct FunctionIndex<'a> {
    by_cell: BTreeMap<CellPosition, Vec<LibraryGroup<'a>>>,
}

impl<'a> FunctionIndex<'a> {
    /// Build from a cell mapping
    #[must_use]
    pub fn build(cell_mapping: &'a BTreeMap<CellPosition, CellRecord>) -> Self {
        let by_cell = cell_mapping
            .iter()
            .filter(|(_, record)| record.has_functions())
            .map(|(&position, record)| (position, group_by_library(&record.functions)))
            .collect();

        Self { by_cell }
    }

    /// Groups for a cell; empty when the cell reported no functions
    #[must_use]
    pub fn groups(&self, position: CellPosition) -> &[LibraryGroup<'a>] {
        self.by_cell.get(&position).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of functions reported for a cell
    #[must_use]
    pub fn function_count(&self, position: CellPosition) -> usize {
        self.groups(position).iter().map(LibraryGroup::len).sum()
    }

    /// Cells with at least one function
    pub fn cells(&self) -> impl Iterator<Item = CellPosition> + '_ {
        self.by_cell.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn functions(names: &[&str]) -> IndexMap<String, FunctionDetail> {
        names
            .iter()
            .map(|n| ((*n).to_string(), FunctionDetail::new(*n)))
            .collect()
    }

    fn shape<'a>(groups: &[LibraryGroup<'a>]) -> Vec<(&'a str, Vec<&'a str>)> {
        groups
            .iter()
            .map(|g| (g.library, g.functions.iter().map(|(n, _)| *n).collect()))
            .collect()
    }

    #[test]
    fn library_of_edge_cases() {
        assert_eq!(library_of("pandas.DataFrame.merge"), "pandas");
        assert_eq!(library_of("len"), "len");
        assert_eq!(library_of(".hidden"), "");
        assert_eq!(library_of(""), "");
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let map = functions(&[
            "sklearn.model_selection.train_test_split",
            "pandas.read_csv",
            "sklearn.linear_model.LinearRegression",
            "print",
            "pandas.DataFrame.head",
        ]);

        assert_eq!(
            shape(&group_by_library(&map)),
            vec![
                (
                    "sklearn",
                    vec![
                        "sklearn.model_selection.train_test_split",
                        "sklearn.linear_model.LinearRegression"
                    ]
                ),
                ("pandas", vec!["pandas.read_csv", "pandas.DataFrame.head"]),
                ("print", vec!["print"]),
            ]
        );
    }

    #[test]
    fn function_index_skips_cells_without_functions() {
        let mut mapping = BTreeMap::new();
        let one = CellPosition::FIRST;
        let two = CellPosition::new(2).unwrap();
        mapping.insert(one, CellRecord::with_phases(["load"]));
        mapping.insert(
            two,
            CellRecord::with_phases(["train"])
                .with_function("torch.nn.Linear", FunctionDetail::default())
                .with_function("torch.optim.SGD", FunctionDetail::default()),
        );

        let index = FunctionIndex::build(&mapping);
        assert!(index.groups(one).is_empty());
        assert_eq!(index.function_count(two), 2);
        assert_eq!(index.cells().collect::<Vec<_>>(), vec![two]);
    }

    proptest! {
        #[test]
        fn prop_grouping_is_stable(names in proptest::collection::vec("[a-c]{1,2}(\\.[a-z]{1,3}){0,2}", 0..12)) {
            let map = functions(&names.iter().map(String::as_str).collect::<Vec<_>>());

            let first = group_by_library(&map);
            let second = group_by_library(&map);
            prop_assert_eq!(shape(&first), shape(&second));

            let flattened: usize = first.iter().map(LibraryGroup::len).sum();
            prop_assert_eq!(flattened, map.len());
            for group in &first {
                for (name, _) in &group.functions {
                    prop_assert_eq!(library_of(name), group.library);
                }
            }
        }
    }
}
