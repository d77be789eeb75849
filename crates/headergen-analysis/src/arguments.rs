//! Argument merging and display
//!
//! A function called from several places reports one argument set per call
//! site. For display they are merged: positionals are concatenated, keyword
//! arguments are merged with later sets winning. Empty arrays are noise from
//! the analyzer and are dropped.

use crate::payload::ArgumentSet;
use indexmap::IndexMap;
use serde_json::Value;

/// All argument sets of a function, merged for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedArguments {
    /// Positional arguments, rendered
    pub positional: Vec<String>,
    /// Keyword arguments, rendered
    pub keyword: IndexMap<String, String>,
}

impl MergedArguments {
    /// Whether there is nothing to show
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Positionals joined for display, `None` when there are none
    #[must_use]
    pub fn args_line(&self) -> Option<String> {
        (!self.positional.is_empty()).then(|| self.positional.join(", "))
    }
}

/// Merge every argument set of a function
#[must_use]
pub fn merge_argument_sets(sets: &[ArgumentSet]) -> MergedArguments {
    let mut merged = MergedArguments::default();

    for set in sets {
        merged.positional.extend(
            set.positional
                .iter()
                .filter(|value| !is_empty_array(value))
                .map(display_value),
        );

        for (name, value) in &set.keyword {
            if is_empty_array(value) {
                continue;
            }
            merged.keyword.insert(name.clone(), display_value(value));
        }
    }

    merged
}

/// Render an argument value
///
/// Strings are shown without quotes and arrays as `[a, b]`; everything else
/// uses its JSON form.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(display_value).collect();
            format!("[{}]", inner.join(", "))
        }
        other => other.to_string(),
    }
}

fn is_empty_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_values() {
        assert_eq!(display_value(&json!("10")), "10");
        assert_eq!(display_value(&json!(3.5)), "3.5");
        assert_eq!(display_value(&json!(null)), "null");
        assert_eq!(display_value(&json!(["a", 1, ["b"]])), "[a, 1, [b]]");
    }

    #[test]
    fn merges_positionals_and_keywords() {
        let sets = vec![
            ArgumentSet::positional(["10", "20"]).with_keyword("bias", true),
            ArgumentSet::positional(["30"])
                .with_keyword("bias", false)
                .with_keyword("device", "cpu"),
        ];

        let merged = merge_argument_sets(&sets);
        assert_eq!(merged.args_line().as_deref(), Some("10, 20, 30"));
        assert_eq!(merged.keyword["bias"], "false");
        assert_eq!(merged.keyword["device"], "cpu");
        assert_eq!(merged.keyword.keys().collect::<Vec<_>>(), vec!["bias", "device"]);
    }

    #[test]
    fn empty_arrays_are_dropped() {
        let mut set = ArgumentSet::default();
        set.positional.push(json!([]));
        set.keyword.insert("shape".into(), json!([]));

        let merged = merge_argument_sets(&[set]);
        assert!(merged.is_empty());
        assert_eq!(merged.args_line(), None);
    }
}
