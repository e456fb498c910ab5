/// Condition evaluation: pure reads of the variable store driving the
/// True/False routing of condition nodes.

use crate::core::store::{IntScope, VariableStore};
use crate::schema::node::{IntComparison, StringComparison};

/// Evaluate an integer condition.
///
/// A missing variable evaluates to `false` with a diagnostic rather than
/// comparing against the 0 default: an author's `Equal 0` check must not
/// pass for a variable that was never set.
pub fn evaluate_int(
    store: &VariableStore,
    scope: IntScope,
    variable: &str,
    comparison: IntComparison,
    value: i64,
) -> bool {
    match store.int(scope, variable) {
        Some(stored) => comparison.compare(stored, value),
        None => {
            log::warn!(
                "int condition on missing variable '{variable}' ({scope:?}); evaluating false"
            );
            false
        }
    }
}

/// Evaluate a string condition against a global property.
///
/// Absent properties take the store's "" default, so `IsNullOrEmpty` holds
/// for a property that was never set.
pub fn evaluate_string(
    store: &VariableStore,
    property: &str,
    comparison: StringComparison,
    value: &str,
) -> bool {
    if !store.has_string(property) {
        log::debug!("string condition on unset property '{property}'; using \"\"");
    }
    comparison.compare(store.string(property), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greater_or_equal_boundary() {
        let mut store = VariableStore::new();
        store.set_int(IntScope::Global, "health", 5);
        assert!(evaluate_int(
            &store,
            IntScope::Global,
            "health",
            IntComparison::GreaterOrEqual,
            5
        ));

        store.set_int(IntScope::Global, "health", 4);
        assert!(!evaluate_int(
            &store,
            IntScope::Global,
            "health",
            IntComparison::GreaterOrEqual,
            5
        ));
    }

    #[test]
    fn missing_int_variable_is_false_even_against_zero() {
        let store = VariableStore::new();
        assert!(!evaluate_int(
            &store,
            IntScope::Global,
            "health",
            IntComparison::Equal,
            0
        ));
        assert!(!evaluate_int(
            &store,
            IntScope::Global,
            "health",
            IntComparison::LessOrEqual,
            10
        ));
    }

    #[test]
    fn string_equal_and_not_equal() {
        let mut store = VariableStore::new();
        store.set_string("quest_state", "accepted");
        assert!(evaluate_string(
            &store,
            "quest_state",
            StringComparison::Equal,
            "accepted"
        ));
        assert!(evaluate_string(
            &store,
            "quest_state",
            StringComparison::NotEqual,
            "done"
        ));
    }

    #[test]
    fn is_null_or_empty_holds_for_unset_property() {
        let mut store = VariableStore::new();
        assert!(evaluate_string(
            &store,
            "quest_state",
            StringComparison::IsNullOrEmpty,
            "ignored"
        ));
        store.set_string("quest_state", "accepted");
        assert!(!evaluate_string(
            &store,
            "quest_state",
            StringComparison::IsNullOrEmpty,
            "ignored"
        ));
    }
}
