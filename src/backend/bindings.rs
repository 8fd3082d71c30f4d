//! Variable bindings of a single rule.

use std::collections::HashMap;

/// Maps pattern variables to the fact or slot name they were first bound to.
///
/// A table lives for exactly one rule. Conditions fill it in source order, so a
/// variable resolves only after the pattern that binds it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Bindings {
    table: HashMap<String, String>,
}

impl Bindings {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `variable` as denoting `name` unless it is already bound.
    ///
    /// Returns `true` when the binding is new.
    pub fn bind(&mut self, variable: &str, name: impl Into<String>) -> bool {
        if variable.is_empty() || self.table.contains_key(variable) {
            return false;
        }
        self.table.insert(variable.to_string(), name.into());
        true
    }

    /// The name `variable` was first bound to.
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.table.get(variable).map(String::as_str)
    }

    /// Whether `variable` has a binding.
    pub fn is_bound(&self, variable: &str) -> bool {
        self.table.contains_key(variable)
    }
}
