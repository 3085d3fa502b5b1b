//! Declared variable names per reference scope.

use crate::substitution::Scope;
use crate::types::{ParamSpec, TaskResource, TaskSpec};
use std::collections::HashSet;

/// The set of names a scope may reference, and which of them are arrays.
///
/// Built fresh for every validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableNamespace {
    names: HashSet<String>,
    arrays: HashSet<String>,
}

impl VariableNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of every parameter in `groups`. A name declared as an array in
    /// any group counts as an array.
    pub fn from_params<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = &'a [ParamSpec]>,
    {
        let mut ns = Self::new();
        for param in groups.into_iter().flatten() {
            ns.declare(&param.name, param.is_array());
        }
        ns
    }

    /// Union of every resource in `groups`. Resources are never arrays.
    pub fn from_resources<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = &'a [TaskResource]>,
    {
        let mut ns = Self::new();
        for resource in groups.into_iter().flatten() {
            ns.declare(&resource.name, false);
        }
        ns
    }

    pub fn declare(&mut self, name: &str, is_array: bool) {
        self.names.insert(name.to_string());
        if is_array {
            self.arrays.insert(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_array(&self, name: &str) -> bool {
        self.arrays.contains(name)
    }

    pub fn has_arrays(&self) -> bool {
        !self.arrays.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Build the namespace for every scope, in the order references are checked.
///
/// New-style `$(params.x)` references only see new-style params, and
/// `$(resources.inputs.x)` only new-style resources. The legacy prefixes see
/// the union of both declaration styles.
pub fn build_namespaces(spec: &TaskSpec) -> Vec<(Scope, VariableNamespace)> {
    vec![
        (Scope::Params, VariableNamespace::from_params([spec.params.as_slice()])),
        (
            Scope::LegacyParams,
            VariableNamespace::from_params([spec.params.as_slice(), spec.legacy_params()]),
        ),
        (
            Scope::Resources,
            VariableNamespace::from_resources([spec.input_resources(), spec.output_resources()]),
        ),
        (
            Scope::LegacyResources,
            VariableNamespace::from_resources([
                spec.input_resources(),
                spec.output_resources(),
                spec.legacy_input_resources(),
                spec.legacy_output_resources(),
            ]),
        ),
    ]
}
