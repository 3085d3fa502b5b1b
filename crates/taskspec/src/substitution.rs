//! Placeholder scanning.
//!
//! A placeholder has the form `$(<scope>.<name>)` where `<name>` starts with a
//! letter or underscore and continues with letters, digits, `_`, `-` or `.`.
//! Only the first dot-separated segment of `<name>` names the variable:
//! `$(inputs.resources.source.path)` refers to the resource `source`.
//!
//! Anything that does not match the grammar exactly, such as an unterminated
//! `$(params.x`, is plain text.

use crate::error::{ErrorKind, FieldError};
use crate::namespace::VariableNamespace;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

const NAME_PATTERN: &str = r"[_a-zA-Z][_a-zA-Z0-9.-]*";

fn placeholder_regex(prefix: &str) -> Regex {
    Regex::new(&format!(r"\$\({prefix}\.({NAME_PATTERN})\)")).expect("Invalid regex")
}

static PARAMS: Lazy<Regex> = Lazy::new(|| placeholder_regex(r"params"));
static LEGACY_PARAMS: Lazy<Regex> = Lazy::new(|| placeholder_regex(r"(?:inputs|outputs)\.params"));
static RESOURCES: Lazy<Regex> = Lazy::new(|| placeholder_regex(r"resources\.(?:inputs|outputs)"));
static LEGACY_RESOURCES: Lazy<Regex> =
    Lazy::new(|| placeholder_regex(r"(?:inputs|outputs)\.resources"));

/// Placeholder prefix family a reference is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `$(params.<name>)`
    Params,
    /// `$(inputs.params.<name>)` or `$(outputs.params.<name>)`
    LegacyParams,
    /// `$(resources.inputs.<name>)` or `$(resources.outputs.<name>)`
    Resources,
    /// `$(inputs.resources.<name>)` or `$(outputs.resources.<name>)`
    LegacyResources,
}

impl Scope {
    pub const ALL: [Scope; 4] = [
        Scope::Params,
        Scope::LegacyParams,
        Scope::Resources,
        Scope::LegacyResources,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            Self::Params => &*PARAMS,
            Self::LegacyParams => &*LEGACY_PARAMS,
            Self::Resources => &*RESOURCES,
            Self::LegacyResources => &*LEGACY_RESOURCES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::LegacyParams => "inputs.params",
            Self::Resources => "resources",
            Self::LegacyResources => "inputs.resources",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One placeholder found in a field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The variable referenced (first segment of the dotted name)
    pub name: String,
    /// Byte offset of `$`
    pub start: usize,
    /// Byte offset just past `)`
    pub end: usize,
    /// Whether the placeholder is the entire field value
    pub whole_field: bool,
}

/// Every placeholder of `scope` in `value`, in order of appearance.
pub fn find_references(value: &str, scope: Scope) -> Vec<Reference> {
    if !value.contains("$(") {
        return Vec::new();
    }
    scope
        .regex()
        .captures_iter(value)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let dotted = caps.get(1)?.as_str();
            let name = dotted.split('.').next().unwrap_or(dotted);
            Some(Reference {
                name: name.to_string(),
                start: whole.start(),
                end: whole.end(),
                whole_field: whole.start() == 0 && whole.end() == value.len(),
            })
        })
        .collect()
}

/// First reference to a name the namespace does not declare.
pub fn find_undeclared(value: &str, scope: Scope, ns: &VariableNamespace) -> Option<Reference> {
    find_references(value, scope)
        .into_iter()
        .find(|r| !ns.contains(&r.name))
}

/// First reference to an array variable, wherever it appears.
pub fn find_prohibited_array_use(
    value: &str,
    scope: Scope,
    ns: &VariableNamespace,
) -> Option<Reference> {
    find_references(value, scope)
        .into_iter()
        .find(|r| ns.is_array(&r.name))
}

/// First reference to an array variable that shares the field with anything
/// else.
pub fn find_non_isolated_array_use(
    value: &str,
    scope: Scope,
    ns: &VariableNamespace,
) -> Option<Reference> {
    find_references(value, scope)
        .into_iter()
        .find(|r| ns.is_array(&r.name) && !r.whole_field)
}

/// Where a scanned field lives, for error messages and paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Kind of object holding the field, e.g. `step`
    pub kind: &'static str,
    /// Path of the enclosing container, e.g. `taskspec.steps`
    pub context: &'static str,
}

/// Fields of task steps
pub const STEP_LOCATION: Location = Location {
    kind: "step",
    context: "taskspec.steps",
};

impl Location {
    fn error(&self, kind: ErrorKind, what: &str, field: &str, value: &str) -> FieldError {
        FieldError::new(
            kind,
            format!("{what} in {value:?} for {} {field}", self.kind),
            format!("{}.{field}", self.context),
        )
    }

    /// Every reference in `value` must be declared.
    pub fn validate_variable(
        &self,
        field: &str,
        value: &str,
        scope: Scope,
        ns: &VariableNamespace,
    ) -> Result<(), FieldError> {
        match find_undeclared(value, scope, ns) {
            Some(_) => Err(self.error(
                ErrorKind::UnresolvedVariableReference,
                "non-existent variable",
                field,
                value,
            )),
            None => Ok(()),
        }
    }

    /// No reference in `value` may name an array.
    pub fn validate_variable_prohibited(
        &self,
        field: &str,
        value: &str,
        scope: Scope,
        ns: &VariableNamespace,
    ) -> Result<(), FieldError> {
        match find_prohibited_array_use(value, scope, ns) {
            Some(_) => Err(self.error(
                ErrorKind::IllegalArraySplice,
                "variable type invalid",
                field,
                value,
            )),
            None => Ok(()),
        }
    }

    /// Array references in `value` must be the whole value.
    pub fn validate_variable_isolated(
        &self,
        field: &str,
        value: &str,
        scope: Scope,
        ns: &VariableNamespace,
    ) -> Result<(), FieldError> {
        match find_non_isolated_array_use(value, scope, ns) {
            Some(_) => Err(self.error(
                ErrorKind::IllegalArraySplice,
                "variable is not properly isolated",
                field,
                value,
            )),
            None => Ok(()),
        }
    }
}
