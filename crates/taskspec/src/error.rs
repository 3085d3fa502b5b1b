//! Error types for task specification validation
//!
//! Validation failures are reported as a [`FieldError`]: a message, the field
//! paths it applies to, and an optional free-text hint. Everything else that can
//! go wrong around validation (loading configuration, reading documents) is
//! covered by the crate-level [`Error`].

use std::fmt;
use thiserror::Error;

/// Path used when an error applies to the object being validated itself.
pub const CURRENT_FIELD: &str = "";

/// Result type alias for operations in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Category of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required field is absent or empty
    MissingRequiredField,
    /// Two fields that exclude each other are both set
    MutuallyExclusiveFieldsSet,
    /// A name that must be unique appears more than once
    DuplicateName,
    /// Two mounts resolve to the same path
    PathConflict,
    /// A mount path or mount name uses a prefix reserved for the system
    ReservedPrefix,
    /// A declared type is not one of the recognized values
    InvalidEnumValue,
    /// A default value does not match its declared type
    TypeMismatch,
    /// A placeholder names a variable that is not declared
    UnresolvedVariableReference,
    /// An array variable is used where only a scalar may appear
    IllegalArraySplice,
    /// A name does not satisfy the required syntax
    InvalidNameSyntax,
    /// Object metadata was rejected by the metadata validator
    InvalidMetadata,
}

impl ErrorKind {
    /// Returns a short, machine-friendly label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequiredField => "missing_required_field",
            Self::MutuallyExclusiveFieldsSet => "mutually_exclusive_fields_set",
            Self::DuplicateName => "duplicate_name",
            Self::PathConflict => "path_conflict",
            Self::ReservedPrefix => "reserved_prefix",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::TypeMismatch => "type_mismatch",
            Self::UnresolvedVariableReference => "unresolved_variable_reference",
            Self::IllegalArraySplice => "illegal_array_splice",
            Self::InvalidNameSyntax => "invalid_name_syntax",
            Self::InvalidMetadata => "invalid_metadata",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured validation failure.
///
/// Renders as `<message>: <path>, <path>` with the details hint on a second
/// line when present.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    /// Failure category
    #[serde(serialize_with = "serialize_kind")]
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
    /// Dot/bracket-indexed paths of the offending fields
    pub paths: Vec<String>,
    /// Optional remediation hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn serialize_kind<S: serde::Serializer>(
    kind: &ErrorKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.as_str())
}

impl FieldError {
    /// Create an error for a single path
    pub fn new(kind: ErrorKind, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            paths: vec![path.into()],
            details: None,
        }
    }

    /// A required field is missing
    pub fn missing_field(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingRequiredField, "missing field(s)", path)
    }

    /// A field holds a value that is not allowed
    pub fn invalid_value(
        kind: ErrorKind,
        value: impl fmt::Display,
        path: impl Into<String>,
    ) -> Self {
        Self::new(kind, format!("invalid value: {value}"), path)
    }

    /// More than one of a set of exclusive fields is populated
    pub fn multiple_one_of<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ErrorKind::MutuallyExclusiveFieldsSet,
            message: "expected exactly one, got both".to_string(),
            paths: paths.into_iter().map(Into::into).collect(),
            details: None,
        }
    }

    /// Replace the kind
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append another path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Attach a remediation hint
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Re-root every path under `field`.
    ///
    /// `name` becomes `field.name`, `[2]` becomes `field[2]` and the current
    /// field becomes `field` itself.
    pub fn via_field(mut self, field: &str) -> Self {
        for path in &mut self.paths {
            *path = if path.is_empty() {
                field.to_string()
            } else if path.starts_with('[') {
                format!("{field}{path}")
            } else {
                format!("{field}.{path}")
            };
        }
        self
    }

    /// Re-root every path under element `index` of a list.
    pub fn via_index(mut self, index: usize) -> Self {
        for path in &mut self.paths {
            *path = if path.is_empty() {
                format!("[{index}]")
            } else if path.starts_with('[') {
                format!("[{index}]{path}")
            } else {
                format!("[{index}].{path}")
            };
        }
        self
    }

    /// Re-root every path under `field[index]`.
    pub fn via_field_index(self, field: &str, index: usize) -> Self {
        self.via_index(index).via_field(field)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.paths.is_empty() {
            f.write_str(&self.message)?;
        } else {
            write!(f, "{}: {}", self.message, self.paths.join(", "))?;
        }
        if let Some(details) = &self.details {
            write!(f, "\n{details}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// Errors raised around validation: configuration and document loading.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_joins_paths() {
        let err = FieldError::multiple_one_of(["inputs.params", "params"]);
        assert_eq!(
            err.to_string(),
            "expected exactly one, got both: inputs.params, params"
        );
    }

    #[test]
    fn test_display_appends_details() {
        let err = FieldError::invalid_value(ErrorKind::InvalidNameSyntax, "\"Bad\"", "name")
            .with_details("see naming docs");
        assert_eq!(err.to_string(), "invalid value: \"Bad\": name\nsee naming docs");
    }

    #[test]
    fn test_via_field() {
        let err = FieldError::missing_field("name").via_field("volumes");
        assert_eq!(err.paths, vec!["volumes.name"]);

        let err = FieldError::missing_field(CURRENT_FIELD).via_field("spec");
        assert_eq!(err.paths, vec!["spec"]);

        let err = FieldError::missing_field("[0].name").via_field("steps");
        assert_eq!(err.paths, vec!["steps[0].name"]);
    }

    #[test]
    fn test_via_field_index() {
        let err = FieldError::missing_field("mountPath")
            .via_field_index("volumeMounts", 0)
            .via_field_index("steps", 2);
        assert_eq!(err.paths, vec!["steps[2].volumeMounts[0].mountPath"]);
    }

    #[test]
    fn test_serialize_uses_kind_label() {
        let err = FieldError::missing_field("steps");
        let json = serde_json::to_value(&err).expect("Should serialize");
        assert_eq!(json["kind"], "missing_required_field");
        assert_eq!(json["paths"][0], "steps");
        assert!(json.get("details").is_none());
    }
}
