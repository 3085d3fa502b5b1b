//! Validation entry points.

use crate::config::ValidationConfig;
use crate::error::{ErrorKind, FieldError};
use crate::namespace::build_namespaces;
use crate::structure::check_structure;
use crate::types::{ObjectMeta, Task, TaskSpec};
use crate::variables::validate_references;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Checks object metadata (names, namespaces, labels) before the task body is
/// looked at. Errors are reported under `metadata`.
pub trait MetadataValidator: Send + Sync {
    fn validate(&self, metadata: &ObjectMeta) -> Result<(), FieldError>;
}

impl<F> MetadataValidator for F
where
    F: Fn(&ObjectMeta) -> Result<(), FieldError> + Send + Sync,
{
    fn validate(&self, metadata: &ObjectMeta) -> Result<(), FieldError> {
        self(metadata)
    }
}

/// Metadata validator that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyMetadata;

impl MetadataValidator for AcceptAnyMetadata {
    fn validate(&self, _metadata: &ObjectMeta) -> Result<(), FieldError> {
        Ok(())
    }
}

/// How far a validation pass got
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationStage {
    Start,
    MetadataChecked,
    StructurallyChecked,
    NamespaceBuilt,
    VariablesChecked,
    Valid,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::MetadataChecked => "metadata_checked",
            Self::StructurallyChecked => "structurally_checked",
            Self::NamespaceBuilt => "namespace_built",
            Self::VariablesChecked => "variables_checked",
            Self::Valid => "valid",
        };
        f.write_str(s)
    }
}

/// Validates task specifications.
///
/// Holds only immutable configuration, so one instance can be shared across
/// threads and reused for any number of documents.
#[derive(Clone)]
pub struct Validator {
    config: ValidationConfig,
    metadata: Arc<dyn MetadataValidator>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for configuring a validator
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a full task document: metadata first, then its `TaskSpec`.
    #[instrument(skip_all, fields(task = %task.metadata.name))]
    pub fn validate_task(&self, task: &Task) -> Result<(), FieldError> {
        let mut stage = ValidationStage::Start;
        let result = self
            .metadata
            .validate(&task.metadata)
            .map_err(|e| e.with_kind(ErrorKind::InvalidMetadata).via_field("metadata"))
            .and_then(|()| {
                stage = ValidationStage::MetadataChecked;
                self.check_spec(&task.spec, &mut stage)
            });
        report(stage, result)
    }

    /// Validate a spec on its own, without metadata.
    #[instrument(skip_all, fields(steps = spec.steps.len()))]
    pub fn validate_spec(&self, spec: &TaskSpec) -> Result<(), FieldError> {
        let mut stage = ValidationStage::MetadataChecked;
        let result = self.check_spec(spec, &mut stage);
        report(stage, result)
    }

    fn check_spec(&self, spec: &TaskSpec, stage: &mut ValidationStage) -> Result<(), FieldError> {
        check_structure(spec, &self.config)?;
        *stage = ValidationStage::StructurallyChecked;
        debug!(%stage, "structure consistent");

        let namespaces = build_namespaces(spec);
        *stage = ValidationStage::NamespaceBuilt;

        validate_references(&spec.steps, &namespaces)?;
        *stage = ValidationStage::VariablesChecked;
        debug!(%stage, "variable references resolved");

        *stage = ValidationStage::Valid;
        Ok(())
    }
}

fn report(stage: ValidationStage, result: Result<(), FieldError>) -> Result<(), FieldError> {
    match &result {
        Ok(()) => info!(%stage, "task specification is valid"),
        Err(e) => warn!(
            last_stage = %stage,
            kind = %e.kind,
            error = %e,
            "task specification rejected"
        ),
    }
    result
}

/// Builder for configuring a [`Validator`]
#[derive(Default)]
pub struct ValidatorBuilder {
    config: Option<ValidationConfig>,
    workspace_root: Option<String>,
    reserved_mount_prefix: Option<String>,
    allowed_mount_prefix: Option<String>,
    reserved_volume_name_prefix: Option<String>,
    metadata: Option<Arc<dyn MetadataValidator>>,
}

impl fmt::Debug for ValidatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorBuilder")
            .field("config", &self.config)
            .field("workspace_root", &self.workspace_root)
            .finish_non_exhaustive()
    }
}

impl ValidatorBuilder {
    /// Start from a complete configuration; individual setters still apply on top
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the root for workspaces without a mount path
    pub fn with_workspace_root(mut self, root: impl Into<String>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Set the mount path prefix steps may not use
    pub fn with_reserved_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_mount_prefix = Some(prefix.into());
        self
    }

    /// Set the carve-out under the reserved mount prefix
    pub fn with_allowed_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allowed_mount_prefix = Some(prefix.into());
        self
    }

    /// Set the volume mount name prefix steps may not use
    pub fn with_reserved_volume_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_volume_name_prefix = Some(prefix.into());
        self
    }

    /// Set the metadata validator used by [`Validator::validate_task`]
    pub fn with_metadata_validator(mut self, validator: impl MetadataValidator + 'static) -> Self {
        self.metadata = Some(Arc::new(validator));
        self
    }

    /// Build the validator
    pub fn build(self) -> Validator {
        let mut config = self.config.unwrap_or_default();
        if let Some(root) = self.workspace_root {
            config.workspace_root = root;
        }
        if let Some(prefix) = self.reserved_mount_prefix {
            config.reserved_mount_prefix = prefix;
        }
        if let Some(prefix) = self.allowed_mount_prefix {
            config.allowed_mount_prefix = prefix;
        }
        if let Some(prefix) = self.reserved_volume_name_prefix {
            config.reserved_volume_name_prefix = prefix;
        }
        Validator {
            config,
            metadata: self.metadata.unwrap_or_else(|| Arc::new(AcceptAnyMetadata)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use pretty_assertions::assert_eq;

    fn minimal_spec() -> TaskSpec {
        TaskSpec {
            steps: vec![Step {
                image: "busybox".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_builder_overrides_config() {
        let validator = Validator::builder()
            .with_config(ValidationConfig {
                workspace_root: "/mnt".into(),
                ..Default::default()
            })
            .with_reserved_volume_name_prefix("sys-")
            .build();
        assert_eq!(validator.config().workspace_root, "/mnt");
        assert_eq!(validator.config().reserved_volume_name_prefix, "sys-");
        assert_eq!(validator.config().reserved_mount_prefix, "/tekton/");
    }

    #[test]
    fn test_metadata_errors_are_rerooted() {
        let validator = Validator::builder()
            .with_metadata_validator(|meta: &ObjectMeta| {
                if meta.name.is_empty() {
                    Err(FieldError::missing_field("name"))
                } else {
                    Ok(())
                }
            })
            .build();

        let task = Task {
            spec: minimal_spec(),
            ..Default::default()
        };
        let err = validator.validate_task(&task).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMetadata);
        assert_eq!(err.paths, vec!["metadata.name"]);

        let mut task = task;
        task.metadata.name = "build".into();
        assert_eq!(validator.validate_task(&task), Ok(()));
    }

    #[test]
    fn test_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
    }

    #[test]
    fn test_stage_order() {
        assert!(ValidationStage::Start < ValidationStage::MetadataChecked);
        assert!(ValidationStage::VariablesChecked < ValidationStage::Valid);
        assert_eq!(ValidationStage::NamespaceBuilt.to_string(), "namespace_built");
    }
}
