//! Validation settings
//!
//! The reserved prefixes and default paths the structural checks consult. The
//! defaults match what the task runtime reserves for itself; override them
//! only when validating for a runtime configured differently.

use crate::error::{Error, Result};
use crate::types::DEFAULT_WORKSPACE_ROOT;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hint attached to step-name syntax errors.
pub const STEP_NAME_DETAILS: &str = "Task step name must be a valid DNS Label, For more info refer to https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#names";

/// Configuration for a [`crate::Validator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Steps may not mount anything under this prefix...
    pub reserved_mount_prefix: String,
    /// ...except under this one
    pub allowed_mount_prefix: String,
    /// Volume mount names may not start with this prefix
    pub reserved_volume_name_prefix: String,
    /// Root for workspaces that declare no mount path
    pub workspace_root: String,
    /// Details text attached to invalid step names
    pub step_name_details: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            reserved_mount_prefix: "/tekton/".to_string(),
            allowed_mount_prefix: "/tekton/home".to_string(),
            reserved_volume_name_prefix: "tekton-internal-".to_string(),
            workspace_root: DEFAULT_WORKSPACE_ROOT.to_string(),
            step_name_details: STEP_NAME_DETAILS.to_string(),
        }
    }
}

impl ValidationConfig {
    /// Load configuration from a JSON or YAML file. Missing keys keep their
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let config: Self = serde_json::from_str(&content)?;
                config.check()?;
                config
            }
            _ => Self::from_yaml_str(&content)?,
        };
        tracing::debug!(path = %path.display(), "loaded validation config");
        Ok(config)
    }

    /// Parse configuration from YAML (which also accepts JSON)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.workspace_root.is_empty() {
            return Err(Error::Config("workspaceRoot must not be empty".to_string()));
        }
        if !self.allowed_mount_prefix.is_empty()
            && !self.reserved_mount_prefix.is_empty()
            && !self.allowed_mount_prefix.starts_with(&self.reserved_mount_prefix)
        {
            return Err(Error::Config(format!(
                "allowedMountPrefix {:?} must lie under reservedMountPrefix {:?}",
                self.allowed_mount_prefix, self.reserved_mount_prefix
            )));
        }
        Ok(())
    }
}
