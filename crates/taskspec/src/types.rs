//! Task specification data model.
//!
//! These types mirror the document format field for field (camelCase on the
//! wire). They are plain data: validation never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Directory under which workspaces without an explicit mount path are mounted.
pub const DEFAULT_WORKSPACE_ROOT: &str = "/workspace";

/// A complete task document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TaskSpec,
}

/// Object metadata carried through to the metadata validator untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// The body of a task: its steps and everything they may reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    /// Deprecated input declarations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Inputs>,
    /// Deprecated output declarations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Outputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<TaskResources>,
    /// Container defaults merged into every step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_template: Option<StepTemplate>,
}

impl TaskSpec {
    /// True when nothing at all is declared
    pub fn is_empty(&self) -> bool {
        *self == TaskSpec::default()
    }

    /// Legacy input parameters, if any
    pub fn legacy_params(&self) -> &[ParamSpec] {
        self.inputs.as_ref().map(|i| i.params.as_slice()).unwrap_or_default()
    }

    /// Legacy input resources, if any
    pub fn legacy_input_resources(&self) -> &[TaskResource] {
        self.inputs
            .as_ref()
            .map(|i| i.resources.as_slice())
            .unwrap_or_default()
    }

    /// Legacy output resources, if any
    pub fn legacy_output_resources(&self) -> &[TaskResource] {
        self.outputs
            .as_ref()
            .map(|o| o.resources.as_slice())
            .unwrap_or_default()
    }

    /// New-style input resources, if any
    pub fn input_resources(&self) -> &[TaskResource] {
        self.resources
            .as_ref()
            .map(|r| r.inputs.as_slice())
            .unwrap_or_default()
    }

    /// New-style output resources, if any
    pub fn output_resources(&self) -> &[TaskResource] {
        self.resources
            .as_ref()
            .map(|r| r.outputs.as_slice())
            .unwrap_or_default()
    }
}

/// One execution unit of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Inline script, exclusive with `command`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

/// Container defaults shared by every step of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// A volume available to the task's steps.
///
/// Only the name matters for validation; the source definition is carried
/// through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: BTreeMap<String, serde_json::Value>,
}

/// A named mount point that a run binds to storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl WorkspaceDeclaration {
    /// The declared mount path, or `<root>/<name>` when none is declared
    pub fn mount_path_under(&self, root: &str) -> String {
        if !self.mount_path.is_empty() {
            return self.mount_path.clone();
        }
        format!("{}/{}", root.trim_end_matches('/'), self.name)
    }

    /// Mount path resolved against [`DEFAULT_WORKSPACE_ROOT`]
    pub fn resolved_mount_path(&self) -> String {
        self.mount_path_under(DEFAULT_WORKSPACE_ROOT)
    }
}

/// Deprecated input declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<TaskResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
}

/// Deprecated output declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<TaskResource>,
}

/// Resource declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<TaskResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TaskResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// A declared parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ArrayOrString>,
}

impl ParamSpec {
    pub fn is_array(&self) -> bool {
        self.param_type == ParamType::Array
    }
}

/// Declared type of a parameter.
///
/// Unrecognized type names are kept verbatim so they can be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    #[default]
    String,
    Array,
    Unknown(String),
}

impl ParamType {
    /// Every recognized parameter type
    pub const ALL: [ParamType; 2] = [ParamType::String, ParamType::Array];

    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Array => "array",
            Self::Unknown(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for ParamType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => Self::String,
            "array" => Self::Array,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ParamType> for String {
    fn from(value: ParamType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value: either a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayOrString {
    String(String),
    Array(Vec<String>),
}

impl ArrayOrString {
    /// The type this value is tagged with
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Array(_) => ParamType::Array,
        }
    }
}

/// Kind of a declared resource.
///
/// Unrecognized kinds are kept verbatim so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Git,
    Storage,
    Image,
    Cluster,
    PullRequest,
    CloudEvent,
    Unknown(String),
}

impl ResourceType {
    /// Every recognized resource type
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Git,
        ResourceType::Storage,
        ResourceType::Image,
        ResourceType::Cluster,
        ResourceType::PullRequest,
        ResourceType::CloudEvent,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Git => "git",
            Self::Storage => "storage",
            Self::Image => "image",
            Self::Cluster => "cluster",
            Self::PullRequest => "pullRequest",
            Self::CloudEvent => "cloudEvent",
            Self::Unknown(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "git" => Self::Git,
            "storage" => Self::Storage,
            "image" => Self::Image,
            "cluster" => Self::Cluster,
            "pullRequest" => Self::PullRequest,
            "cloudEvent" => Self::CloudEvent,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.as_str().to_string()
    }
}

/// A missing type is not defaulted to any kind; it stays unrecognized.
impl Default for ResourceType {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
