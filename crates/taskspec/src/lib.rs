//! Static validation of task specifications
//!
//! A task is a list of container steps plus the parameters, resources,
//! volumes and workspaces they use. This crate checks a task before it runs:
//! names are unique, mount paths do not collide, reserved prefixes are left
//! alone, declared types are known, and every `$(...)` placeholder in a step
//! refers to something the task declares. Array parameters may only stand
//! alone as a whole `command` or `args` entry.
//!
//! ```rust
//! use taskspec::{Step, TaskSpec, Validator};
//!
//! let spec = TaskSpec {
//!     steps: vec![Step {
//!         image: "busybox".into(),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//! assert!(Validator::new().validate_spec(&spec).is_ok());
//! ```

pub mod config;
pub mod error;
pub mod namespace;
pub mod structure;
pub mod substitution;
pub mod template;
pub mod types;
pub mod validator;
pub mod variables;

pub use config::ValidationConfig;
pub use error::{Error, ErrorKind, FieldError, Result};
pub use namespace::VariableNamespace;
pub use substitution::{Reference, Scope};
pub use types::{
    ArrayOrString, EnvVar, Inputs, ObjectMeta, Outputs, ParamSpec, ParamType, ResourceType, Step,
    StepTemplate, Task, TaskResource, TaskResources, TaskSpec, Volume, VolumeMount,
    WorkspaceDeclaration,
};
pub use validator::{
    AcceptAnyMetadata, MetadataValidator, ValidationStage, Validator, ValidatorBuilder,
};

/// Validate a spec with the default configuration.
pub fn validate(spec: &TaskSpec) -> std::result::Result<(), FieldError> {
    Validator::new().validate_spec(spec)
}
