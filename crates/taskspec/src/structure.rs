//! Structural consistency checks.
//!
//! Name uniqueness, mount path conflicts, reserved prefixes, exclusive
//! declaration groups, and declared type validity. Each check returns the
//! first problem it finds.

use crate::config::ValidationConfig;
use crate::error::{ErrorKind, FieldError, CURRENT_FIELD};
use crate::template::merge_steps_with_template;
use crate::types::{
    ParamSpec, ParamType, ResourceType, Step, StepTemplate, TaskResource, TaskSpec, Volume,
    WorkspaceDeclaration,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

const DNS1123_LABEL_MAX_LENGTH: usize = 63;

static DNS1123_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("Invalid regex"));

/// Run every structural check in order.
pub fn check_structure(spec: &TaskSpec, config: &ValidationConfig) -> Result<(), FieldError> {
    if spec.is_empty() {
        return Err(FieldError::missing_field(CURRENT_FIELD));
    }
    if spec.steps.is_empty() {
        return Err(FieldError::missing_field("steps"));
    }

    validate_volumes(&spec.volumes).map_err(|e| e.via_field("volumes"))?;
    validate_declared_workspaces(
        &spec.workspaces,
        &spec.steps,
        spec.step_template.as_ref(),
        &config.workspace_root,
    )?;

    let merged = merge_steps_with_template(spec.step_template.as_ref(), &spec.steps);
    validate_steps(&merged, config).map_err(|e| e.via_field("steps"))?;

    validate_declaration_groups(spec)?;

    for (group, resources) in [
        ("inputs", spec.input_resources()),
        ("outputs", spec.output_resources()),
    ] {
        validate_task_resources(resources, &format!("taskspec.resources.{group}"))?;
    }
    validate_parameter_types(&spec.params, "taskspec.params")?;

    if let Some(inputs) = &spec.inputs {
        for resource in &inputs.resources {
            validate_resource_type(
                resource,
                &format!("taskspec.Inputs.Resources.{}.Type", resource.name),
            )?;
        }
        check_for_duplicates(&inputs.resources, "taskspec.Inputs.Resources.Name")?;
        validate_parameter_types(&inputs.params, "taskspec.inputs.params")?;
    }
    if let Some(outputs) = &spec.outputs {
        for resource in &outputs.resources {
            validate_resource_type(
                resource,
                &format!("taskspec.Outputs.Resources.{}.Type", resource.name),
            )?;
        }
        check_for_duplicates(&outputs.resources, "taskspec.Outputs.Resources.Name")?;
    }

    validate_step_names(&spec.steps, &config.step_name_details)
}

/// Declared volumes must have distinct names.
pub fn validate_volumes(volumes: &[Volume]) -> Result<(), FieldError> {
    let mut seen = HashSet::new();
    for (i, volume) in volumes.iter().enumerate() {
        if !seen.insert(volume.name.as_str()) {
            return Err(FieldError::new(
                ErrorKind::DuplicateName,
                format!("multiple volumes with same name {:?}", volume.name),
                "name",
            )
            .via_index(i));
        }
    }
    Ok(())
}

/// Workspace names must be distinct, and no workspace may mount where a step,
/// the step template, or an earlier workspace already mounts.
///
/// Step and template mount paths are collected first; workspaces are then
/// added one by one, so a collision between two workspaces is reported on the
/// later one.
pub fn validate_declared_workspaces(
    workspaces: &[WorkspaceDeclaration],
    steps: &[Step],
    template: Option<&StepTemplate>,
    workspace_root: &str,
) -> Result<(), FieldError> {
    let mut mount_paths: HashSet<String> = steps
        .iter()
        .flat_map(|s| s.volume_mounts.iter())
        .chain(template.into_iter().flat_map(|t| t.volume_mounts.iter()))
        .map(|vm| clean_path(&vm.mount_path))
        .collect();

    let mut names = HashSet::new();
    for (i, ws) in workspaces.iter().enumerate() {
        if !names.insert(ws.name.as_str()) {
            return Err(FieldError::new(
                ErrorKind::DuplicateName,
                format!("workspace name {:?} must be unique", ws.name),
                "name",
            )
            .via_field_index("workspaces", i));
        }
        let mount_path = clean_path(&ws.mount_path_under(workspace_root));
        if mount_paths.contains(&mount_path) {
            return Err(FieldError::new(
                ErrorKind::PathConflict,
                format!("workspace mount path {mount_path:?} must be unique"),
                "mountPath",
            )
            .via_field_index("workspaces", i));
        }
        debug!(workspace = %ws.name, %mount_path, "workspace mount path accepted");
        mount_paths.insert(mount_path);
    }
    Ok(())
}

/// Per-step checks on steps already merged with the step template.
pub fn validate_steps(steps: &[Step], config: &ValidationConfig) -> Result<(), FieldError> {
    let mut names = HashSet::new();
    for (idx, step) in steps.iter().enumerate() {
        if step.image.is_empty() {
            return Err(FieldError::missing_field("image").via_index(idx));
        }

        if !step.script.is_empty() && !step.command.is_empty() {
            return Err(FieldError::new(
                ErrorKind::MutuallyExclusiveFieldsSet,
                format!("step {idx} script cannot be used with command"),
                "script",
            )
            .via_index(idx));
        }

        if !step.name.is_empty() && !names.insert(step.name.as_str()) {
            return Err(
                FieldError::invalid_value(ErrorKind::DuplicateName, &step.name, "name")
                    .via_index(idx),
            );
        }

        for (j, vm) in step.volume_mounts.iter().enumerate() {
            if is_reserved_mount_path(&vm.mount_path, config) {
                return Err(FieldError::new(
                    ErrorKind::ReservedPrefix,
                    format!(
                        "step {idx} volumeMount cannot be mounted under {} (volumeMount {:?} mounted at {:?})",
                        config.reserved_mount_prefix, vm.name, vm.mount_path
                    ),
                    "mountPath",
                )
                .via_field_index("volumeMounts", j)
                .via_index(idx));
            }
            if !config.reserved_volume_name_prefix.is_empty()
                && vm.name.starts_with(&config.reserved_volume_name_prefix)
            {
                return Err(FieldError::new(
                    ErrorKind::ReservedPrefix,
                    format!(
                        "step {idx} volumeMount name {:?} cannot start with {:?}",
                        vm.name, config.reserved_volume_name_prefix
                    ),
                    "name",
                )
                .via_field_index("volumeMounts", j)
                .via_index(idx));
            }
        }
    }
    Ok(())
}

fn is_reserved_mount_path(mount_path: &str, config: &ValidationConfig) -> bool {
    !config.reserved_mount_prefix.is_empty()
        && mount_path.starts_with(&config.reserved_mount_prefix)
        && !mount_path.starts_with(&config.allowed_mount_prefix)
}

/// Legacy and new-style declarations of the same thing may not both be set.
pub fn validate_declaration_groups(spec: &TaskSpec) -> Result<(), FieldError> {
    if !spec.legacy_params().is_empty() && !spec.params.is_empty() {
        return Err(FieldError::multiple_one_of(["inputs.params", "params"]));
    }
    if !spec.legacy_input_resources().is_empty() && !spec.input_resources().is_empty() {
        return Err(FieldError::multiple_one_of(["inputs.resources", "resources.inputs"]));
    }
    if !spec.legacy_output_resources().is_empty() && !spec.output_resources().is_empty() {
        return Err(FieldError::multiple_one_of(["outputs.resources", "resources.outputs"]));
    }
    Ok(())
}

/// Resource types must be recognized and names unique, ignoring case.
/// `prefix` is the path of the list, e.g. `taskspec.resources.inputs`.
pub fn validate_task_resources(resources: &[TaskResource], prefix: &str) -> Result<(), FieldError> {
    for resource in resources {
        validate_resource_type(resource, &format!("{prefix}.{}.Type", resource.name))?;
    }
    check_for_duplicates(resources, &format!("{prefix}.name"))
}

pub fn validate_resource_type(resource: &TaskResource, path: &str) -> Result<(), FieldError> {
    if resource.resource_type.is_known() {
        return Ok(());
    }
    Err(FieldError::invalid_value(
        ErrorKind::InvalidEnumValue,
        &resource.resource_type,
        path,
    )
    .with_details(allowed_values(&ResourceType::ALL)))
}

fn allowed_values<T: std::fmt::Display>(values: &[T]) -> String {
    let names: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("must be one of: {}", names.join(", "))
}

pub fn check_for_duplicates(resources: &[TaskResource], path: &str) -> Result<(), FieldError> {
    let mut encountered = HashSet::new();
    for resource in resources {
        if !encountered.insert(resource.name.to_lowercase()) {
            return Err(FieldError::multiple_one_of([path]).with_kind(ErrorKind::DuplicateName));
        }
    }
    Ok(())
}

/// Parameter types must be recognized, and defaults must carry the declared
/// type. `prefix` is the path of the list, e.g. `taskspec.params`.
pub fn validate_parameter_types(params: &[ParamSpec], prefix: &str) -> Result<(), FieldError> {
    for param in params {
        let type_path = format!("{prefix}.{}.type", param.name);
        if !param.param_type.is_known() {
            return Err(FieldError::invalid_value(
                ErrorKind::InvalidEnumValue,
                &param.param_type,
                type_path,
            )
            .with_details(allowed_values(&ParamType::ALL)));
        }
        if let Some(default) = &param.default {
            let default_type = default.param_type();
            if default_type != param.param_type {
                return Err(FieldError::new(
                    ErrorKind::TypeMismatch,
                    format!(
                        "{:?} type does not match default value's type: {:?}",
                        param.param_type.as_str(),
                        default_type.as_str()
                    ),
                    type_path,
                )
                .with_path(format!("{prefix}.{}.default.type", param.name)));
            }
        }
    }
    Ok(())
}

/// Non-empty step names must be DNS-1123 labels.
pub fn validate_step_names(steps: &[Step], details: &str) -> Result<(), FieldError> {
    for step in steps {
        if !step.name.is_empty() && !is_dns1123_label(&step.name) {
            return Err(FieldError::new(
                ErrorKind::InvalidNameSyntax,
                format!("invalid value {:?}", step.name),
                "taskspec.steps.name",
            )
            .with_details(details));
        }
    }
    Ok(())
}

pub fn is_dns1123_label(value: &str) -> bool {
    value.len() <= DNS1123_LABEL_MAX_LENGTH && DNS1123_LABEL.is_match(value)
}

/// Lexically normalize a slash-separated path: collapse repeated separators,
/// drop `.` segments, resolve `..` against the preceding segment, and strip
/// any trailing slash. An empty path becomes `.`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
