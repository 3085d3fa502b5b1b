//! Variable usage rules for step fields.
//!
//! Every string field of every step may reference scalar variables anywhere.
//! Array variables may only appear as an entire `command` or `args` token;
//! anywhere else they are rejected.

use crate::error::FieldError;
use crate::namespace::VariableNamespace;
use crate::substitution::{Scope, STEP_LOCATION};
use crate::types::Step;
use tracing::debug;

/// How array references are treated in a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayRule {
    /// Arrays may not be referenced at all
    Prohibited,
    /// Arrays must be the whole value
    Isolated,
}

/// A scannable string field of a step, with its path label
struct StepField<'a> {
    label: String,
    value: &'a str,
    rule: ArrayRule,
}

/// Fields of `step` in scanning order: name, image, workingDir, command,
/// args, env values, then each volume mount's name, mount path and sub path.
fn step_fields(step: &Step) -> Vec<StepField<'_>> {
    let mut fields = vec![
        StepField {
            label: "name".to_string(),
            value: &step.name,
            rule: ArrayRule::Prohibited,
        },
        StepField {
            label: "image".to_string(),
            value: &step.image,
            rule: ArrayRule::Prohibited,
        },
        StepField {
            label: "workingDir".to_string(),
            value: &step.working_dir,
            rule: ArrayRule::Prohibited,
        },
    ];
    fields.extend(step.command.iter().enumerate().map(|(i, cmd)| StepField {
        label: format!("command[{i}]"),
        value: cmd,
        rule: ArrayRule::Isolated,
    }));
    fields.extend(step.args.iter().enumerate().map(|(i, arg)| StepField {
        label: format!("arg[{i}]"),
        value: arg,
        rule: ArrayRule::Isolated,
    }));
    fields.extend(step.env.iter().map(|env| StepField {
        label: format!("env[{}]", env.name),
        value: &env.value,
        rule: ArrayRule::Prohibited,
    }));
    for (i, vm) in step.volume_mounts.iter().enumerate() {
        for (suffix, value) in [
            ("Name", &vm.name),
            ("MountPath", &vm.mount_path),
            ("SubPath", &vm.sub_path),
        ] {
            fields.push(StepField {
                label: format!("volumeMount[{i}].{suffix}"),
                value: value.as_str(),
                rule: ArrayRule::Prohibited,
            });
        }
    }
    fields
}

/// Every reference of `scope` in every step must name a declared variable.
pub fn validate_variables(
    steps: &[Step],
    scope: Scope,
    ns: &VariableNamespace,
) -> Result<(), FieldError> {
    for step in steps {
        for field in step_fields(step) {
            STEP_LOCATION.validate_variable(&field.label, field.value, scope, ns)?;
        }
    }
    Ok(())
}

/// Array variables of `scope` may only be referenced as whole command or
/// argument tokens.
pub fn validate_array_usage(
    steps: &[Step],
    scope: Scope,
    ns: &VariableNamespace,
) -> Result<(), FieldError> {
    if !ns.has_arrays() {
        return Ok(());
    }
    for step in steps {
        for field in step_fields(step) {
            match field.rule {
                ArrayRule::Prohibited => STEP_LOCATION.validate_variable_prohibited(
                    &field.label,
                    field.value,
                    scope,
                    ns,
                )?,
                ArrayRule::Isolated => STEP_LOCATION.validate_variable_isolated(
                    &field.label,
                    field.value,
                    scope,
                    ns,
                )?,
            }
        }
    }
    Ok(())
}

/// Check every scope in order: all references declared first, then array
/// placement.
pub fn validate_references(
    steps: &[Step],
    namespaces: &[(Scope, VariableNamespace)],
) -> Result<(), FieldError> {
    for (scope, ns) in namespaces {
        debug!(%scope, declared = ns.len(), "checking variable references");
        validate_variables(steps, *scope, ns)?;
        validate_array_usage(steps, *scope, ns)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{EnvVar, VolumeMount};
    use pretty_assertions::assert_eq;

    fn ns(scalars: &[&str], arrays: &[&str]) -> VariableNamespace {
        let mut ns = VariableNamespace::new();
        for s in scalars {
            ns.declare(s, false);
        }
        for a in arrays {
            ns.declare(a, true);
        }
        ns
    }

    fn step_with_command(command: &[&str]) -> Step {
        Step {
            image: "busybox".into(),
            command: command.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_field_order() {
        let step = Step {
            name: "n".into(),
            image: "i".into(),
            working_dir: "w".into(),
            command: vec!["c".into()],
            args: vec!["a".into(), "b".into()],
            env: vec![EnvVar {
                name: "HOME".into(),
                value: "h".into(),
            }],
            volume_mounts: vec![VolumeMount {
                name: "v".into(),
                mount_path: "/v".into(),
                sub_path: "s".into(),
                read_only: false,
            }],
            ..Default::default()
        };
        let labels: Vec<_> = step_fields(&step).into_iter().map(|f| f.label).collect();
        assert_eq!(
            labels,
            vec![
                "name",
                "image",
                "workingDir",
                "command[0]",
                "arg[0]",
                "arg[1]",
                "env[HOME]",
                "volumeMount[0].Name",
                "volumeMount[0].MountPath",
                "volumeMount[0].SubPath",
            ]
        );
    }

    #[test]
    fn test_isolated_array_token_passes() {
        let steps = vec![step_with_command(&["echo", "$(params.arr)"])];
        let ns = ns(&[], &["arr"]);
        assert_eq!(validate_variables(&steps, Scope::Params, &ns), Ok(()));
        assert_eq!(validate_array_usage(&steps, Scope::Params, &ns), Ok(()));
    }

    #[test]
    fn test_spliced_array_token_fails() {
        let steps = vec![step_with_command(&["echo-$(params.arr)"])];
        let err = validate_array_usage(&steps, Scope::Params, &ns(&[], &["arr"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalArraySplice);
        assert_eq!(err.paths, vec!["taskspec.steps.command[0]"]);
    }

    #[test]
    fn test_array_prohibited_outside_command_and_args() {
        let steps = vec![Step {
            image: "$(params.arr)".into(),
            ..Default::default()
        }];
        let err = validate_array_usage(&steps, Scope::Params, &ns(&[], &["arr"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalArraySplice);
        assert_eq!(err.paths, vec!["taskspec.steps.image"]);
        assert!(err.message.starts_with("variable type invalid"));
    }

    #[test]
    fn test_scalar_embedded_in_env_passes() {
        let steps = vec![Step {
            image: "busybox".into(),
            env: vec![EnvVar {
                name: "GREETING".into(),
                value: "hello $(params.p)!".into(),
            }],
            ..Default::default()
        }];
        let ns = ns(&["p"], &[]);
        assert_eq!(validate_references(&steps, &[(Scope::Params, ns)]), Ok(()));
    }

    #[test]
    fn test_undeclared_reported_before_array_misuse() {
        let steps = vec![
            step_with_command(&["x-$(params.arr)"]),
            Step {
                image: "busybox".into(),
                args: vec!["$(params.missing)".into()],
                ..Default::default()
            },
        ];
        let err = validate_references(&steps, &[(Scope::Params, ns(&[], &["arr"]))]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedVariableReference);
        assert_eq!(err.paths, vec!["taskspec.steps.arg[0]"]);
    }

    #[test]
    fn test_volume_mount_paths() {
        let steps = vec![Step {
            image: "busybox".into(),
            volume_mounts: vec![
                VolumeMount {
                    name: "a".into(),
                    mount_path: "/a".into(),
                    ..Default::default()
                },
                VolumeMount::default(),
                VolumeMount {
                    name: "c".into(),
                    mount_path: "/c/$(params.dir)".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }];
        let err = validate_variables(&steps, Scope::Params, &ns(&[], &[])).unwrap_err();
        assert_eq!(err.paths, vec!["taskspec.steps.volumeMount[2].MountPath"]);
    }
}
