//! Merging of the shared step template into individual steps.
//!
//! Scalars set on the step win over the template. `command` and `args` are
//! replaced wholesale when the step sets them. `env` entries are merged by
//! name and `volumeMounts` by mount path, with the step's entry replacing the
//! template's in place and new entries appended.

use crate::types::{EnvVar, Step, StepTemplate, VolumeMount};

/// Apply `template` to every step. Steps are returned unchanged when there is
/// no template.
pub fn merge_steps_with_template(template: Option<&StepTemplate>, steps: &[Step]) -> Vec<Step> {
    match template {
        Some(template) => steps.iter().map(|s| merge_step(template, s)).collect(),
        None => steps.to_vec(),
    }
}

fn merge_step(template: &StepTemplate, step: &Step) -> Step {
    Step {
        name: step.name.clone(),
        image: prefer_non_empty(&step.image, &template.image),
        command: prefer_non_empty_list(&step.command, &template.command),
        args: prefer_non_empty_list(&step.args, &template.args),
        script: step.script.clone(),
        working_dir: prefer_non_empty(&step.working_dir, &template.working_dir),
        env: merge_by_key(&template.env, &step.env, |e: &EnvVar| e.name.clone()),
        volume_mounts: merge_by_key(
            &template.volume_mounts,
            &step.volume_mounts,
            |v: &VolumeMount| v.mount_path.clone(),
        ),
    }
}

fn prefer_non_empty(primary: &str, fallback: &str) -> String {
    let chosen = if primary.is_empty() { fallback } else { primary };
    chosen.to_string()
}

fn prefer_non_empty_list(primary: &[String], fallback: &[String]) -> Vec<String> {
    let chosen = if primary.is_empty() { fallback } else { primary };
    chosen.to_vec()
}

fn merge_by_key<T: Clone>(base: &[T], overlay: &[T], key: impl Fn(&T) -> String) -> Vec<T> {
    let mut merged = base.to_vec();
    for item in overlay {
        let k = key(item);
        match merged.iter_mut().find(|existing| key(existing) == k) {
            Some(existing) => *existing = item.clone(),
            None => merged.push(item.clone()),
        }
    }
    merged
}
