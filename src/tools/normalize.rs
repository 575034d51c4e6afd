// Rewrite pipeline YAML to satisfy Harness schema validation before submission.

use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Normalizes a pipeline document for deployment: forces the user-confirmed
/// identifier/name/description and the configured org/project onto the
/// `pipeline` mapping, drops the legacy `project` key, and repairs the
/// stage list (failure strategies, CI step types, approval executions).
///
/// Returns `None` when the text does not parse as YAML or has no top-level
/// `pipeline` key; callers submit the original text unchanged in that case.
/// Generated YAML often arrives malformed or truncated, and a broken
/// document must not block submission of whatever the model produced.
pub fn normalize_pipeline_yaml(
    yaml_content: &str,
    identifier: &str,
    name: &str,
    description: Option<&str>,
    org_id: &str,
    project_id: &str,
) -> Option<String> {
    let mut doc: Value = match serde_yaml::from_str(yaml_content) {
        Ok(doc) => doc,
        Err(err) => {
            debug!("pipeline YAML left unchanged, parse failed: {}", err);
            return None;
        }
    };

    let pipeline = doc.get_mut("pipeline")?.as_mapping_mut()?;

    pipeline.insert("identifier".into(), identifier.into());
    pipeline.insert("name".into(), name.into());
    if let Some(description) = description {
        pipeline.insert("description".into(), description.into());
    }

    // Generated YAML is not trusted to target the right project; always
    // point the document at the configured org/project.
    pipeline.insert("projectIdentifier".into(), project_id.into());
    pipeline.insert("orgIdentifier".into(), org_id.into());
    pipeline.remove("project");

    if let Some(stages) = pipeline.get_mut("stages").and_then(Value::as_sequence_mut) {
        for wrapper in stages {
            if let Some(stage) = wrapper.get_mut("stage").and_then(Value::as_mapping_mut) {
                repair_stage(stage);
            }
        }
    }

    serde_yaml::to_string(&doc).ok()
}

fn repair_stage(stage: &mut Mapping) {
    if !stage.contains_key("failureStrategies") {
        stage.insert("failureStrategies".into(), default_failure_strategies());
    }

    let stage_type = stage
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if stage_type == "CI" {
        rewrite_shell_script_steps(stage);
    }
    if stage_type == "Approval" {
        ensure_approval_execution(stage);
    }
}

// Harness rejects `ShellScript` as a CI step type; `Run` is the accepted one.
fn rewrite_shell_script_steps(stage: &mut Mapping) {
    let steps = stage
        .get_mut("spec")
        .and_then(|spec| spec.get_mut("execution"))
        .and_then(|execution| execution.get_mut("steps"))
        .and_then(Value::as_sequence_mut);

    let Some(steps) = steps else { return };
    for wrapper in steps {
        if let Some(step) = wrapper.get_mut("step").and_then(Value::as_mapping_mut) {
            if step.get("type").and_then(Value::as_str) == Some("ShellScript") {
                step.insert("type".into(), "Run".into());
            }
        }
    }
}

fn ensure_approval_execution(stage: &mut Mapping) {
    if let Some(spec) = stage.get_mut("spec").and_then(Value::as_mapping_mut) {
        if !spec.contains_key("execution") {
            spec.insert("execution".into(), default_approval_execution());
        }
    }
}

/// One strategy rolling the stage back on any error.
fn default_failure_strategies() -> Value {
    let mut action = Mapping::new();
    action.insert("type".into(), "StageRollback".into());

    let mut on_failure = Mapping::new();
    on_failure.insert("errors".into(), Value::Sequence(vec!["AllErrors".into()]));
    on_failure.insert("action".into(), Value::Mapping(action));

    let mut strategy = Mapping::new();
    strategy.insert("onFailure".into(), Value::Mapping(on_failure));

    Value::Sequence(vec![Value::Mapping(strategy)])
}

/// A single HarnessApproval step: one required reviewer, 1-day timeout.
fn default_approval_execution() -> Value {
    let mut approvers = Mapping::new();
    approvers.insert("minimumCount".into(), Value::Number(1.into()));
    approvers.insert("disallowPipelineExecutor".into(), Value::Bool(false));
    approvers.insert("userGroups".into(), Value::Sequence(Vec::new()));

    let mut spec = Mapping::new();
    spec.insert("approvalMessage".into(), "Please review and approve".into());
    spec.insert("includePipelineExecutionHistory".into(), Value::Bool(true));
    spec.insert("approvers".into(), Value::Mapping(approvers));

    let mut step = Mapping::new();
    step.insert("identifier".into(), "approval".into());
    step.insert("type".into(), "HarnessApproval".into());
    step.insert("name".into(), "Approval".into());
    step.insert("timeout".into(), "1d".into());
    step.insert("spec".into(), Value::Mapping(spec));

    let mut wrapper = Mapping::new();
    wrapper.insert("step".into(), Value::Mapping(step));

    let mut execution = Mapping::new();
    execution.insert("steps".into(), Value::Sequence(vec![Value::Mapping(wrapper)]));
    Value::Mapping(execution)
}
