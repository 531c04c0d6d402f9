// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io::Write;

use crate::config::{load_and_validate_config, load_config, StepConfig};
use crate::errors::{ConfigError, ErrorKind, ValidationError};
use crate::registry::ActionRegistry;

fn registry() -> ActionRegistry {
    ActionRegistry::with_core_transforms().unwrap()
}

fn ids(steps: &[StepConfig]) -> Vec<&str> {
    steps.iter().map(|step| step.id.as_str()).collect()
}

/// Test that the sample YAML fan-out pipeline loads and validates
#[test]
fn test_order_fanout_yaml_loading() {
    let config = load_and_validate_config("configs/order-fanout.yaml", &registry()).unwrap();

    assert_eq!(config.executor_options.max_concurrency, Some(2));
    assert_eq!(
        ids(&config.steps),
        vec!["open_orders", "per_order", "score", "scores", "clean"]
    );
    assert_eq!(config.steps[1].action, "core.transform.scatter");
    assert_eq!(config.steps[3].args["error_strategy"], "partition");
}

#[test]
fn test_customer_dedupe_json_loading() {
    let config = load_and_validate_config("configs/customer-dedupe.json", &registry()).unwrap();

    assert_eq!(config.executor_options.max_concurrency, None);
    assert_eq!(ids(&config.steps), vec!["customers", "vip", "names"]);
    assert_eq!(config.steps[0].args["keys"][0], "customer.id");
}

#[test]
fn test_tag_cleanup_toml_loading() {
    let config = load_and_validate_config("configs/tag-cleanup.toml", &registry()).unwrap();

    assert_eq!(config.executor_options.max_concurrency, Some(1));
    assert_eq!(ids(&config.steps), vec!["present", "allowed", "shouting"]);
}

#[test]
fn test_invalid_pipeline_reports_every_problem() {
    let err = load_and_validate_config("configs/invalid-pipeline.yaml", &registry()).unwrap_err();

    let ConfigError::Validation(errors) = &err else {
        panic!("expected validation errors, got {}", err);
    };
    assert!(errors.contains(&ValidationError::DuplicateStepId {
        step_id: "broken".into()
    }));
    assert!(errors.contains(&ValidationError::UnmatchedGather {
        step_id: "broken".into()
    }));
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::InvalidStepArguments { error, .. } if error.kind() == ErrorKind::Compilation
    )));
    assert!(err.to_string().starts_with("pipeline validation failed: "));
}

/// Unvalidated loading accepts structurally sound but semantically wrong files
#[test]
fn test_load_without_validation() {
    let config = load_config("configs/invalid-pipeline.yaml").unwrap();
    assert_eq!(config.steps.len(), 2);
}

#[test]
fn test_unknown_action_in_temp_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "steps:\n  - id: x\n    action: core.transform.explode\n    args: {{}}"
    )
    .unwrap();

    let err = load_and_validate_config(file.path(), &registry()).unwrap_err();
    match err {
        ConfigError::Validation(errors) => assert_eq!(
            errors,
            vec![ValidationError::UnknownAction {
                step_id: "x".into(),
                action: "core.transform.explode".into(),
            }]
        ),
        other => panic!("expected validation errors, got {}", other),
    }
}
