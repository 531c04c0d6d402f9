// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline validation.
//!
//! Everything an author can get wrong without running the pipeline is caught
//! here, and every finding is reported at once:
//!
//! 1. **Uniqueness**: step ids are unique
//! 2. **References**: every action is registered
//! 3. **Arguments**: each step's arguments pass its action's static checks,
//!    so malformed expressions and paths fail before any data is touched
//! 4. **Fan pairing**: every scatter is closed by a later gather and every
//!    gather closes an open scatter; pairs nest like parentheses
//!
//! # Example
//! ```rust
//! use dagwood_transforms::config::{validate_pipeline, PipelineConfig, StepConfig, ExecutorOptions};
//! use dagwood_transforms::registry::ActionRegistry;
//! use serde_json::json;
//!
//! let registry = ActionRegistry::with_core_transforms().unwrap();
//! let config = PipelineConfig {
//!     executor_options: ExecutorOptions::default(),
//!     steps: vec![StepConfig {
//!         id: "evens".to_string(),
//!         action: "core.transform.filter".to_string(),
//!         args: json!({"items": [1, 2], "python_lambda": "lambda x: x % 2 == 0"}),
//!     }],
//! };
//!
//! assert!(validate_pipeline(&config, &registry).is_ok());
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::config::loader::{PipelineConfig, StepConfig};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    DuplicateStepId, InvalidStepArguments, UnbalancedFanOut, UnknownActionReferenced,
};
use crate::observability::messages::StructuredLog;
use crate::registry::ActionRegistry;
use crate::traits::ActionIntent;

pub fn validate_pipeline(
    config: &PipelineConfig,
    registry: &ActionRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_unique_step_ids(&config.steps));
    errors.extend(validate_step_actions(&config.steps, registry));
    if let Err(fan_errors) = pair_fan_steps(&config.steps, registry) {
        errors.extend(fan_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_step_ids(steps: &[StepConfig]) -> Vec<ValidationError> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for step in steps {
        if !seen_ids.insert(step.id.as_str()) {
            DuplicateStepId { step_id: &step.id }.log();
            errors.push(ValidationError::DuplicateStepId {
                step_id: step.id.clone(),
            });
        }
    }

    errors
}

fn validate_step_actions(steps: &[StepConfig], registry: &ActionRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for step in steps {
        let Some(action) = registry.get(&step.action) else {
            UnknownActionReferenced {
                step_id: &step.id,
                action: &step.action,
            }
            .log();
            errors.push(ValidationError::UnknownAction {
                step_id: step.id.clone(),
                action: step.action.clone(),
            });
            continue;
        };

        if let Err(error) = action.validate(&step.args) {
            InvalidStepArguments {
                step_id: &step.id,
                action: &step.action,
                error: &error,
            }
            .log();
            errors.push(ValidationError::InvalidStepArguments {
                step_id: step.id.clone(),
                error,
            });
        }
    }

    errors
}

/// Matches each scatter step to the gather that closes it.
///
/// Returns scatter index to gather index. Steps whose action is not
/// registered are treated as ordinary compute steps.
pub fn pair_fan_steps(
    steps: &[StepConfig],
    registry: &ActionRegistry,
) -> Result<BTreeMap<usize, usize>, Vec<ValidationError>> {
    let mut open: Vec<usize> = Vec::new();
    let mut pairs = BTreeMap::new();
    let mut errors = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let intent = registry
            .get(&step.action)
            .map_or(ActionIntent::Compute, |action| action.intent());

        match intent {
            ActionIntent::Compute => {}
            ActionIntent::FanOut => open.push(index),
            ActionIntent::FanIn => match open.pop() {
                Some(scatter) => {
                    pairs.insert(scatter, index);
                }
                None => {
                    UnbalancedFanOut {
                        step_id: &step.id,
                        reason: "gathers without an open scatter",
                    }
                    .log();
                    errors.push(ValidationError::UnmatchedGather {
                        step_id: step.id.clone(),
                    });
                }
            },
        }
    }

    for scatter in open {
        let step_id = &steps[scatter].id;
        UnbalancedFanOut {
            step_id,
            reason: "scatters but is never gathered",
        }
        .log();
        errors.push(ValidationError::UnclosedScatter {
            step_id: step_id.clone(),
        });
    }

    if errors.is_empty() {
        Ok(pairs)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::ExecutorOptions;
    use crate::errors::ErrorKind;
    use serde_json::{json, Value};

    fn step(id: &str, action: &str, args: Value) -> StepConfig {
        StepConfig {
            id: id.to_string(),
            action: format!("core.transform.{}", action),
            args,
        }
    }

    fn pipeline(steps: Vec<StepConfig>) -> PipelineConfig {
        PipelineConfig {
            executor_options: ExecutorOptions::default(),
            steps,
        }
    }

    fn scatter(id: &str) -> StepConfig {
        step(id, "scatter", json!({"collection": "${{ input.items }}"}))
    }

    fn gather(id: &str) -> StepConfig {
        step(id, "gather", json!({"items": "steps.inner"}))
    }

    fn registry() -> ActionRegistry {
        ActionRegistry::with_core_transforms().unwrap()
    }

    #[test]
    fn test_valid_nested_fan_out() {
        let steps = vec![
            scatter("outer"),
            scatter("inner_scatter"),
            step("inner", "apply", json!({"value": "${{ item }}", "python_lambda": "lambda x: x"})),
            gather("inner_gather"),
            gather("outer_gather"),
        ];
        let pairs = pair_fan_steps(&steps, &registry()).unwrap();
        assert_eq!(pairs.get(&0), Some(&4));
        assert_eq!(pairs.get(&1), Some(&3));
        assert!(validate_pipeline(&pipeline(steps), &registry()).is_ok());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let steps = vec![
            step("a", "compact", json!({"items": []})),
            step("a", "compact", json!({"items": []})),
            step("b", "explode", json!({})),
            step("c", "filter", json!({"items": [], "python_lambda": "import os"})),
            gather("g"),
            scatter("s"),
        ];

        let errors = validate_pipeline(&pipeline(steps), &registry()).unwrap_err();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.contains(&ValidationError::DuplicateStepId { step_id: "a".into() }));
        assert!(errors.contains(&ValidationError::UnknownAction {
            step_id: "b".into(),
            action: "core.transform.explode".into(),
        }));
        assert!(errors.contains(&ValidationError::UnmatchedGather { step_id: "g".into() }));
        assert!(errors.contains(&ValidationError::UnclosedScatter { step_id: "s".into() }));

        let compile_error = errors.iter().find_map(|e| match e {
            ValidationError::InvalidStepArguments { step_id, error } if step_id == "c" => Some(error),
            _ => None,
        });
        assert_eq!(compile_error.map(|e| e.kind()), Some(ErrorKind::Compilation));
    }

    #[test]
    fn test_argument_shape_errors() {
        let cases = vec![
            step("unknown_arg", "compact", json!({"items": [], "extra": true})),
            step("missing_arg", "map", json!({"items": []})),
            step("not_a_list", "compact", json!({"items": 5})),
            step("bad_path", "deduplicate", json!({"items": [], "keys": ["a..b"]})),
            step("bad_strategy", "gather", json!({"items": "x", "error_strategy": "retry"})),
        ];

        for case in cases {
            let id = case.id.clone();
            let errors = validate_pipeline(&pipeline(vec![case]), &registry()).unwrap_err();
            let found = errors.iter().any(|e| {
                matches!(e, ValidationError::InvalidStepArguments { error, .. } if error.kind() == ErrorKind::InvalidArgument)
            });
            assert!(found, "{}: {:?}", id, errors);
        }
    }

    #[test]
    fn test_expression_alias_accepted() {
        let steps = vec![step(
            "m",
            "map",
            json!({"items": "${{ input.rows }}", "expression": "x -> x"}),
        )];
        assert!(validate_pipeline(&pipeline(steps), &registry()).is_ok());
    }
}
