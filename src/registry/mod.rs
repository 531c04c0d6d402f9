// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Action catalog.
//!
//! Actions are registered explicitly through an [`ActionRegistryBuilder`] at
//! startup; there is no global registry. The built [`ActionRegistry`] is
//! immutable and can be shared behind an `Arc`.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::actions::register_core_transforms;
use crate::errors::{RegistryError, TransformError};
use crate::fanout::{GatherDescriptor, ScatterDescriptor, StepKind};
use crate::observability::messages::action::{
    ActionInvocationCompleted, ActionInvocationFailed, ActionInvocationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Action, ActionIntent, ActionSpec};
use crate::value::type_name;

#[derive(Default)]
pub struct ActionRegistryBuilder {
    actions: Vec<Arc<dyn Action>>,
}

impl ActionRegistryBuilder {
    pub fn register(mut self, action: Arc<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn build(self) -> Result<ActionRegistry, RegistryError> {
        let mut actions = BTreeMap::new();
        for action in self.actions {
            let spec = action.spec();
            if spec.namespace.is_empty() || spec.name.is_empty() {
                return Err(RegistryError::InvalidActionName {
                    namespace: spec.namespace.to_string(),
                    name: spec.name.to_string(),
                });
            }
            let key = spec.key();
            if actions.contains_key(&key) {
                return Err(RegistryError::DuplicateAction { action: key });
            }
            actions.insert(key, action);
        }
        Ok(ActionRegistry { actions })
    }
}

pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Registry holding the `core.transform` actions.
    pub fn with_core_transforms() -> Result<Self, RegistryError> {
        register_core_transforms(Self::builder()).build()
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    /// Specs of all registered actions, ordered by key.
    pub fn list(&self) -> Vec<&ActionSpec> {
        self.actions.values().map(|action| action.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn lookup(&self, key: &str) -> Result<&Arc<dyn Action>, TransformError> {
        self.actions
            .get(key)
            .ok_or_else(|| TransformError::UnknownAction {
                action: key.to_string(),
            })
    }

    pub fn validate(&self, key: &str, args: &Value) -> Result<(), TransformError> {
        self.lookup(key)?.validate(args)
    }

    /// Classifies a step so the engine can route fan-out and fan-in steps
    /// before anything is invoked.
    pub fn plan(&self, key: &str, args: &Value) -> Result<StepKind, TransformError> {
        match self.lookup(key)?.intent() {
            ActionIntent::Compute => Ok(StepKind::Compute),
            ActionIntent::FanOut => ScatterDescriptor::from_args(args).map(StepKind::FanOut),
            ActionIntent::FanIn => GatherDescriptor::from_args(args).map(StepKind::FanIn),
        }
    }

    pub async fn invoke(&self, key: &str, args: Value) -> Result<Value, TransformError> {
        let action = self.lookup(key)?;

        let start_msg = ActionInvocationStarted {
            action: key,
            argument_count: args.as_object().map_or(0, |map| map.len()),
        };
        let span = start_msg.span("action_invocation");
        span.in_scope(|| start_msg.log());

        let start_time = Instant::now();
        let result = action.invoke(args).instrument(span.clone()).await;
        let _guard = span.enter();

        match &result {
            Ok(output) => ActionInvocationCompleted {
                action: key,
                output_type: type_name(output),
                duration: start_time.elapsed(),
            }
            .log(),
            Err(error) => ActionInvocationFailed {
                action: key,
                kind: error.kind().as_str(),
                error,
            }
            .log(),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;

    static ECHO_SPEC: ActionSpec = ActionSpec {
        namespace: "test",
        name: "echo",
        default_title: "Echo",
        description: "Returns its arguments.",
        display_group: "Test",
    };

    static NAMELESS_SPEC: ActionSpec = ActionSpec {
        namespace: "test",
        name: "",
        default_title: "",
        description: "",
        display_group: "",
    };

    struct Echo;

    #[async_trait]
    impl Action for Echo {
        fn spec(&self) -> &ActionSpec {
            &ECHO_SPEC
        }

        async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
            Ok(args)
        }
    }

    struct Nameless;

    #[async_trait]
    impl Action for Nameless {
        fn spec(&self) -> &ActionSpec {
            &NAMELESS_SPEC
        }

        async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
            Ok(args)
        }
    }

    #[test]
    fn test_core_catalog() {
        let registry = ActionRegistry::with_core_transforms().unwrap();
        let keys: Vec<String> = registry.list().iter().map(|spec| spec.key()).collect();
        assert_eq!(
            keys,
            vec![
                "core.transform.apply",
                "core.transform.compact",
                "core.transform.deduplicate",
                "core.transform.filter",
                "core.transform.gather",
                "core.transform.is_in",
                "core.transform.map",
                "core.transform.not_in",
                "core.transform.reshape",
                "core.transform.scatter",
            ]
        );
        assert!(registry.list().iter().all(|spec| spec.display_group == "Data Transform"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let result = ActionRegistry::builder()
            .register(Arc::new(Echo))
            .register(Arc::new(Echo))
            .build();
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateAction {
                action: "test.echo".to_string()
            })
        );
    }

    #[test]
    fn test_empty_name_fails() {
        let result = ActionRegistry::builder().register(Arc::new(Nameless)).build();
        assert!(matches!(result, Err(RegistryError::InvalidActionName { .. })));
    }

    #[test]
    fn test_plan_routes_by_intent() {
        let registry = ActionRegistry::with_core_transforms().unwrap();

        let kind = registry
            .plan("core.transform.filter", &json!({"items": [], "python_lambda": "lambda x: x"}))
            .unwrap();
        assert_eq!(kind, StepKind::Compute);

        let kind = registry
            .plan("core.transform.scatter", &json!({"collection": [1, 2]}))
            .unwrap();
        assert!(matches!(kind, StepKind::FanOut(_)));

        let kind = registry
            .plan("core.transform.gather", &json!({"items": "steps.x"}))
            .unwrap();
        assert!(matches!(kind, StepKind::FanIn(_)));

        let err = registry.plan("core.transform.nope", &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAction);
    }

    #[tokio::test]
    async fn test_invoke_custom_action() {
        let registry = ActionRegistry::builder()
            .register(Arc::new(Echo))
            .build()
            .unwrap();
        let output = registry.invoke("test.echo", json!({"a": 1})).await.unwrap();
        assert_eq!(output, json!({"a": 1}));
        assert!(registry.contains("test.echo"));
        assert!(registry.get("core.transform.filter").is_none());
    }
}
