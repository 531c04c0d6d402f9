// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};

use crate::errors::TransformError;
use crate::path::{strip_template, Path};

/// State visible to a step's argument templates.
///
/// Rendered as `{"input": ..., "steps": {id: result}, "item": ...}`; `item`
/// is present only inside a fan-out stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    input: Value,
    steps: Map<String, Value>,
    item: Option<Value>,
}

impl ExecutionContext {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            steps: Map::new(),
            item: None,
        }
    }

    /// Copy of this context for one fan-out stream, with `item` bound.
    pub fn for_stream(&self, item: Value) -> Self {
        Self {
            input: self.input.clone(),
            steps: self.steps.clone(),
            item: Some(item),
        }
    }

    pub fn record(&mut self, step_id: &str, result: Value) {
        self.steps.insert(step_id.to_string(), result);
    }

    pub fn result(&self, step_id: &str) -> Option<&Value> {
        self.steps.get(step_id)
    }

    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("input".to_string(), self.input.clone());
        out.insert("steps".to_string(), Value::Object(self.steps.clone()));
        if let Some(item) = &self.item {
            out.insert("item".to_string(), item.clone());
        }
        Value::Object(out)
    }

    /// Replaces every `${{ path }}` string in `args` with the value at that
    /// path. Resolution is strict; other values pass through untouched.
    pub fn resolve_args(&self, args: &Value) -> Result<Value, TransformError> {
        let root = self.to_value();
        resolve_templates(args, &root)
    }
}

fn resolve_templates(value: &Value, root: &Value) -> Result<Value, TransformError> {
    match value {
        Value::String(text) => match strip_template(text) {
            Some(path) => Ok(Path::parse(path)?.resolve_strict(root)?.clone()),
            None => Ok(value.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_templates(item, root))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut resolved = Map::new();
            for (key, item) in map {
                resolved.insert(key.clone(), resolve_templates(item, root)?);
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}
