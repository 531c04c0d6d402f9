// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::errors::TransformError;

/// How the engine must treat a step that names this action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionIntent {
    /// Invoked with its arguments, produces one value.
    Compute,
    /// Planned by the engine into N streams; never invoked.
    FanOut,
    /// Joins the streams of the enclosing fan-out; never invoked.
    FanIn,
}

/// Catalog metadata for a registered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSpec {
    pub namespace: &'static str,
    pub name: &'static str,
    pub default_title: &'static str,
    pub description: &'static str,
    pub display_group: &'static str,
}

impl ActionSpec {
    /// Fully qualified key, e.g. `core.transform.filter`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

#[async_trait]
pub trait Action: Send + Sync {
    fn spec(&self) -> &ActionSpec;

    fn intent(&self) -> ActionIntent {
        ActionIntent::Compute
    }

    /// Static argument check, run before any pipeline executes.
    fn validate(&self, _args: &Value) -> Result<(), TransformError> {
        Ok(())
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError>;
}
