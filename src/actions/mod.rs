// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The `core.transform` action set.
//!
//! Each action wraps one primitive from [`crate::transforms`] or one marker
//! from [`crate::fanout`] behind the [`Action`](crate::traits::Action) seam,
//! with a typed, named argument set decoded from a JSON object.

mod compact;
mod deduplicate;
mod fanout;
mod filter;
mod map;
mod membership;
mod reshape;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::TransformError;
use crate::expression::compile;
use crate::path::strip_template;
use crate::registry::ActionRegistryBuilder;
use crate::value::type_name;

pub use compact::CompactAction;
pub use deduplicate::DeduplicateAction;
pub use fanout::{GatherAction, ScatterAction};
pub use filter::FilterAction;
pub use map::{ApplyAction, MapAction};
pub use membership::{IsInAction, NotInAction};
pub use reshape::ReshapeAction;

pub const NAMESPACE: &str = "core.transform";
pub(crate) const DISPLAY_GROUP: &str = "Data Transform";

/// Registers every `core.transform` action on `builder`.
pub fn register_core_transforms(builder: ActionRegistryBuilder) -> ActionRegistryBuilder {
    builder
        .register(Arc::new(ReshapeAction))
        .register(Arc::new(FilterAction))
        .register(Arc::new(IsInAction))
        .register(Arc::new(NotInAction))
        .register(Arc::new(DeduplicateAction))
        .register(Arc::new(ApplyAction))
        .register(Arc::new(MapAction))
        .register(Arc::new(CompactAction))
        .register(Arc::new(ScatterAction))
        .register(Arc::new(GatherAction))
}

/// Decodes a named argument set, rejecting unknown and missing names.
pub(crate) fn parse_args<T: DeserializeOwned>(action: &str, args: &Value) -> Result<T, TransformError> {
    T::deserialize(args)
        .map_err(|e| TransformError::invalid_argument("args", format!("{}: {}", action, e)))
}

fn is_template(value: &Value) -> bool {
    matches!(value, Value::String(s) if strip_template(s).is_some())
}

/// Validation-time check: a list, or a template the engine resolves later.
pub(crate) fn check_list_or_template(argument: &str, value: &Value) -> Result<(), TransformError> {
    if value.is_array() || is_template(value) {
        Ok(())
    } else {
        Err(TransformError::invalid_argument(
            argument,
            format!("expected a list, found {}", type_name(value)),
        ))
    }
}

/// Validation-time check: compiles the expression unless it is a template.
pub(crate) fn check_expression(expression: &str) -> Result<(), TransformError> {
    if strip_template(expression).is_some() {
        return Ok(());
    }
    compile(expression)?;
    Ok(())
}

pub(crate) fn expect_list(argument: &str, value: Value) -> Result<Vec<Value>, TransformError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(TransformError::invalid_argument(
            argument,
            format!("expected a list, found {}", type_name(&other)),
        )),
    }
}

#[cfg(test)]
mod integration_tests;
