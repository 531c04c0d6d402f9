// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data-transformation primitives.
//!
//! Every function here is synchronous and pure over already-materialized
//! values. Expressions are compiled once per call and never cached beyond
//! it. Evaluation errors are not caught: the first failing item aborts the
//! whole call and no partial result is returned.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::errors::TransformError;
use crate::expression::{compile, CompiledFunction};
use crate::path::Path;
use crate::value::{is_truthy, ValueKey};

/// Identity passthrough.
pub fn reshape(value: Value) -> Value {
    value
}

/// Keeps items for which the expression is truthy, in order.
pub fn filter(items: &[Value], expression: &str) -> Result<Vec<Value>, TransformError> {
    let function = compile(expression)?;
    let mut kept = Vec::new();
    for item in items {
        if is_truthy(&function.call(item)?) {
            kept.push(item.clone());
        }
    }
    Ok(kept)
}

pub fn is_in(
    items: &[Value],
    collection: &[Value],
    key_expression: Option<&str>,
) -> Result<Vec<Value>, TransformError> {
    select_by_membership(items, collection, key_expression, true)
}

pub fn not_in(
    items: &[Value],
    collection: &[Value],
    key_expression: Option<&str>,
) -> Result<Vec<Value>, TransformError> {
    select_by_membership(items, collection, key_expression, false)
}

fn select_by_membership(
    items: &[Value],
    collection: &[Value],
    key_expression: Option<&str>,
    keep_members: bool,
) -> Result<Vec<Value>, TransformError> {
    let key_function: Option<CompiledFunction> = key_expression.map(compile).transpose()?;
    let members: HashSet<ValueKey> = collection.iter().cloned().map(ValueKey::new).collect();

    let mut selected = Vec::new();
    for item in items {
        let key = match &key_function {
            Some(function) => function.call(item)?,
            None => item.clone(),
        };
        if members.contains(&ValueKey::new(key)) == keep_members {
            selected.push(item.clone());
        }
    }
    Ok(selected)
}

/// Applies the expression to every item, preserving order and length.
pub fn map(items: &[Value], expression: &str) -> Result<Vec<Value>, TransformError> {
    let function = compile(expression)?;
    items
        .iter()
        .map(|item| function.call(item).map_err(TransformError::from))
        .collect()
}

pub fn apply(value: &Value, expression: &str) -> Result<Value, TransformError> {
    Ok(compile(expression)?.call(value)?)
}

/// Drops `null` and `""`; every other value, falsy or not, survives.
pub fn compact(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .filter(|item| match item {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .collect()
}

/// Groups mappings by the values at `keys` and merges each group.
///
/// Keys are resolved strictly; an item missing any key fails the call. Later
/// items in a group are shallow-merged into the first one, later values
/// winning. Groups come out in first-seen order.
pub fn deduplicate(items: Vec<Value>, keys: &[String]) -> Result<Vec<Value>, TransformError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let paths = keys
        .iter()
        .map(|key| Path::parse(key))
        .collect::<Result<Vec<_>, _>>()?;

    let mut group_index: HashMap<Vec<ValueKey>, usize> = HashMap::new();
    let mut groups: Vec<Value> = Vec::new();

    for (position, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(TransformError::invalid_argument(
                "items",
                format!("item {} is not a mapping", position),
            ));
        }

        let key = paths
            .iter()
            .map(|path| path.resolve_strict(&item).map(|value| ValueKey::new(value.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        match group_index.get(&key) {
            Some(&existing) => {
                if let (Value::Object(first), Value::Object(later)) = (&mut groups[existing], item) {
                    first.extend(later);
                }
            }
            None => {
                group_index.insert(key, groups.len());
                groups.push(item);
            }
        }
    }

    Ok(groups)
}
