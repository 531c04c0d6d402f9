// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{check_expression, check_list_or_template, expect_list, parse_args, DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::traits::{Action, ActionSpec};
use crate::transforms;

static MAP_SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "map",
    default_title: "Map",
    description: "Map a lambda function over a collection.",
    display_group: DISPLAY_GROUP,
};

static APPLY_SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "apply",
    default_title: "Apply",
    description: "Apply a Python lambda function to a value.",
    display_group: DISPLAY_GROUP,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MapArgs {
    items: Value,
    #[serde(alias = "expression")]
    python_lambda: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ApplyArgs {
    value: Value,
    #[serde(alias = "expression")]
    python_lambda: String,
}

pub struct MapAction;

#[async_trait]
impl Action for MapAction {
    fn spec(&self) -> &ActionSpec {
        &MAP_SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        let args: MapArgs = parse_args(MAP_SPEC.name, args)?;
        check_list_or_template("items", &args.items)?;
        check_expression(&args.python_lambda)
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        let args: MapArgs = parse_args(MAP_SPEC.name, &args)?;
        let items = expect_list("items", args.items)?;
        transforms::map(&items, &args.python_lambda).map(Value::Array)
    }
}

pub struct ApplyAction;

#[async_trait]
impl Action for ApplyAction {
    fn spec(&self) -> &ActionSpec {
        &APPLY_SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        let args: ApplyArgs = parse_args(APPLY_SPEC.name, args)?;
        check_expression(&args.python_lambda)
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        let args: ApplyArgs = parse_args(APPLY_SPEC.name, &args)?;
        transforms::apply(&args.value, &args.python_lambda)
    }
}
