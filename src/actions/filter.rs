// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{check_expression, check_list_or_template, expect_list, parse_args, DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::traits::{Action, ActionSpec};
use crate::transforms;

static SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "filter",
    default_title: "Filter",
    description: "Filter a collection using a Python lambda function.",
    display_group: DISPLAY_GROUP,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterArgs {
    items: Value,
    #[serde(alias = "expression")]
    python_lambda: String,
}

pub struct FilterAction;

#[async_trait]
impl Action for FilterAction {
    fn spec(&self) -> &ActionSpec {
        &SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        let args: FilterArgs = parse_args(SPEC.name, args)?;
        check_list_or_template("items", &args.items)?;
        check_expression(&args.python_lambda)
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        let args: FilterArgs = parse_args(SPEC.name, &args)?;
        let items = expect_list("items", args.items)?;
        transforms::filter(&items, &args.python_lambda).map(Value::Array)
    }
}
