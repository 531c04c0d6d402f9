// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{check_list_or_template, expect_list, parse_args, DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::traits::{Action, ActionSpec};
use crate::transforms;

static SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "compact",
    default_title: "Compact",
    description: "Remove all null or empty string values from a list.",
    display_group: DISPLAY_GROUP,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CompactArgs {
    items: Value,
}

pub struct CompactAction;

#[async_trait]
impl Action for CompactAction {
    fn spec(&self) -> &ActionSpec {
        &SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        let args: CompactArgs = parse_args(SPEC.name, args)?;
        check_list_or_template("items", &args.items)
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        let args: CompactArgs = parse_args(SPEC.name, &args)?;
        let items = expect_list("items", args.items)?;
        Ok(Value::Array(transforms::compact(items)))
    }
}
