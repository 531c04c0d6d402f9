// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{check_list_or_template, expect_list, parse_args, DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::path::Path;
use crate::traits::{Action, ActionSpec};
use crate::transforms;

static SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "deduplicate",
    default_title: "Deduplicate",
    description: "Deduplicate items by one or more keys, merging duplicates.",
    display_group: DISPLAY_GROUP,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeduplicateArgs {
    items: Value,
    keys: Vec<String>,
}

pub struct DeduplicateAction;

#[async_trait]
impl Action for DeduplicateAction {
    fn spec(&self) -> &ActionSpec {
        &SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        let args: DeduplicateArgs = parse_args(SPEC.name, args)?;
        check_list_or_template("items", &args.items)?;
        if args.keys.is_empty() {
            return Err(TransformError::invalid_argument("keys", "at least one key is required"));
        }
        for key in &args.keys {
            Path::parse(key)?;
        }
        Ok(())
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        let args: DeduplicateArgs = parse_args(SPEC.name, &args)?;
        let items = expect_list("items", args.items)?;
        transforms::deduplicate(items, &args.keys).map(Value::Array)
    }
}
