// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_args, DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::traits::{Action, ActionSpec};
use crate::transforms;

static SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "reshape",
    default_title: "Reshape",
    description: "Reshapes the input value to the output. Use templated arguments to build the new shape.",
    display_group: DISPLAY_GROUP,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReshapeArgs {
    value: Value,
}

pub struct ReshapeAction;

#[async_trait]
impl Action for ReshapeAction {
    fn spec(&self) -> &ActionSpec {
        &SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        parse_args::<ReshapeArgs>(SPEC.name, args).map(|_| ())
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        let args: ReshapeArgs = parse_args(SPEC.name, &args)?;
        Ok(transforms::reshape(args.value))
    }
}
