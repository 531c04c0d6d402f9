// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{check_expression, check_list_or_template, expect_list, parse_args, DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::traits::{Action, ActionSpec};
use crate::transforms;

static IS_IN_SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "is_in",
    default_title: "Is in",
    description: "Keep items that are in a collection.",
    display_group: DISPLAY_GROUP,
};

static NOT_IN_SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "not_in",
    default_title: "Not in",
    description: "Keep items that are not in a collection.",
    display_group: DISPLAY_GROUP,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MembershipArgs {
    items: Value,
    collection: Value,
    #[serde(default, alias = "expression")]
    python_lambda: Option<String>,
}

impl MembershipArgs {
    fn check(&self) -> Result<(), TransformError> {
        check_list_or_template("items", &self.items)?;
        check_list_or_template("collection", &self.collection)?;
        match &self.python_lambda {
            Some(expression) => check_expression(expression),
            None => Ok(()),
        }
    }
}

fn run(name: &str, args: &Value, keep_members: bool) -> Result<Value, TransformError> {
    let args: MembershipArgs = parse_args(name, args)?;
    let items = expect_list("items", args.items)?;
    let collection = expect_list("collection", args.collection)?;
    let key = args.python_lambda.as_deref();
    let selected = if keep_members {
        transforms::is_in(&items, &collection, key)?
    } else {
        transforms::not_in(&items, &collection, key)?
    };
    Ok(Value::Array(selected))
}

pub struct IsInAction;

#[async_trait]
impl Action for IsInAction {
    fn spec(&self) -> &ActionSpec {
        &IS_IN_SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        parse_args::<MembershipArgs>(IS_IN_SPEC.name, args)?.check()
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        run(IS_IN_SPEC.name, &args, true)
    }
}

pub struct NotInAction;

#[async_trait]
impl Action for NotInAction {
    fn spec(&self) -> &ActionSpec {
        &NOT_IN_SPEC
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        parse_args::<MembershipArgs>(NOT_IN_SPEC.name, args)?.check()
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        run(NOT_IN_SPEC.name, &args, false)
    }
}
