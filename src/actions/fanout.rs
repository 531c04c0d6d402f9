// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use super::{DISPLAY_GROUP, NAMESPACE};
use crate::errors::TransformError;
use crate::fanout::{self, GatherDescriptor, ScatterDescriptor};
use crate::traits::{Action, ActionIntent, ActionSpec};

static SCATTER_SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "scatter",
    default_title: "Scatter",
    description: "Transform a collection of items into parallel streams of execution.",
    display_group: DISPLAY_GROUP,
};

static GATHER_SPEC: ActionSpec = ActionSpec {
    namespace: NAMESPACE,
    name: "gather",
    default_title: "Gather",
    description: "Collect the results of parallel streams of execution into a list.",
    display_group: DISPLAY_GROUP,
};

pub struct ScatterAction;

#[async_trait]
impl Action for ScatterAction {
    fn spec(&self) -> &ActionSpec {
        &SCATTER_SPEC
    }

    fn intent(&self) -> ActionIntent {
        ActionIntent::FanOut
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        ScatterDescriptor::from_args(args).map(|_| ())
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        fanout::scatter(&args)
    }
}

pub struct GatherAction;

#[async_trait]
impl Action for GatherAction {
    fn spec(&self) -> &ActionSpec {
        &GATHER_SPEC
    }

    fn intent(&self) -> ActionIntent {
        ActionIntent::FanIn
    }

    fn validate(&self, args: &Value) -> Result<(), TransformError> {
        GatherDescriptor::from_args(args).map(|_| ())
    }

    async fn invoke(&self, args: Value) -> Result<Value, TransformError> {
        fanout::gather(&args)
    }
}
