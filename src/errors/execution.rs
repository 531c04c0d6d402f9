// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::TransformError;
use thiserror::Error;

/// Failures of the reference pipeline runner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// A step raised; outside a fan-out this aborts the pipeline.
    #[error("step '{step_id}' failed: {source}")]
    StepFailed {
        step_id: String,
        #[source]
        source: TransformError,
    },

    /// A stream task panicked or was cancelled.
    #[error("stream task failed to join: {message}")]
    TaskJoin { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ExecutionError {
    /// Id of the failing step, when the failure belongs to one.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            ExecutionError::StepFailed { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    /// Stable, machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::StepFailed { source, .. } => source.kind().as_str(),
            ExecutionError::TaskJoin { .. } => "task_join",
            ExecutionError::Internal { .. } => "internal",
        }
    }
}
