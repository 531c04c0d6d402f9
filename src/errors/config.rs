// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::TransformError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during pipeline validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two steps share an id
    DuplicateStepId {
        /// The duplicate step ID
        step_id: String,
    },
    /// A step references an action that is not registered
    UnknownAction {
        /// The step naming the action
        step_id: String,
        /// The action that couldn't be resolved
        action: String,
    },
    /// A gather step has no open scatter to close
    UnmatchedGather {
        step_id: String,
    },
    /// A scatter step is never closed by a gather
    UnclosedScatter {
        step_id: String,
    },
    /// A step's arguments failed the action's static checks
    InvalidStepArguments {
        step_id: String,
        /// The underlying error, usually a compilation or invalid-argument error
        error: TransformError,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateStepId { step_id } => {
                write!(f, "Duplicate step ID: '{}'", step_id)
            }
            ValidationError::UnknownAction { step_id, action } => {
                write!(
                    f,
                    "Step '{}' uses action '{}' which is not registered",
                    step_id, action
                )
            }
            ValidationError::UnmatchedGather { step_id } => {
                write!(
                    f,
                    "Gather step '{}' has no preceding scatter to collect from",
                    step_id
                )
            }
            ValidationError::UnclosedScatter { step_id } => {
                write!(
                    f,
                    "Scatter step '{}' is never closed by a gather step",
                    step_id
                )
            }
            ValidationError::InvalidStepArguments { step_id, error } => {
                write!(f, "Step '{}' has invalid arguments: {}", step_id, error)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("unsupported config format for {path:?}: expected .yaml, .yml, .json or .toml")]
    UnsupportedFormat { path: PathBuf },

    #[error("pipeline validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
