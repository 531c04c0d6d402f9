// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error surface exposed to the orchestration engine by the transform library.
//!
//! Every failure a primitive can raise is a [`TransformError`]. The engine is
//! expected to branch on [`TransformError::kind`] to render diagnostics:
//!
//! * `compilation` - the expression text is malformed or uses a forbidden construct
//! * `evaluation` - a valid expression raised against a specific item
//! * `path_not_found` - strict path resolution hit an absent segment
//! * `unsupported_context` - scatter/gather was invoked instead of planned
//! * `invalid_argument` - a named argument has the wrong shape
//! * `unknown_action` - the requested action is not registered
//!
//! None of these are retried or suppressed by this crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Discriminant of a [`TransformError`], stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Compilation,
    Evaluation,
    PathNotFound,
    UnsupportedContext,
    InvalidArgument,
    UnknownAction,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Compilation => "compilation",
            ErrorKind::Evaluation => "evaluation",
            ErrorKind::PathNotFound => "path_not_found",
            ErrorKind::UnsupportedContext => "unsupported_context",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::UnknownAction => "unknown_action",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The expression text was rejected before anything was evaluated.
///
/// `position` is a byte offset into `expression`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid expression `{expression}` at offset {position}: {reason}")]
pub struct CompilationError {
    pub expression: String,
    pub position: usize,
    pub reason: String,
}

/// A compiled expression raised while being applied to a value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct EvaluationError {
    pub reason: String,
}

impl EvaluationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("compilation error: {0}")]
    Compilation(#[from] CompilationError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("path not found: segment '{segment}' of '{path}' is absent")]
    PathNotFound { path: String, segment: String },

    #[error("action '{action}' is an interface marker: it must be planned by the orchestration engine, not invoked directly")]
    UnsupportedContext { action: String },

    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("unknown action '{action}'")]
    UnknownAction { action: String },
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Compilation(_) => ErrorKind::Compilation,
            TransformError::Evaluation(_) => ErrorKind::Evaluation,
            TransformError::PathNotFound { .. } => ErrorKind::PathNotFound,
            TransformError::UnsupportedContext { .. } => ErrorKind::UnsupportedContext,
            TransformError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            TransformError::UnknownAction { .. } => ErrorKind::UnknownAction,
        }
    }

    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        TransformError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = vec![
            TransformError::from(CompilationError {
                expression: "import os".into(),
                position: 0,
                reason: "statement keyword 'import' is not allowed".into(),
            }),
            TransformError::from(EvaluationError::new("division by zero")),
            TransformError::PathNotFound {
                path: "$.a".into(),
                segment: "a".into(),
            },
            TransformError::UnsupportedContext {
                action: "core.transform.scatter".into(),
            },
            TransformError::invalid_argument("items", "expected a list"),
            TransformError::UnknownAction {
                action: "core.nope".into(),
            },
        ];

        let kinds: std::collections::HashSet<ErrorKind> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::PathNotFound).unwrap();
        assert_eq!(json, "\"path_not_found\"");
        assert_eq!(ErrorKind::UnsupportedContext.to_string(), "unsupported_context");
    }
}
