// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for action invocation events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Action invocation started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ActionInvocationStarted<'a> {
    pub action: &'a str,
    pub argument_count: usize,
}

impl Display for ActionInvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Action '{}' invocation started: {} arguments",
            self.action, self.argument_count
        )
    }
}

impl StructuredLog for ActionInvocationStarted<'_> {
    fn log(&self) {
        tracing::info!(
            action = self.action,
            argument_count = self.argument_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "action",
            span_name = name,
            action = self.action,
            argument_count = self.argument_count,
        )
    }
}

/// Action invocation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ActionInvocationCompleted<'a> {
    pub action: &'a str,
    pub output_type: &'a str,
    pub duration: std::time::Duration,
}

impl Display for ActionInvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Action '{}' completed: output={}, duration={:?}",
            self.action, self.output_type, self.duration
        )
    }
}

impl StructuredLog for ActionInvocationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            action = self.action,
            output_type = self.output_type,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "action_completed",
            span_name = name,
            action = self.action,
            output_type = self.output_type,
            duration = ?self.duration,
        )
    }
}

/// Action invocation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use dagwood_transforms::errors::TransformError;
/// use dagwood_transforms::observability::messages::action::ActionInvocationFailed;
///
/// let error = TransformError::UnsupportedContext {
///     action: "core.transform.scatter".to_string(),
/// };
/// let msg = ActionInvocationFailed {
///     action: "core.transform.scatter",
///     kind: error.kind().as_str(),
///     error: &error,
/// };
///
/// assert!(msg.to_string().starts_with("Action 'core.transform.scatter' failed"));
/// ```
pub struct ActionInvocationFailed<'a> {
    pub action: &'a str,
    pub kind: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ActionInvocationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Action '{}' failed ({}): {}",
            self.action, self.kind, self.error
        )
    }
}

impl StructuredLog for ActionInvocationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            action = self.action,
            kind = self.kind,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "action_failed",
            span_name = name,
            action = self.action,
            kind = self.kind,
            error = %self.error,
        )
    }
}
