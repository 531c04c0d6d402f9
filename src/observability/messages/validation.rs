// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading and validation.
//!
//! This module contains message types for logging events related to:
//! * Pipeline configuration loading
//! * Duplicate step ID detection
//! * Unknown action references
//! * Unbalanced scatter/gather pairs
//! * Step arguments rejected by an action's static checks

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Pipeline configuration parsed from disk.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigurationLoaded<'a> {
    pub path: &'a str,
    pub format: &'a str,
    pub step_count: usize,
}

impl Display for ConfigurationLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded {} pipeline configuration '{}': {} steps",
            self.format, self.path, self.step_count
        )
    }
}

impl StructuredLog for ConfigurationLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            format = self.format,
            step_count = self.step_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "configuration_loaded",
            span_name = name,
            path = self.path,
            format = self.format,
            step_count = self.step_count,
        )
    }
}

/// Duplicate step ID detected in configuration.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use dagwood_transforms::observability::messages::validation::DuplicateStepId;
///
/// let msg = DuplicateStepId {
///     step_id: "double",
/// };
///
/// assert_eq!(msg.to_string(), "Duplicate step ID: 'double'");
/// ```
pub struct DuplicateStepId<'a> {
    pub step_id: &'a str,
}

impl Display for DuplicateStepId<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Duplicate step ID: '{}'", self.step_id)
    }
}

impl StructuredLog for DuplicateStepId<'_> {
    fn log(&self) {
        tracing::error!(step_id = self.step_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step_id = self.step_id,
        )
    }
}

/// Step references an action missing from the registry.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct UnknownActionReferenced<'a> {
    pub step_id: &'a str,
    pub action: &'a str,
}

impl Display for UnknownActionReferenced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' references unknown action '{}'",
            self.step_id, self.action
        )
    }
}

impl StructuredLog for UnknownActionReferenced<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            action = self.action,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step_id = self.step_id,
            action = self.action,
        )
    }
}

/// Scatter without gather, or gather without scatter.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct UnbalancedFanOut<'a> {
    pub step_id: &'a str,
    pub reason: &'a str,
}

impl Display for UnbalancedFanOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' {}", self.step_id, self.reason)
    }
}

impl StructuredLog for UnbalancedFanOut<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step_id = self.step_id,
            reason = self.reason,
        )
    }
}

/// Step arguments failed the action's static checks.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct InvalidStepArguments<'a> {
    pub step_id: &'a str,
    pub action: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InvalidStepArguments<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' ({}) has invalid arguments: {}",
            self.step_id, self.action, self.error
        )
    }
}

impl StructuredLog for InvalidStepArguments<'_> {
    fn log(&self) {
        tracing::error!(
            step_id = self.step_id,
            action = self.action,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step_id = self.step_id,
            action = self.action,
            error = %self.error,
        )
    }
}
