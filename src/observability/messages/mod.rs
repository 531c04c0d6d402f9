// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `action` - action invocation start, completion and failure
//! * `engine` - pipeline lifecycle, fan-out width, per-stream failures
//! * `expression` - expressions rejected by the sandbox
//! * `validation` - configuration loading and validation findings

use tracing::Span;

pub mod action;
pub mod engine;
pub mod expression;
pub mod validation;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emits the message as an event at its level.
    fn log(&self);

    /// Opens a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
