// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The sandbox refused to compile an expression.
///
/// Logged at `debug!`: the caller receives the error and decides how loud
/// to be about it.
pub struct ExpressionRejected<'a> {
    pub expression: &'a str,
    pub position: usize,
    pub reason: &'a str,
}

impl Display for ExpressionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Expression rejected at offset {}: {}",
            self.position, self.reason
        )
    }
}

impl StructuredLog for ExpressionRejected<'_> {
    fn log(&self) {
        tracing::debug!(
            expression = self.expression,
            position = self.position,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "expression_rejected",
            span_name = name,
            position = self.position,
            reason = self.reason,
        )
    }
}
