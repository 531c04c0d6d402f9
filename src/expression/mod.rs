// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sandboxed single-parameter lambda expressions.
//!
//! Expressions are written in a small Python-like subset:
//!
//! ```text
//! lambda x: x["price"] * 2
//! x -> [i for i in x if i > 0]
//! ```
//!
//! [`compile`] turns text into a [`CompiledFunction`] or rejects it with a
//! [`CompilationError`]. Only allow-listed builtins and methods can be
//! reached; there are no statements, imports, attribute access or I/O.
//! Compiling the same text twice yields functions with identical behavior.

mod ast;
mod builtins;
mod eval;
mod lexer;
mod parser;

use serde_json::Value;

use crate::errors::{CompilationError, EvaluationError};
use crate::observability::messages::expression::ExpressionRejected;
use crate::observability::messages::StructuredLog;

pub use parser::MAX_NESTING;

/// Longest expression source accepted by [`compile`], in bytes.
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// A validated, callable one-parameter function.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    source: String,
    param: String,
    body: ast::Expr,
}

impl CompiledFunction {
    /// Applies the function to one value.
    pub fn call(&self, argument: &Value) -> Result<Value, EvaluationError> {
        eval::Evaluator::new(&self.param, argument.clone()).eval(&self.body)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn param(&self) -> &str {
        &self.param
    }
}

pub fn compile(text: &str) -> Result<CompiledFunction, CompilationError> {
    let result = compile_unlogged(text);
    if let Err(err) = &result {
        ExpressionRejected {
            expression: text,
            position: err.position,
            reason: &err.reason,
        }
        .log();
    }
    result
}

fn compile_unlogged(text: &str) -> Result<CompiledFunction, CompilationError> {
    let reject = |reason: String| CompilationError {
        expression: text.to_string(),
        position: 0,
        reason,
    };

    if text.trim().is_empty() {
        return Err(reject("expression is empty".to_string()));
    }
    if text.len() > MAX_EXPRESSION_LEN {
        return Err(reject(format!(
            "expression is {} bytes, longer than the {} byte limit",
            text.len(),
            MAX_EXPRESSION_LEN
        )));
    }

    let tokens = lexer::tokenize(text)?;
    let lambda = parser::parse(text, tokens)?;
    Ok(CompiledFunction {
        source: text.to_string(),
        param: lambda.param,
        body: lambda.body,
    })
}

/// Convenience for one-shot evaluation of a source string.
pub fn evaluate(text: &str, argument: &Value) -> Result<Value, crate::errors::TransformError> {
    Ok(compile(text)?.call(argument)?)
}
