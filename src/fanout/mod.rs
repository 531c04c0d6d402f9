// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-out / fan-in contract.
//!
//! `scatter` and `gather` are never executed as ordinary steps. A planner
//! turns their arguments into a [`ScatterDescriptor`] or [`GatherDescriptor`]
//! and classifies the step as a [`StepKind`]; the engine then expands the
//! scatter into independent streams and hands the stream outcomes to
//! [`GatherDescriptor::join`]. Invoking either action directly fails with
//! [`TransformError::UnsupportedContext`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{Display, Formatter};

use crate::actions::{parse_args, NAMESPACE};
use crate::errors::TransformError;
use crate::path::{strip_template, Path};
use crate::value::type_name;

/// How a step participates in planning.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Compute,
    FanOut(ScatterDescriptor),
    FanIn(GatherDescriptor),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScatterSource {
    Items(Vec<Value>),
    Path(Path),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ScatterArgs {
    collection: Value,
}

/// A validated scatter step.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterDescriptor {
    source: ScatterSource,
}

impl ScatterDescriptor {
    pub fn from_args(args: &Value) -> Result<Self, TransformError> {
        let args: ScatterArgs = parse_args("scatter", args)?;
        let source = match args.collection {
            Value::Array(items) => ScatterSource::Items(items),
            Value::String(text) => {
                let path = strip_template(&text).unwrap_or(&text);
                ScatterSource::Path(Path::parse(path)?)
            }
            other => {
                return Err(TransformError::invalid_argument(
                    "collection",
                    format!("expected a list or a path, found {}", type_name(&other)),
                ))
            }
        };
        Ok(Self { source })
    }

    pub fn source(&self) -> &ScatterSource {
        &self.source
    }

    /// Materializes the collection, one element per stream.
    pub fn expand(&self, context: &Value) -> Result<Vec<Value>, TransformError> {
        match &self.source {
            ScatterSource::Items(items) => Ok(items.clone()),
            ScatterSource::Path(path) => match path.resolve_strict(context)? {
                Value::Array(items) => Ok(items.clone()),
                other => Err(TransformError::invalid_argument(
                    "collection",
                    format!("'{}' resolved to {}, expected a list", path.to_query(), type_name(other)),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStrategy {
    /// Successes in `result`, failures in `error`.
    #[default]
    Partition,
    /// Failures appear in `result` as error descriptors.
    Include,
    /// Failures are discarded.
    Drop,
}

impl ErrorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStrategy::Partition => "partition",
            ErrorStrategy::Include => "include",
            ErrorStrategy::Drop => "drop",
        }
    }
}

impl Display for ErrorStrategy {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GatherArgs {
    items: String,
    #[serde(default)]
    drop_nulls: bool,
    #[serde(default)]
    error_strategy: ErrorStrategy,
}

/// A validated gather step.
#[derive(Debug, Clone, PartialEq)]
pub struct GatherDescriptor {
    items: Path,
    drop_nulls: bool,
    error_strategy: ErrorStrategy,
}

/// Descriptor for a stream that failed before reaching its gather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamError {
    pub stream: usize,
    pub step: Option<String>,
    pub kind: String,
    pub message: String,
}

impl StreamError {
    pub fn to_value(&self) -> Value {
        json!({
            "stream": self.stream,
            "step": self.step,
            "kind": self.kind,
            "message": self.message,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The stream's final context.
    Completed(Value),
    Failed(StreamError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatherResult {
    pub result: Vec<Value>,
    /// Present only for [`ErrorStrategy::Partition`].
    pub error: Option<Vec<Value>>,
}

impl GatherResult {
    pub fn into_value(self) -> Value {
        let mut out = Map::new();
        out.insert("result".to_string(), Value::Array(self.result));
        if let Some(error) = self.error {
            out.insert("error".to_string(), Value::Array(error));
        }
        Value::Object(out)
    }
}

impl GatherDescriptor {
    pub fn from_args(args: &Value) -> Result<Self, TransformError> {
        let args: GatherArgs = parse_args("gather", args)?;
        let items = strip_template(&args.items).unwrap_or(&args.items);
        Ok(Self {
            items: Path::parse(items)?,
            drop_nulls: args.drop_nulls,
            error_strategy: args.error_strategy,
        })
    }

    pub fn items(&self) -> &Path {
        &self.items
    }

    pub fn drop_nulls(&self) -> bool {
        self.drop_nulls
    }

    pub fn error_strategy(&self) -> ErrorStrategy {
        self.error_strategy
    }

    /// Combines stream outcomes, in stream order.
    ///
    /// Each completed stream contributes the value at `items` in its
    /// context, or `null` when that path is absent. `drop_nulls` runs after
    /// the error strategy has been applied.
    pub fn join(&self, outcomes: Vec<StreamOutcome>) -> GatherResult {
        let mut result = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();

        for outcome in outcomes {
            match outcome {
                StreamOutcome::Completed(context) => {
                    result.push(self.items.resolve(&context).into_value_or_null())
                }
                StreamOutcome::Failed(error) => match self.error_strategy {
                    ErrorStrategy::Partition => errors.push(error.to_value()),
                    ErrorStrategy::Include => result.push(error.to_value()),
                    ErrorStrategy::Drop => {}
                },
            }
        }

        if self.drop_nulls {
            result.retain(|value| !value.is_null());
        }

        GatherResult {
            result,
            error: (self.error_strategy == ErrorStrategy::Partition).then_some(errors),
        }
    }
}

fn unsupported(name: &str) -> TransformError {
    TransformError::UnsupportedContext {
        action: format!("{}.{}", NAMESPACE, name),
    }
}

/// Direct invocation of the scatter marker. Always fails.
pub fn scatter(_args: &Value) -> Result<Value, TransformError> {
    Err(unsupported("scatter"))
}

/// Direct invocation of the gather marker. Always fails.
pub fn gather(_args: &Value) -> Result<Value, TransformError> {
    Err(unsupported("gather"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn stream_error(stream: usize) -> StreamError {
        StreamError {
            stream,
            step: Some("double".to_string()),
            kind: "evaluation".to_string(),
            message: "division by zero".to_string(),
        }
    }

    fn outcomes() -> Vec<StreamOutcome> {
        vec![
            StreamOutcome::Completed(json!({"steps": {"double": 1}})),
            StreamOutcome::Failed(stream_error(1)),
            StreamOutcome::Completed(json!({"steps": {"double": 3}})),
        ]
    }

    fn descriptor(strategy: &str, drop_nulls: bool) -> GatherDescriptor {
        GatherDescriptor::from_args(&json!({
            "items": "steps.double",
            "drop_nulls": drop_nulls,
            "error_strategy": strategy,
        }))
        .unwrap()
    }

    #[test]
    fn test_join_strategies() {
        struct TestCase {
            strategy: &'static str,
            expected: Value,
        }

        let error = stream_error(1).to_value();
        let cases = vec![
            TestCase {
                strategy: "partition",
                expected: json!({"result": [1, 3], "error": [error.clone()]}),
            },
            TestCase {
                strategy: "include",
                expected: json!({"result": [1, error.clone(), 3]}),
            },
            TestCase {
                strategy: "drop",
                expected: json!({"result": [1, 3]}),
            },
        ];

        for case in cases {
            let joined = descriptor(case.strategy, false).join(outcomes());
            assert_eq!(joined.into_value(), case.expected, "{}", case.strategy);
        }
    }

    #[test]
    fn test_absent_items_become_null_and_drop_after_strategy() {
        let outcomes = vec![
            StreamOutcome::Completed(json!({"steps": {}})),
            StreamOutcome::Failed(stream_error(1)),
            StreamOutcome::Completed(json!({"steps": {"double": 4}})),
        ];

        let kept = descriptor("drop", false).join(outcomes.clone());
        assert_eq!(kept.result, vec![Value::Null, json!(4)]);

        let dropped = descriptor("include", true).join(outcomes);
        assert_eq!(dropped.result, vec![stream_error(1).to_value(), json!(4)]);
        assert_eq!(dropped.error, None);
    }

    #[test]
    fn test_empty_join() {
        let joined = descriptor("partition", true).join(Vec::new());
        assert_eq!(joined.into_value(), json!({"result": [], "error": []}));
    }

    #[test]
    fn test_gather_defaults_and_template_paths() {
        let gather = GatherDescriptor::from_args(&json!({"items": "${{ steps.x.y }}"})).unwrap();
        assert_eq!(gather.error_strategy(), ErrorStrategy::Partition);
        assert!(!gather.drop_nulls());
        assert_eq!(gather.items().to_query(), "$.steps.x.y");
    }

    #[test]
    fn test_gather_rejects_bad_arguments() {
        let cases = vec![
            json!({"items": "a", "error_strategy": "retry"}),
            json!({"items": "a", "unknown": 1}),
            json!({"drop_nulls": true}),
            json!({"items": "a..b"}),
        ];
        for args in cases {
            let err = GatherDescriptor::from_args(&args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{}", args);
        }
    }

    #[test]
    fn test_scatter_expansion() {
        let context = json!({"input": {"rows": [1, 2]}, "steps": {"n": 5}});

        let literal = ScatterDescriptor::from_args(&json!({"collection": ["a", "b"]})).unwrap();
        assert_eq!(literal.expand(&context).unwrap(), vec![json!("a"), json!("b")]);

        let by_path = ScatterDescriptor::from_args(&json!({"collection": "input.rows"})).unwrap();
        assert_eq!(by_path.expand(&context).unwrap(), vec![json!(1), json!(2)]);

        let not_a_list = ScatterDescriptor::from_args(&json!({"collection": "steps.n"})).unwrap();
        assert_eq!(
            not_a_list.expand(&context).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        let missing = ScatterDescriptor::from_args(&json!({"collection": "input.none"})).unwrap();
        assert_eq!(missing.expand(&context).unwrap_err().kind(), ErrorKind::PathNotFound);

        let err = ScatterDescriptor::from_args(&json!({"collection": 3})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_direct_calls_are_unsupported() {
        let argument_sets = vec![
            json!({"collection": [1, 2]}),
            json!({"collection": "input.rows"}),
            json!(null),
            json!({"items": "x", "error_strategy": "drop"}),
        ];
        for args in argument_sets {
            assert_eq!(scatter(&args).unwrap_err().kind(), ErrorKind::UnsupportedContext);
            assert_eq!(gather(&args).unwrap_err().kind(), ErrorKind::UnsupportedContext);
        }
        assert_eq!(
            scatter(&json!({})).unwrap_err(),
            TransformError::UnsupportedContext {
                action: "core.transform.scatter".to_string()
            }
        );
    }
}
