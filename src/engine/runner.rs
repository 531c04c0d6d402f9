// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reference pipeline runner.
//!
//! Runs a validated linear pipeline and honors the fan-out/fan-in contract:
//!
//! - Compute steps are invoked through the registry with their templated
//!   arguments resolved against the current context.
//! - A scatter step expands its collection into one stream per element.
//!   Each stream runs the steps between the scatter and its gather on its
//!   own copy of the context, with `item` bound, as a tokio task. A semaphore
//!   per fan-out bounds how many streams run at once.
//! - The gather step joins the stream outcomes, in stream order, using its
//!   error strategy, and the join result becomes the gather step's result.
//!
//! A failing step fails only its stream when inside a fan-out. Outside any
//! fan-out it aborts the run.

use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::{pair_fan_steps, PipelineConfig, StepConfig};
use crate::engine::context::ExecutionContext;
use crate::errors::{ExecutionError, TransformError};
use crate::fanout::{StepKind, StreamError, StreamOutcome};
use crate::observability::messages::engine::{
    FanInCompleted, FanOutStarted, PipelineCompleted, PipelineFailed, PipelineStarted, StreamFailed,
};
use crate::observability::messages::StructuredLog;
use crate::registry::ActionRegistry;

type RangeFuture = Pin<Box<dyn Future<Output = Result<ExecutionContext, ExecutionError>> + Send>>;

pub struct PipelineRunner {
    registry: Arc<ActionRegistry>,
    steps: Vec<StepConfig>,
    /// Scatter step index to the index of its gather.
    fan_pairs: BTreeMap<usize, usize>,
    max_concurrency: usize,
}

impl PipelineRunner {
    pub fn new(
        registry: Arc<ActionRegistry>,
        config: PipelineConfig,
    ) -> Result<Arc<Self>, ExecutionError> {
        let fan_pairs = pair_fan_steps(&config.steps, &registry).map_err(|errors| {
            ExecutionError::Internal {
                message: errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            }
        })?;

        Ok(Arc::new(Self {
            max_concurrency: config.executor_options.effective_max_concurrency(),
            registry,
            steps: config.steps,
            fan_pairs,
        }))
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs every step against `input` and returns the final context.
    pub async fn run(self: &Arc<Self>, input: Value) -> Result<Value, ExecutionError> {
        PipelineStarted {
            step_count: self.steps.len(),
            max_concurrency: self.max_concurrency,
        }
        .log();
        let start_time = Instant::now();

        let outcome = Arc::clone(self)
            .run_range(0, self.steps.len(), ExecutionContext::new(input))
            .await;

        match outcome {
            Ok(context) => {
                PipelineCompleted {
                    step_count: self.steps.len(),
                    duration: start_time.elapsed(),
                }
                .log();
                Ok(context.to_value())
            }
            Err(error) => {
                PipelineFailed { error: &error }.log();
                Err(error)
            }
        }
    }

    fn step_failed(step: &StepConfig, source: TransformError) -> ExecutionError {
        ExecutionError::StepFailed {
            step_id: step.id.clone(),
            source,
        }
    }

    /// Runs steps `start..end` in order. Boxed because fan-outs recurse.
    fn run_range(self: Arc<Self>, start: usize, end: usize, mut context: ExecutionContext) -> RangeFuture {
        Box::pin(async move {
            let mut index = start;
            while index < end {
                let step = &self.steps[index];
                let args = context
                    .resolve_args(&step.args)
                    .map_err(|e| Self::step_failed(step, e))?;

                match self
                    .registry
                    .plan(&step.action, &args)
                    .map_err(|e| Self::step_failed(step, e))?
                {
                    StepKind::Compute => {
                        let output = self
                            .registry
                            .invoke(&step.action, args)
                            .await
                            .map_err(|e| Self::step_failed(step, e))?;
                        context.record(&step.id, output);
                        index += 1;
                    }
                    StepKind::FanOut(scatter) => {
                        let gather_index = *self.fan_pairs.get(&index).ok_or_else(|| {
                            ExecutionError::Internal {
                                message: format!("scatter '{}' has no matching gather", step.id),
                            }
                        })?;

                        let items = scatter
                            .expand(&context.to_value())
                            .map_err(|e| Self::step_failed(step, e))?;
                        context.record(&step.id, Value::Array(items.clone()));

                        let outcomes = Arc::clone(&self)
                            .run_streams(&step.id, index + 1, gather_index, &context, items)
                            .await?;

                        let gather_step = &self.steps[gather_index];
                        let joined = self.join(gather_step, outcomes)?;
                        context.record(&gather_step.id, joined);
                        index = gather_index + 1;
                    }
                    StepKind::FanIn(_) => {
                        return Err(ExecutionError::Internal {
                            message: format!("gather '{}' reached outside its fan-out", step.id),
                        })
                    }
                }
            }
            Ok(context)
        })
    }

    async fn run_streams(
        self: Arc<Self>,
        scatter_id: &str,
        start: usize,
        end: usize,
        base: &ExecutionContext,
        items: Vec<Value>,
    ) -> Result<Vec<StreamOutcome>, ExecutionError> {
        let fan_out = FanOutStarted {
            step_id: scatter_id,
            stream_count: items.len(),
            max_concurrency: self.max_concurrency,
        };
        fan_out.log();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = Vec::with_capacity(items.len());

        for item in items {
            let runner = Arc::clone(&self);
            let semaphore_clone = semaphore.clone();
            let context = base.for_stream(item);

            let task = tokio::spawn(async move {
                let _permit = semaphore_clone
                    .acquire_owned()
                    .await
                    .map_err(|e| ExecutionError::Internal {
                        message: format!("failed to acquire stream permit: {}", e),
                    })?;
                runner.run_range(start, end, context).await
            });
            tasks.push(task);
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (stream, task) in tasks.into_iter().enumerate() {
            match task.await {
                Ok(Ok(context)) => outcomes.push(StreamOutcome::Completed(context.to_value())),
                Ok(Err(error)) => {
                    StreamFailed {
                        scatter_id,
                        stream,
                        error: &error,
                    }
                    .log();
                    outcomes.push(StreamOutcome::Failed(stream_error(stream, &error)));
                }
                Err(join_error) => {
                    return Err(ExecutionError::TaskJoin {
                        message: join_error.to_string(),
                    })
                }
            }
        }

        Ok(outcomes)
    }

    fn join(&self, gather_step: &StepConfig, outcomes: Vec<StreamOutcome>) -> Result<Value, ExecutionError> {
        let gather = match self
            .registry
            .plan(&gather_step.action, &gather_step.args)
            .map_err(|e| Self::step_failed(gather_step, e))?
        {
            StepKind::FanIn(gather) => gather,
            _ => {
                return Err(ExecutionError::Internal {
                    message: format!("step '{}' does not gather", gather_step.id),
                })
            }
        };

        let stream_count = outcomes.len();
        let failed_count = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, StreamOutcome::Failed(_)))
            .count();

        let joined = gather.join(outcomes);
        FanInCompleted {
            step_id: &gather_step.id,
            strategy: gather.error_strategy().as_str(),
            stream_count,
            failed_count,
        }
        .log();

        Ok(joined.into_value())
    }
}

fn stream_error(stream: usize, error: &ExecutionError) -> StreamError {
    match error {
        ExecutionError::StepFailed { step_id, source } => StreamError {
            stream,
            step: Some(step_id.clone()),
            kind: source.kind().as_str().to_string(),
            message: source.to_string(),
        },
        other => StreamError {
            stream,
            step: None,
            kind: other.kind().to_string(),
            message: other.to_string(),
        },
    }
}
