// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline runs.
//!
//! This module contains message types for logging events related to:
//! * Pipeline lifecycle (start, completion, failure)
//! * Fan-out width and concurrency
//! * Per-stream failures
//! * Fan-in results

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Pipeline run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use dagwood_transforms::observability::messages::engine::PipelineStarted;
///
/// let msg = PipelineStarted {
///     step_count: 5,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineStarted {
    pub step_count: usize,
    pub max_concurrency: usize,
}

impl Display for PipelineStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline: {} steps, max_concurrency={}",
            self.step_count, self.max_concurrency
        )
    }
}

impl StructuredLog for PipelineStarted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            step_count = self.step_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Pipeline run completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineCompleted {
    pub step_count: usize,
    pub duration: std::time::Duration,
}

impl Display for PipelineCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline completed: {} steps in {:?}",
            self.step_count, self.duration
        )
    }
}

impl StructuredLog for PipelineCompleted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_completed",
            span_name = name,
            step_count = self.step_count,
            duration = ?self.duration,
        )
    }
}

/// Pipeline aborted by a step failing outside any fan-out.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PipelineFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for PipelineFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline failed: {}", self.error)
    }
}

impl StructuredLog for PipelineFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("pipeline_failed", span_name = name, error = %self.error)
    }
}

/// A scatter step expanded into streams.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FanOutStarted<'a> {
    pub step_id: &'a str,
    pub stream_count: usize,
    pub max_concurrency: usize,
}

impl Display for FanOutStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Scatter '{}' fanning out to {} streams, max_concurrency={}",
            self.step_id, self.stream_count, self.max_concurrency
        )
    }
}

impl StructuredLog for FanOutStarted<'_> {
    fn log(&self) {
        tracing::info!(
            step_id = self.step_id,
            stream_count = self.stream_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "fan_out",
            span_name = name,
            step_id = self.step_id,
            stream_count = self.stream_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// One stream of a fan-out failed.
///
/// # Log Level
/// `warn!` - the gather step decides what the failure means
pub struct StreamFailed<'a> {
    pub scatter_id: &'a str,
    pub stream: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for StreamFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream {} of scatter '{}' failed: {}",
            self.stream, self.scatter_id, self.error
        )
    }
}

impl StructuredLog for StreamFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            scatter_id = self.scatter_id,
            stream = self.stream,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stream_failed",
            span_name = name,
            scatter_id = self.scatter_id,
            stream = self.stream,
            error = %self.error,
        )
    }
}

/// A gather step joined its streams.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FanInCompleted<'a> {
    pub step_id: &'a str,
    pub strategy: &'a str,
    pub stream_count: usize,
    pub failed_count: usize,
}

impl Display for FanInCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Gather '{}' joined {} streams ({} failed) with {} strategy",
            self.step_id, self.stream_count, self.failed_count, self.strategy
        )
    }
}

impl StructuredLog for FanInCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            step_id = self.step_id,
            strategy = self.strategy,
            stream_count = self.stream_count,
            failed_count = self.failed_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "fan_in",
            span_name = name,
            step_id = self.step_id,
            strategy = self.strategy,
            stream_count = self.stream_count,
            failed_count = self.failed_count,
        )
    }
}
