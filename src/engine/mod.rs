// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod context;
pub mod runner;

#[cfg(test)]
mod integration_tests;

pub use context::ExecutionContext;
pub use runner::PipelineRunner;
