// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod validation;

#[cfg(test)]
mod integration_tests;

pub use loader::{
    load_and_validate_config, load_config, ConfigFormat, ExecutorOptions, PipelineConfig,
    StepConfig, FALLBACK_MAX_CONCURRENCY,
};
pub use validation::{pair_fan_steps, validate_pipeline};
