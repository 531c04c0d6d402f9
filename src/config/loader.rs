// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::config::validation::validate_pipeline;
use crate::errors::ConfigError;
use crate::observability::messages::validation::ConfigurationLoaded;
use crate::observability::messages::StructuredLog;
use crate::registry::ActionRegistry;

/// Concurrency used when none is configured and the host cannot report its
/// available parallelism.
pub const FALLBACK_MAX_CONCURRENCY: usize = 4;

/// A linear pipeline of action steps.
///
/// Steps run in order. A `core.transform.scatter` step opens a fan-out whose
/// body is every step up to the matching `core.transform.gather`.
///
/// # Example
/// ```yaml
/// executor_options:
///   max_concurrency: 4
/// steps:
///   - id: orders
///     action: core.transform.filter
///     args:
///       items: ${{ input.orders }}
///       python_lambda: "lambda o: o['total'] > 100"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorOptions {
    /// Upper bound on concurrently running streams per fan-out.
    pub max_concurrency: Option<usize>,
}

impl ExecutorOptions {
    pub fn effective_max_concurrency(&self) -> usize {
        self.max_concurrency
            .filter(|n| *n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(FALLBACK_MAX_CONCURRENCY)
            })
    }
}

/// One step: an id unique within the pipeline, a fully qualified action key
/// and the action's named arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub id: String,
    pub action: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
        }
    }

    pub fn parse(&self, content: &str) -> Result<PipelineConfig, String> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Load a pipeline config, choosing the parser by file extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = format.parse(&content).map_err(|reason| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    ConfigurationLoaded {
        path: &path.display().to_string(),
        format: format.as_str(),
        step_count: config.steps.len(),
    }
    .log();

    Ok(config)
}

/// Load a pipeline config and validate it against `registry`.
///
/// All validation findings are reported together.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
    registry: &ActionRegistry,
) -> Result<PipelineConfig, ConfigError> {
    let config = load_config(path)?;
    validate_pipeline(&config, registry).map_err(ConfigError::Validation)?;
    Ok(config)
}
