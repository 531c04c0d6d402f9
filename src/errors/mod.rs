// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod registry;
mod transform;

pub use config::{ConfigError, ValidationError};
pub use execution::ExecutionError;
pub use registry::RegistryError;
pub use transform::{CompilationError, ErrorKind, EvaluationError, TransformError};
