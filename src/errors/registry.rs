// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for action registry construction.

use std::error::Error;
use std::fmt;

/// Errors that can occur while building an action registry
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Two actions were registered under the same qualified name
    DuplicateAction { action: String },

    /// An action declared an empty namespace or name
    InvalidActionName { namespace: String, name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateAction { action } => {
                write!(f, "Action '{}' is registered more than once", action)
            }
            RegistryError::InvalidActionName { namespace, name } => {
                write!(
                    f,
                    "Action name '{}' in namespace '{}' is invalid: both parts must be non-empty",
                    name, namespace
                )
            }
        }
    }
}

impl Error for RegistryError {}
