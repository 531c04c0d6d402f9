// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod action;

pub use action::{Action, ActionIntent, ActionSpec};
