// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic and operational logging goes through message structs in
//! [`messages`]. Each message borrows its fields, renders itself through
//! `Display` and implements [`messages::StructuredLog`] so call sites never
//! carry magic strings.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::action` - action invocation lifecycle
//! * `messages::engine` - pipeline runs, fan-out and fan-in
//! * `messages::expression` - sandbox compilation rejections
//! * `messages::validation` - configuration loading and validation
//!
//! # Usage
//!
//! ```rust
//! use dagwood_transforms::observability::messages::action::ActionInvocationStarted;
//! use dagwood_transforms::observability::messages::StructuredLog;
//!
//! let msg = ActionInvocationStarted {
//!     action: "core.transform.filter",
//!     argument_count: 2,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
