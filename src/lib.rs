// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data-transform actions for linear pipelines.
//!
//! A pipeline is an ordered list of steps, each naming a registered action
//! such as `core.transform.filter`. Items are JSON values. Predicates and
//! projections are written in a small sandboxed lambda language, and
//! `core.transform.scatter`/`core.transform.gather` open and close fan-outs
//! that run a sub-sequence once per element.
//!
//! # Example
//! ```rust
//! use dagwood_transforms::transforms;
//! use serde_json::json;
//!
//! let items = vec![json!(1), json!(2), json!(3), json!(4)];
//! let evens = transforms::filter(&items, "lambda x: x % 2 == 0").unwrap();
//! assert_eq!(evens, vec![json!(2), json!(4)]);
//! ```

pub mod actions;        // core.transform action catalog
pub mod config;         // pipeline loading + validation
pub mod engine;         // reference pipeline runner
pub mod errors;         // error handling
pub mod expression;     // sandboxed lambda language
pub mod fanout;         // scatter/gather contract
pub mod observability;
pub mod path;           // dotted/bracket path resolution
pub mod registry;       // action registry
pub mod traits;         // unified abstractions
pub mod transforms;     // pure transform functions
pub mod value;          // truthiness, numeric view, value keys
