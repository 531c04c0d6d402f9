// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::{load_and_validate_config, validate_pipeline, ConfigFormat, PipelineConfig};
use crate::engine::PipelineRunner;
use crate::errors::{ErrorKind, ExecutionError};
use crate::registry::ActionRegistry;

fn registry() -> Arc<ActionRegistry> {
    Arc::new(ActionRegistry::with_core_transforms().unwrap())
}

fn parse(yaml: &str) -> PipelineConfig {
    let config = ConfigFormat::Yaml.parse(yaml).unwrap();
    validate_pipeline(&config, &registry()).unwrap();
    config
}

async fn run(config: PipelineConfig, input: Value) -> Result<Value, ExecutionError> {
    PipelineRunner::new(registry(), config).unwrap().run(input).await
}

fn fan_out_pipeline(strategy: &str, drop_nulls: bool) -> PipelineConfig {
    parse(&format!(
        r#"
steps:
  - id: each
    action: core.transform.scatter
    args:
      collection: [1, 0, 4]
  - id: inverse
    action: core.transform.apply
    args:
      value: "${{{{ item }}}}"
      python_lambda: "lambda x: None if x == 4 else 2 // x"
  - id: joined
    action: core.transform.gather
    args:
      items: steps.inverse
      drop_nulls: {}
      error_strategy: {}
"#,
        drop_nulls, strategy
    ))
}

fn division_error() -> Value {
    json!({
        "stream": 1,
        "step": "inverse",
        "kind": "evaluation",
        "message": "evaluation error: division by zero"
    })
}

#[tokio::test]
async fn test_gather_partition() {
    let context = run(fan_out_pipeline("partition", false), json!({})).await.unwrap();
    assert_eq!(
        context["steps"]["joined"],
        json!({"result": [2, null], "error": [division_error()]})
    );
    assert_eq!(context["steps"]["each"], json!([1, 0, 4]));
}

#[tokio::test]
async fn test_gather_include_keeps_error_in_place() {
    let context = run(fan_out_pipeline("include", true), json!({})).await.unwrap();
    assert_eq!(
        context["steps"]["joined"],
        json!({"result": [2, division_error()]})
    );
}

#[tokio::test]
async fn test_gather_drop() {
    let context = run(fan_out_pipeline("drop", false), json!({})).await.unwrap();
    assert_eq!(context["steps"]["joined"], json!({"result": [2, null]}));
}

#[tokio::test]
async fn test_failure_outside_fan_out_aborts() {
    let config = parse(
        r#"
steps:
  - id: totals
    action: core.transform.map
    args:
      items: "${{ input.rows }}"
      python_lambda: "lambda r: r['total']"
  - id: never
    action: core.transform.compact
    args:
      items: "${{ steps.totals }}"
"#,
    );

    let err = run(config, json!({"rows": [{"total": 1}, {}]})).await.unwrap_err();
    assert_eq!(err.step_id(), Some("totals"));
    assert_eq!(err.kind(), "evaluation");
}

#[tokio::test]
async fn test_missing_template_aborts_with_path_error() {
    let config = parse(
        r#"
steps:
  - id: clean
    action: core.transform.compact
    args:
      items: "${{ input.missing }}"
"#,
    );

    match run(config, json!({})).await.unwrap_err() {
        ExecutionError::StepFailed { step_id, source } => {
            assert_eq!(step_id, "clean");
            assert_eq!(source.kind(), ErrorKind::PathNotFound);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_nested_fan_out() {
    let config = parse(
        r#"
executor_options:
  max_concurrency: 1
steps:
  - id: groups
    action: core.transform.scatter
    args:
      collection: "input.groups"
  - id: members
    action: core.transform.scatter
    args:
      collection: "${{ item }}"
  - id: double
    action: core.transform.apply
    args:
      value: "${{ item }}"
      python_lambda: "lambda x: x * 2"
  - id: doubled
    action: core.transform.gather
    args:
      items: steps.double
  - id: all
    action: core.transform.gather
    args:
      items: steps.doubled.result
"#,
    );

    let context = run(config, json!({"groups": [[1, 2], [3], []]})).await.unwrap();
    assert_eq!(
        context["steps"]["all"],
        json!({"result": [[2, 4], [6], []], "error": []})
    );
}

#[tokio::test]
async fn test_empty_collection_yields_empty_result() {
    let config = parse(
        r#"
steps:
  - id: each
    action: core.transform.scatter
    args:
      collection: "${{ input.rows }}"
  - id: joined
    action: core.transform.gather
    args:
      items: item
"#,
    );

    let context = run(config, json!({"rows": []})).await.unwrap();
    assert_eq!(context["steps"]["joined"], json!({"result": [], "error": []}));
}

#[tokio::test]
async fn test_scatter_of_non_list_fails_pipeline() {
    let config = parse(
        r#"
steps:
  - id: each
    action: core.transform.scatter
    args:
      collection: input.rows
  - id: joined
    action: core.transform.gather
    args:
      items: item
"#,
    );

    let err = run(config, json!({"rows": 3})).await.unwrap_err();
    assert_eq!(err.step_id(), Some("each"));
    assert_eq!(err.kind(), "invalid_argument");
}

#[tokio::test]
async fn test_stream_order_preserved_under_concurrency() {
    let config = parse(
        r#"
executor_options:
  max_concurrency: 3
steps:
  - id: each
    action: core.transform.scatter
    args:
      collection: "${{ input.values }}"
  - id: squared
    action: core.transform.apply
    args:
      value: "${{ item }}"
      python_lambda: "lambda x: x ** 2"
  - id: joined
    action: core.transform.gather
    args:
      items: steps.squared
"#,
    );

    let values: Vec<i64> = (0..50).collect();
    let expected: Vec<i64> = values.iter().map(|v| v * v).collect();
    let context = run(config, json!({"values": values})).await.unwrap();
    assert_eq!(context["steps"]["joined"]["result"], json!(expected));
}

#[tokio::test]
async fn test_order_fanout_sample() {
    let config = load_and_validate_config("configs/order-fanout.yaml", &registry()).unwrap();
    let input = json!({
        "orders": [
            {"id": 1, "status": "open", "total": 10, "items": 4},
            {"id": 2, "status": "cancelled", "total": 99, "items": 1},
            {"id": 3, "status": "open", "total": 9, "items": 0},
            {"id": 4, "status": "open", "total": 7, "items": 2}
        ]
    });

    let context = run(config, input).await.unwrap();
    let scores = &context["steps"]["scores"];
    assert_eq!(scores["result"], json!([2.5, 3.5]));
    assert_eq!(scores["error"][0]["stream"], json!(1));
    assert_eq!(scores["error"][0]["step"], json!("score"));
    assert_eq!(context["steps"]["clean"], json!([2.5, 3.5]));
}

#[tokio::test]
async fn test_customer_dedupe_sample() {
    let config = load_and_validate_config("configs/customer-dedupe.json", &registry()).unwrap();
    let input = json!({
        "records": [
            {"customer": {"id": 1, "name": "ada lovelace"}, "orders": 1},
            {"customer": {"id": 2, "name": "alan turing"}, "orders": 4},
            {"customer": {"id": 1, "name": "ada lovelace"}, "orders": 2}
        ],
        "vip_ids": [1]
    });

    let context = run(config, input).await.unwrap();
    assert_eq!(
        context["steps"]["customers"],
        json!([
            {"customer": {"id": 1, "name": "ada lovelace"}, "orders": 2},
            {"customer": {"id": 2, "name": "alan turing"}, "orders": 4}
        ])
    );
    assert_eq!(context["steps"]["names"], json!(["Ada Lovelace"]));
}

#[tokio::test]
async fn test_tag_cleanup_sample() {
    let config = load_and_validate_config("configs/tag-cleanup.toml", &registry()).unwrap();
    let input = json!({"tags": ["rust", "", null, "spam", "tokio"]});

    let context = run(config, input).await.unwrap();
    assert_eq!(context["steps"]["shouting"], json!(["RUST", "TOKIO"]));
}
