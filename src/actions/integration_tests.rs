// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{json, Value};

use crate::errors::ErrorKind;
use crate::registry::ActionRegistry;

fn registry() -> ActionRegistry {
    ActionRegistry::with_core_transforms().unwrap()
}

struct TestCase {
    name: &'static str,
    action: &'static str,
    args: Value,
    expected: Value,
}

#[tokio::test]
async fn test_actions_through_registry() {
    let cases = vec![
        TestCase {
            name: "reshape passes value through",
            action: "reshape",
            args: json!({"value": {"a": [1, 2]}}),
            expected: json!({"a": [1, 2]}),
        },
        TestCase {
            name: "filter",
            action: "filter",
            args: json!({"items": [1, 2, 3, 4], "python_lambda": "lambda x: x > 2"}),
            expected: json!([3, 4]),
        },
        TestCase {
            name: "is_in with key expression",
            action: "is_in",
            args: json!({
                "items": [{"id": 1}, {"id": 2}],
                "collection": [1],
                "python_lambda": "lambda x: x['id']"
            }),
            expected: json!([{"id": 1}]),
        },
        TestCase {
            name: "not_in with key expression",
            action: "not_in",
            args: json!({
                "items": [{"id": 1}, {"id": 2}],
                "collection": [1],
                "python_lambda": "lambda x: x['id']"
            }),
            expected: json!([{"id": 2}]),
        },
        TestCase {
            name: "is_in without key expression",
            action: "is_in",
            args: json!({"items": ["a", "b", "a"], "collection": ["a"]}),
            expected: json!(["a", "a"]),
        },
        TestCase {
            name: "map with expression alias",
            action: "map",
            args: json!({"items": ["a", "b"], "expression": "s -> s.upper()"}),
            expected: json!(["A", "B"]),
        },
        TestCase {
            name: "apply",
            action: "apply",
            args: json!({"value": [3, 1, 2], "python_lambda": "lambda x: sorted(x)"}),
            expected: json!([1, 2, 3]),
        },
        TestCase {
            name: "compact",
            action: "compact",
            args: json!({"items": [null, "", 0, false, "a"]}),
            expected: json!([0, false, "a"]),
        },
        TestCase {
            name: "deduplicate",
            action: "deduplicate",
            args: json!({
                "items": [{"user": {"id": 1}, "v": 1}, {"user": {"id": 1}, "v": 2}],
                "keys": ["user.id"]
            }),
            expected: json!([{"user": {"id": 1}, "v": 2}]),
        },
        TestCase {
            name: "deduplicate empty",
            action: "deduplicate",
            args: json!({"items": [], "keys": ["x"]}),
            expected: json!([]),
        },
    ];

    let registry = registry();
    for case in cases {
        let key = format!("core.transform.{}", case.action);
        let actual = registry
            .invoke(&key, case.args)
            .await
            .unwrap_or_else(|e| panic!("{}: {}", case.name, e));
        assert_eq!(actual, case.expected, "{}", case.name);
    }
}

#[tokio::test]
async fn test_error_kinds_through_registry() {
    let cases = vec![
        ("filter", json!({"items": [1], "python_lambda": "import os"}), ErrorKind::Compilation),
        ("filter", json!({"items": [1], "python_lambda": "lambda x: x['a']"}), ErrorKind::Evaluation),
        ("deduplicate", json!({"items": [{"a": 1}], "keys": ["b"]}), ErrorKind::PathNotFound),
        ("compact", json!({"items": "not a list"}), ErrorKind::InvalidArgument),
        ("compact", json!({"items": [], "extra": 1}), ErrorKind::InvalidArgument),
        ("map", json!({"items": []}), ErrorKind::InvalidArgument),
        ("scatter", json!({"collection": [1, 2]}), ErrorKind::UnsupportedContext),
        ("gather", json!({"items": "x"}), ErrorKind::UnsupportedContext),
        ("gather", json!(null), ErrorKind::UnsupportedContext),
        ("explode", json!({}), ErrorKind::UnknownAction),
    ];

    let registry = registry();
    for (action, args, expected) in cases {
        let key = format!("core.transform.{}", action);
        let err = registry.invoke(&key, args.clone()).await.unwrap_err();
        assert_eq!(err.kind(), expected, "{} {}", action, args);
    }
}

#[test]
fn test_static_validation_skips_templates() {
    let registry = registry();
    let ok = vec![
        ("filter", json!({"items": "${{ input.rows }}", "python_lambda": "lambda x: x"})),
        ("map", json!({"items": [], "python_lambda": "${{ input.expr }}"})),
        ("is_in", json!({"items": "${{ a }}", "collection": "${{ b }}"})),
        ("deduplicate", json!({"items": "${{ a }}", "keys": ["a.b", "c[0]"]})),
    ];
    for (action, args) in ok {
        let key = format!("core.transform.{}", action);
        assert!(registry.validate(&key, &args).is_ok(), "{} {}", action, args);
    }

    let err = registry
        .validate("core.transform.deduplicate", &json!({"items": [], "keys": []}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = registry
        .validate("core.transform.filter", &json!({"items": "rows", "python_lambda": "lambda x: x"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
