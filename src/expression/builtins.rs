// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The allow-listed functions and methods an expression may call.
//!
//! Nothing here touches the environment: every entry maps JSON values to a
//! JSON value.

use serde_json::Value;

use super::eval::{compare_values, num_or_error};
use crate::errors::EvaluationError;
use crate::value::{is_truthy, type_name, values_equal, Num};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Len,
    Str,
    Int,
    Float,
    Bool,
    Abs,
    Min,
    Max,
    Sum,
    Sorted,
    Reversed,
    Any,
    All,
    Round,
    List,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "len" => Builtin::Len,
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "bool" => Builtin::Bool,
            "abs" => Builtin::Abs,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "sum" => Builtin::Sum,
            "sorted" => Builtin::Sorted,
            "reversed" => Builtin::Reversed,
            "any" => Builtin::Any,
            "all" => Builtin::All,
            "round" => Builtin::Round,
            "list" => Builtin::List,
            _ => return None,
        };
        Some(builtin)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sum => "sum",
            Builtin::Sorted => "sorted",
            Builtin::Reversed => "reversed",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Round => "round",
            Builtin::List => "list",
        }
    }

    /// Accepted argument count as `(min, max)`; `None` means unbounded.
    pub(crate) fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Builtin::Min | Builtin::Max => (1, None),
            Builtin::Sum | Builtin::Round => (1, Some(2)),
            _ => (1, Some(1)),
        }
    }

    pub(crate) fn call(&self, mut args: Vec<Value>) -> Result<Value, EvaluationError> {
        // arity is enforced at compile time
        let first = args.remove(0);
        match self {
            Builtin::Len => len(&first),
            Builtin::Str => Ok(Value::String(to_display_string(&first))),
            Builtin::Int => to_int(&first),
            Builtin::Float => to_float(&first),
            Builtin::Bool => Ok(Value::Bool(is_truthy(&first))),
            Builtin::Abs => match num_or_error(&first, "abs")? {
                Num::Int(i) => i
                    .checked_abs()
                    .map(Value::from)
                    .ok_or_else(|| EvaluationError::new("integer overflow in abs()")),
                Num::Float(f) => float_value(f.abs()),
            },
            Builtin::Min => extremum(first, args, std::cmp::Ordering::Less, "min"),
            Builtin::Max => extremum(first, args, std::cmp::Ordering::Greater, "max"),
            Builtin::Sum => sum(&first, args.pop()),
            Builtin::Sorted => {
                let mut items = iterate(&first, "sorted")?;
                sort_values(&mut items)?;
                Ok(Value::Array(items))
            }
            Builtin::Reversed => {
                let mut items = iterate(&first, "reversed")?;
                items.reverse();
                Ok(Value::Array(items))
            }
            Builtin::Any => Ok(Value::Bool(iterate(&first, "any")?.iter().any(is_truthy))),
            Builtin::All => Ok(Value::Bool(iterate(&first, "all")?.iter().all(is_truthy))),
            Builtin::Round => round(&first, args.pop()),
            Builtin::List => Ok(Value::Array(iterate(&first, "list")?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    // mappings
    Get,
    Keys,
    Values,
    Items,
    // strings
    Lower,
    Upper,
    Title,
    Strip,
    LStrip,
    RStrip,
    StartsWith,
    EndsWith,
    Split,
    Replace,
    Join,
    // sequences
    Count,
    Index,
}

impl Method {
    pub(crate) fn from_name(name: &str) -> Option<Method> {
        let method = match name {
            "get" => Method::Get,
            "keys" => Method::Keys,
            "values" => Method::Values,
            "items" => Method::Items,
            "lower" => Method::Lower,
            "upper" => Method::Upper,
            "title" => Method::Title,
            "strip" => Method::Strip,
            "lstrip" => Method::LStrip,
            "rstrip" => Method::RStrip,
            "startswith" => Method::StartsWith,
            "endswith" => Method::EndsWith,
            "split" => Method::Split,
            "replace" => Method::Replace,
            "join" => Method::Join,
            "count" => Method::Count,
            "index" => Method::Index,
            _ => return None,
        };
        Some(method)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Keys => "keys",
            Method::Values => "values",
            Method::Items => "items",
            Method::Lower => "lower",
            Method::Upper => "upper",
            Method::Title => "title",
            Method::Strip => "strip",
            Method::LStrip => "lstrip",
            Method::RStrip => "rstrip",
            Method::StartsWith => "startswith",
            Method::EndsWith => "endswith",
            Method::Split => "split",
            Method::Replace => "replace",
            Method::Join => "join",
            Method::Count => "count",
            Method::Index => "index",
        }
    }

    pub(crate) fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Method::Keys | Method::Values | Method::Items => (0, Some(0)),
            Method::Lower | Method::Upper | Method::Title => (0, Some(0)),
            Method::Strip | Method::LStrip | Method::RStrip | Method::Split => (0, Some(1)),
            Method::Get => (1, Some(2)),
            Method::Replace => (2, Some(2)),
            Method::StartsWith | Method::EndsWith | Method::Join => (1, Some(1)),
            Method::Count | Method::Index => (1, Some(1)),
        }
    }

    pub(crate) fn call(&self, target: &Value, args: Vec<Value>) -> Result<Value, EvaluationError> {
        match (self, target) {
            (Method::Get, Value::Object(map)) => {
                let default = args.get(1).cloned().unwrap_or(Value::Null);
                Ok(match &args[0] {
                    Value::String(key) => map.get(key).cloned().unwrap_or(default),
                    _ => default,
                })
            }
            (Method::Keys, Value::Object(map)) => {
                Ok(Value::Array(map.keys().cloned().map(Value::String).collect()))
            }
            (Method::Values, Value::Object(map)) => Ok(Value::Array(map.values().cloned().collect())),
            (Method::Items, Value::Object(map)) => Ok(Value::Array(
                map.iter()
                    .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                    .collect(),
            )),

            (Method::Lower, Value::String(s)) => Ok(Value::String(s.to_lowercase())),
            (Method::Upper, Value::String(s)) => Ok(Value::String(s.to_uppercase())),
            (Method::Title, Value::String(s)) => Ok(Value::String(title_case(s))),
            (Method::Strip, Value::String(s)) => strip(s, args.first(), true, true),
            (Method::LStrip, Value::String(s)) => strip(s, args.first(), true, false),
            (Method::RStrip, Value::String(s)) => strip(s, args.first(), false, true),
            (Method::StartsWith, Value::String(s)) => {
                let prefix = string_arg(&args[0], "startswith")?;
                Ok(Value::Bool(s.starts_with(prefix)))
            }
            (Method::EndsWith, Value::String(s)) => {
                let suffix = string_arg(&args[0], "endswith")?;
                Ok(Value::Bool(s.ends_with(suffix)))
            }
            (Method::Split, Value::String(s)) => {
                let parts: Vec<Value> = match args.first() {
                    None | Some(Value::Null) => s
                        .split_whitespace()
                        .map(|p| Value::String(p.to_string()))
                        .collect(),
                    Some(sep) => {
                        let sep = string_arg(sep, "split")?;
                        if sep.is_empty() {
                            return Err(EvaluationError::new("split(): empty separator"));
                        }
                        s.split(sep).map(|p| Value::String(p.to_string())).collect()
                    }
                };
                Ok(Value::Array(parts))
            }
            (Method::Replace, Value::String(s)) => {
                let old = string_arg(&args[0], "replace")?;
                let new = string_arg(&args[1], "replace")?;
                Ok(Value::String(s.replace(old, new)))
            }
            (Method::Join, Value::String(sep)) => {
                let items = iterate(&args[0], "join")?;
                let parts = items
                    .iter()
                    .map(|item| match item {
                        Value::String(part) => Ok(part.as_str()),
                        other => Err(EvaluationError::new(format!(
                            "join(): expected str items, found {}",
                            type_name(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::String(parts.join(sep)))
            }

            (Method::Count, Value::Array(items)) => {
                Ok(Value::from(items.iter().filter(|v| values_equal(v, &args[0])).count() as u64))
            }
            (Method::Count, Value::String(s)) => {
                let needle = string_arg(&args[0], "count")?;
                if needle.is_empty() {
                    return Ok(Value::from(s.chars().count() as u64 + 1));
                }
                Ok(Value::from(s.matches(needle).count() as u64))
            }
            (Method::Index, Value::Array(items)) => items
                .iter()
                .position(|v| values_equal(v, &args[0]))
                .map(|i| Value::from(i as u64))
                .ok_or_else(|| EvaluationError::new("index(): value is not in list")),

            (method, other) => Err(EvaluationError::new(format!(
                "'{}' object has no attribute '{}'",
                type_name(other),
                method.name()
            ))),
        }
    }
}

fn string_arg<'v>(value: &'v Value, function: &str) -> Result<&'v str, EvaluationError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(EvaluationError::new(format!(
            "{}(): expected str argument, found {}",
            function,
            type_name(other)
        ))),
    }
}

/// Items of an iterable value: list elements, string characters or mapping keys.
pub(crate) fn iterate(value: &Value, function: &str) -> Result<Vec<Value>, EvaluationError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::Object(map) => Ok(map.keys().cloned().map(Value::String).collect()),
        other => Err(EvaluationError::new(format!(
            "{}(): '{}' object is not iterable",
            function,
            type_name(other)
        ))),
    }
}

fn len(value: &Value) -> Result<Value, EvaluationError> {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(EvaluationError::new(format!(
                "object of type '{}' has no len()",
                type_name(other)
            )))
        }
    };
    Ok(Value::from(n as u64))
}

fn float_value(f: f64) -> Result<Value, EvaluationError> {
    Num::Float(f)
        .into_value()
        .ok_or_else(|| EvaluationError::new("result is not a finite number"))
}

/// Rendering used by `str()`.
pub(crate) fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match Num::from_number(n) {
            Num::Int(i) => i.to_string(),
            Num::Float(f) if f.fract() == 0.0 && f.abs() < 1e16 => format!("{:.1}", f),
            Num::Float(f) => f.to_string(),
        },
        other => other.to_string(),
    }
}

fn to_int(value: &Value) -> Result<Value, EvaluationError> {
    match value {
        Value::Bool(b) => Ok(Value::from(*b as i64)),
        Value::Number(n) => match Num::from_number(n) {
            Num::Int(i) => Ok(Value::from(i)),
            Num::Float(f) => {
                let truncated = f.trunc();
                if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                    Ok(Value::from(truncated as i64))
                } else {
                    Err(EvaluationError::new("int(): value out of range"))
                }
            }
        },
        Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| {
            EvaluationError::new(format!("invalid literal for int() with base 10: '{}'", s))
        }),
        other => Err(EvaluationError::new(format!(
            "int() argument must be a string or a number, not '{}'",
            type_name(other)
        ))),
    }
}

fn to_float(value: &Value) -> Result<Value, EvaluationError> {
    let f = match value {
        Value::Bool(b) => *b as i64 as f64,
        Value::Number(n) => Num::from_number(n).as_f64(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| EvaluationError::new(format!("could not convert string to float: '{}'", s)))?,
        other => {
            return Err(EvaluationError::new(format!(
                "float() argument must be a string or a number, not '{}'",
                type_name(other)
            )))
        }
    };
    float_value(f)
}

fn extremum(
    first: Value,
    rest: Vec<Value>,
    wanted: std::cmp::Ordering,
    function: &str,
) -> Result<Value, EvaluationError> {
    let candidates = if rest.is_empty() {
        iterate(&first, function)?
    } else {
        std::iter::once(first).chain(rest).collect()
    };

    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                if compare_values(&candidate, &current)? == wanted {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.ok_or_else(|| EvaluationError::new(format!("{}() arg is an empty sequence", function)))
}

fn sum(iterable: &Value, start: Option<Value>) -> Result<Value, EvaluationError> {
    let mut total = match &start {
        Some(value) => num_or_error(value, "sum")?,
        None => Num::Int(0),
    };
    for item in iterate(iterable, "sum")? {
        let n = num_or_error(&item, "sum")?;
        total = match (total, n) {
            (Num::Int(a), Num::Int(b)) => Num::Int(
                a.checked_add(b)
                    .ok_or_else(|| EvaluationError::new("integer overflow in sum()"))?,
            ),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        };
    }
    total
        .into_value()
        .ok_or_else(|| EvaluationError::new("result is not a finite number"))
}

fn round(value: &Value, digits: Option<Value>) -> Result<Value, EvaluationError> {
    let n = num_or_error(value, "round")?;
    let digits = match digits {
        None | Some(Value::Null) => None,
        Some(d) => match num_or_error(&d, "round")? {
            Num::Int(i) => Some(i),
            Num::Float(_) => return Err(EvaluationError::new("round(): ndigits must be an integer")),
        },
    };

    match (n, digits) {
        (Num::Int(i), None) => Ok(Value::from(i)),
        (Num::Float(f), None) => to_int(&float_value(f.round_ties_even())?),
        (Num::Int(i), Some(d)) if d >= 0 => Ok(Value::from(i)),
        (n, Some(d)) => {
            let d = d.clamp(-308, 308) as i32;
            let factor = 10f64.powi(d);
            let rounded = (n.as_f64() * factor).round_ties_even() / factor;
            match n {
                Num::Int(_) => to_int(&float_value(rounded)?),
                Num::Float(_) => float_value(rounded),
            }
        }
    }
}

/// Stable sort by [`compare_values`]; the first incomparable pair is an error.
pub(crate) fn sort_values(items: &mut [Value]) -> Result<(), EvaluationError> {
    let mut failure = None;
    items.sort_by(|a, b| match compare_values(a, b) {
        Ok(ordering) => ordering,
        Err(e) => {
            failure.get_or_insert(e);
            std::cmp::Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn strip(s: &str, chars: Option<&Value>, left: bool, right: bool) -> Result<Value, EvaluationError> {
    let set: Option<Vec<char>> = match chars {
        None | Some(Value::Null) => None,
        Some(value) => Some(string_arg(value, "strip")?.chars().collect()),
    };
    let matches = |c: char| match &set {
        Some(set) => set.contains(&c),
        None => c.is_whitespace(),
    };

    let mut out = s;
    if left {
        out = out.trim_start_matches(matches);
    }
    if right {
        out = out.trim_end_matches(matches);
    }
    Ok(Value::String(out.to_string()))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_table() {
        let cases = vec![
            (Builtin::Len, vec![json!("héllo")], json!(5)),
            (Builtin::Len, vec![json!({"a": 1})], json!(1)),
            (Builtin::Str, vec![json!(2.0)], json!("2.0")),
            (Builtin::Str, vec![json!(null)], json!("None")),
            (Builtin::Int, vec![json!(" 42 ")], json!(42)),
            (Builtin::Int, vec![json!(-2.7)], json!(-2)),
            (Builtin::Float, vec![json!("1.5")], json!(1.5)),
            (Builtin::Abs, vec![json!(-3)], json!(3)),
            (Builtin::Min, vec![json!([3, 1, 2])], json!(1)),
            (Builtin::Max, vec![json!(3), json!(7.5)], json!(7.5)),
            (Builtin::Sum, vec![json!([1, 2, 3])], json!(6)),
            (Builtin::Sum, vec![json!([1, 2.5])], json!(3.5)),
            (Builtin::Sorted, vec![json!(["b", "a", "c"])], json!(["a", "b", "c"])),
            (Builtin::Reversed, vec![json!([1, 2, 3])], json!([3, 2, 1])),
            (Builtin::Any, vec![json!([0, "", 1])], json!(true)),
            (Builtin::All, vec![json!([1, "a", []])], json!(false)),
            (Builtin::Round, vec![json!(2.5)], json!(2)),
            (Builtin::Round, vec![json!(3.14159), json!(2)], json!(3.14)),
            (Builtin::List, vec![json!("ab")], json!(["a", "b"])),
        ];

        for (builtin, args, expected) in cases {
            let result = builtin.call(args.clone()).unwrap();
            assert_eq!(result, expected, "{}({:?})", builtin.name(), args);
        }
    }

    #[test]
    fn test_method_table() {
        let cases = vec![
            (Method::Get, json!({"a": 1}), vec![json!("b"), json!(0)], json!(0)),
            (Method::Get, json!({"a": 1}), vec![json!("a")], json!(1)),
            (Method::Keys, json!({"a": 1, "b": 2}), vec![], json!(["a", "b"])),
            (Method::Items, json!({"a": 1}), vec![], json!([["a", 1]])),
            (Method::Lower, json!("AbC"), vec![], json!("abc")),
            (Method::Title, json!("hello wORLD"), vec![], json!("Hello World")),
            (Method::Strip, json!("  x "), vec![], json!("x")),
            (Method::RStrip, json!("x--"), vec![json!("-")], json!("x")),
            (Method::Split, json!("a b  c"), vec![], json!(["a", "b", "c"])),
            (Method::Split, json!("a,b"), vec![json!(",")], json!(["a", "b"])),
            (Method::Replace, json!("aXa"), vec![json!("a"), json!("b")], json!("bXb")),
            (Method::Join, json!("-"), vec![json!(["a", "b"])], json!("a-b")),
            (Method::StartsWith, json!("prefix"), vec![json!("pre")], json!(true)),
            (Method::Count, json!([1, 1.0, 2]), vec![json!(1)], json!(2)),
            (Method::Index, json!(["a", "b"]), vec![json!("b")], json!(1)),
        ];

        for (method, target, args, expected) in cases {
            let result = method.call(&target, args.clone()).unwrap();
            assert_eq!(result, expected, "{}.{}({:?})", target, method.name(), args);
        }
    }

    #[test]
    fn test_method_on_wrong_type_is_missing_attribute() {
        let err = Method::Lower.call(&json!(1), vec![]).unwrap_err();
        assert_eq!(err.reason, "'int' object has no attribute 'lower'");
    }

    #[test]
    fn test_min_of_empty_sequence_fails() {
        let err = Builtin::Min.call(vec![json!([])]).unwrap_err();
        assert!(err.reason.contains("empty sequence"));
    }

    #[test]
    fn test_sorted_mixed_types_fails() {
        let err = Builtin::Sorted.call(vec![json!([1, "a"])]).unwrap_err();
        assert!(err.reason.contains("not supported"), "{}", err.reason);
    }
}
