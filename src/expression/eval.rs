// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tree-walking evaluator.
//!
//! Evaluation is a pure function of the expression tree and the bound
//! values: there is no global state, no I/O and no way to reach host objects.

use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::builtins::iterate;
use crate::errors::EvaluationError;
use crate::value::{is_truthy, type_name, values_equal, Num};

pub(crate) struct Evaluator<'e> {
    bindings: Vec<(&'e str, Value)>,
}

impl<'e> Evaluator<'e> {
    pub(crate) fn new(param: &'e str, argument: Value) -> Self {
        Self {
            bindings: vec![(param, argument)],
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvaluationError> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| EvaluationError::new(format!("name '{}' is not bound", name)))
    }

    pub(crate) fn eval(&mut self, expr: &'e Expr) -> Result<Value, EvaluationError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => self.lookup(name),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Dict(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let key = match self.eval(key)? {
                        Value::String(s) => s,
                        other => {
                            return Err(EvaluationError::new(format!(
                                "dict keys must be str, found {}",
                                type_name(&other)
                            )))
                        }
                    };
                    let value = self.eval(value)?;
                    map.insert(key, value);
                }
                Ok(Value::Object(map))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, &value)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if !is_truthy(&left) {
                    return Ok(left);
                }
                self.eval(right)
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if is_truthy(&left) {
                    return Ok(left);
                }
                self.eval(right)
            }
            Expr::Not(operand) => Ok(Value::Bool(!is_truthy(&self.eval(operand)?))),
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if is_truthy(&self.eval(test)?) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                subscript(&target, &index)
            }
            Expr::Slice {
                target,
                start,
                end,
                step,
            } => {
                let target = self.eval(target)?;
                let start = self.eval_optional_int(start.as_deref())?;
                let end = self.eval_optional_int(end.as_deref())?;
                let step = self.eval_optional_int(step.as_deref())?;
                slice(&target, start, end, step)
            }
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                function.call(args)
            }
            Expr::MethodCall {
                target,
                method,
                args,
            } => {
                let target = self.eval(target)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                method.call(&target, args)
            }
            Expr::Comprehension {
                element,
                var,
                iter,
                condition,
            } => {
                let source = self.eval(iter)?;
                let items = iterate(&source, "comprehension")?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    self.bindings.push((var.as_str(), item));
                    let result = self.comprehension_step(element, condition.as_deref());
                    self.bindings.pop();
                    if let Some(value) = result? {
                        out.push(value);
                    }
                }
                Ok(Value::Array(out))
            }
        }
    }

    fn comprehension_step(
        &mut self,
        element: &'e Expr,
        condition: Option<&'e Expr>,
    ) -> Result<Option<Value>, EvaluationError> {
        if let Some(condition) = condition {
            if !is_truthy(&self.eval(condition)?) {
                return Ok(None);
            }
        }
        self.eval(element).map(Some)
    }

    fn eval_optional_int(&mut self, expr: Option<&'e Expr>) -> Result<Option<i64>, EvaluationError> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        match self.eval(expr)? {
            Value::Null => Ok(None),
            value => match Num::from_value(&value) {
                Some(Num::Int(i)) => Ok(Some(i)),
                _ => Err(EvaluationError::new(format!(
                    "slice indices must be integers or None, not {}",
                    type_name(&value)
                ))),
            },
        }
    }
}

pub(crate) fn num_or_error(value: &Value, context: &str) -> Result<Num, EvaluationError> {
    Num::from_value(value).ok_or_else(|| {
        EvaluationError::new(format!(
            "{}: expected a number, found {}",
            context,
            type_name(value)
        ))
    })
}

fn num_value(n: Num) -> Result<Value, EvaluationError> {
    n.into_value()
        .ok_or_else(|| EvaluationError::new("result is not a finite number"))
}

fn overflow(op: &str) -> EvaluationError {
    EvaluationError::new(format!("integer overflow in '{}'", op))
}

fn unsupported(op: &str, left: &Value, right: &Value) -> EvaluationError {
    EvaluationError::new(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        type_name(left),
        type_name(right)
    ))
}

fn unary(op: UnaryOp, value: &Value) -> Result<Value, EvaluationError> {
    let symbol = match op {
        UnaryOp::Negate => "-",
        UnaryOp::Plus => "+",
    };
    let n = Num::from_value(value).ok_or_else(|| {
        EvaluationError::new(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            type_name(value)
        ))
    })?;
    match (op, n) {
        (UnaryOp::Plus, n) => num_value(n),
        (UnaryOp::Negate, Num::Int(i)) => i.checked_neg().map(Value::from).ok_or_else(|| overflow("-")),
        (UnaryOp::Negate, Num::Float(f)) => num_value(Num::Float(-f)),
    }
}

fn repeat<T: Clone>(items: &[T], times: i64) -> Result<Vec<T>, EvaluationError> {
    let times = times.max(0) as usize;
    if items.len().saturating_mul(times) > MAX_REPEAT_LEN {
        return Err(EvaluationError::new("repetition result is too large"));
    }
    Ok((0..times).flat_map(|_| items.iter().cloned()).collect())
}

/// Upper bound on elements produced by `*` repetition.
const MAX_REPEAT_LEN: usize = 1 << 20;

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvaluationError> {
    match (op, left, right) {
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Multiply, Value::String(s), Value::Number(n))
        | (BinaryOp::Multiply, Value::Number(n), Value::String(s)) => match Num::from_number(n) {
            Num::Int(times) => {
                let chars: Vec<char> = s.chars().collect();
                Ok(Value::String(repeat(&chars, times)?.into_iter().collect()))
            }
            Num::Float(_) => Err(unsupported("*", left, right)),
        },
        (BinaryOp::Multiply, Value::Array(items), Value::Number(n))
        | (BinaryOp::Multiply, Value::Number(n), Value::Array(items)) => match Num::from_number(n) {
            Num::Int(times) => Ok(Value::Array(repeat(items, times)?)),
            Num::Float(_) => Err(unsupported("*", left, right)),
        },
        (op, Value::Number(a), Value::Number(b)) => {
            arithmetic(op, Num::from_number(a), Num::from_number(b))
        }
        (op, left, right) => Err(unsupported(op_symbol(op), left, right)),
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::FloorDivide => "//",
        BinaryOp::Modulo => "%",
        BinaryOp::Power => "**",
    }
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> Result<Value, EvaluationError> {
    let symbol = op_symbol(op);
    let divides_by_zero = matches!(op, BinaryOp::Divide | BinaryOp::FloorDivide | BinaryOp::Modulo)
        && b.as_f64() == 0.0;
    if divides_by_zero {
        return Err(EvaluationError::new("division by zero"));
    }

    let result = match (op, a, b) {
        (BinaryOp::Add, Num::Int(x), Num::Int(y)) => Num::Int(x.checked_add(y).ok_or_else(|| overflow(symbol))?),
        (BinaryOp::Subtract, Num::Int(x), Num::Int(y)) => Num::Int(x.checked_sub(y).ok_or_else(|| overflow(symbol))?),
        (BinaryOp::Multiply, Num::Int(x), Num::Int(y)) => Num::Int(x.checked_mul(y).ok_or_else(|| overflow(symbol))?),
        (BinaryOp::FloorDivide, Num::Int(x), Num::Int(y)) => {
            let q = x.checked_div(y).ok_or_else(|| overflow(symbol))?;
            // round toward negative infinity
            if (x % y != 0) && ((x < 0) != (y < 0)) {
                Num::Int(q - 1)
            } else {
                Num::Int(q)
            }
        }
        (BinaryOp::Modulo, Num::Int(x), Num::Int(y)) => {
            let r = x.checked_rem(y).ok_or_else(|| overflow(symbol))?;
            // result takes the sign of the divisor
            if r != 0 && ((r < 0) != (y < 0)) {
                Num::Int(r + y)
            } else {
                Num::Int(r)
            }
        }
        (BinaryOp::Power, Num::Int(x), Num::Int(y)) if y >= 0 => {
            let exponent = u32::try_from(y).map_err(|_| overflow(symbol))?;
            Num::Int(x.checked_pow(exponent).ok_or_else(|| overflow(symbol))?)
        }
        (op, a, b) => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Num::Float(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Subtract => x - y,
                BinaryOp::Multiply => x * y,
                BinaryOp::Divide => x / y,
                BinaryOp::FloorDivide => (x / y).floor(),
                BinaryOp::Modulo => {
                    let r = x % y;
                    if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                        r + y
                    } else {
                        r
                    }
                }
                BinaryOp::Power => x.powf(y),
            })
        }
    };
    num_value(result)
}

/// Ordering used by `<`, `sorted`, `min` and `max`.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Result<Ordering, EvaluationError> {
    let incomparable = || {
        EvaluationError::new(format!(
            "ordering comparison not supported between instances of '{}' and '{}'",
            type_name(left),
            type_name(right)
        ))
    };
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Num::from_number(a)
            .compare(Num::from_number(b))
            .ok_or_else(incomparable),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                if values_equal(x, y) {
                    continue;
                }
                return compare_values(x, y);
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(incomparable()),
    }
}

/// Membership test behind `in`.
pub(crate) fn contains(container: &Value, item: &Value) -> Result<bool, EvaluationError> {
    match container {
        Value::Array(items) => Ok(items.iter().any(|candidate| values_equal(candidate, item))),
        Value::Object(map) => Ok(matches!(item, Value::String(key) if map.contains_key(key))),
        Value::String(haystack) => match item {
            Value::String(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvaluationError::new(format!(
                "'in <string>' requires string as left operand, not {}",
                type_name(other)
            ))),
        },
        other => Err(EvaluationError::new(format!(
            "argument of type '{}' is not iterable",
            type_name(other)
        ))),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvaluationError> {
    Ok(match op {
        CompareOp::Equal => values_equal(left, right),
        CompareOp::NotEqual => !values_equal(left, right),
        CompareOp::Less => compare_values(left, right)? == Ordering::Less,
        CompareOp::LessEqual => compare_values(left, right)? != Ordering::Greater,
        CompareOp::Greater => compare_values(left, right)? == Ordering::Greater,
        CompareOp::GreaterEqual => compare_values(left, right)? != Ordering::Less,
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
        CompareOp::Is => same_identity(left, right),
        CompareOp::IsNot => !same_identity(left, right),
    })
}

/// `is` has no object identity to work with; values of the same type that
/// are equal are treated as identical, which is what `x is None` needs.
fn same_identity(left: &Value, right: &Value) -> bool {
    type_name(left) == type_name(right) && values_equal(left, right)
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvaluationError> {
    match target {
        Value::Array(items) => {
            let i = match Num::from_value(index) {
                Some(Num::Int(i)) => i,
                _ => {
                    return Err(EvaluationError::new(format!(
                        "list indices must be integers, not {}",
                        type_name(index)
                    )))
                }
            };
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| EvaluationError::new("list index out of range"))
        }
        Value::String(s) => {
            let i = match Num::from_value(index) {
                Some(Num::Int(i)) => i,
                _ => {
                    return Err(EvaluationError::new(format!(
                        "string indices must be integers, not {}",
                        type_name(index)
                    )))
                }
            };
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::String(chars[i].to_string()))
                .ok_or_else(|| EvaluationError::new("string index out of range"))
        }
        Value::Object(map) => match index {
            Value::String(key) => map
                .get(key)
                .cloned()
                .ok_or_else(|| EvaluationError::new(format!("key '{}' not found", key))),
            other => Err(EvaluationError::new(format!(
                "key {} not found",
                other
            ))),
        },
        other => Err(EvaluationError::new(format!(
            "'{}' object is not subscriptable",
            type_name(other)
        ))),
    }
}

/// Python slice semantics: clamped bounds, negative indices, non-zero step.
fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };

    let mut indices = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |s| clamp(s, 0, len));
        let stop = end.map_or(len, |e| clamp(e, 0, len));
        while i < stop {
            indices.push(i as usize);
            i += step;
        }
    } else {
        let mut i = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let stop = end.map_or(-1, |e| clamp(e, -1, len - 1));
        while i > stop {
            indices.push(i as usize);
            i += step;
        }
    }
    indices
}

fn slice(
    target: &Value,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Result<Value, EvaluationError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvaluationError::new("slice step cannot be zero"));
    }
    match target {
        Value::Array(items) => Ok(Value::Array(
            slice_indices(items.len(), start, end, step)
                .into_iter()
                .map(|i| items[i].clone())
                .collect(),
        )),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::String(
                slice_indices(chars.len(), start, end, step)
                    .into_iter()
                    .map(|i| chars[i])
                    .collect(),
            ))
        }
        other => Err(EvaluationError::new(format!(
            "'{}' object is not subscriptable",
            type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_python_division_semantics() {
        let cases = vec![
            (BinaryOp::Divide, json!(7), json!(2), json!(3.5)),
            (BinaryOp::FloorDivide, json!(7), json!(2), json!(3)),
            (BinaryOp::FloorDivide, json!(-7), json!(2), json!(-4)),
            (BinaryOp::Modulo, json!(-7), json!(3), json!(2)),
            (BinaryOp::Modulo, json!(7), json!(-3), json!(-2)),
            (BinaryOp::Power, json!(2), json!(10), json!(1024)),
            (BinaryOp::Power, json!(2), json!(-1), json!(0.5)),
            (BinaryOp::Add, json!(1), json!(0.5), json!(1.5)),
            (BinaryOp::Add, json!("a"), json!("b"), json!("ab")),
            (BinaryOp::Add, json!([1]), json!([2]), json!([1, 2])),
            (BinaryOp::Multiply, json!("ab"), json!(2), json!("abab")),
            (BinaryOp::Multiply, json!([1, 2]), json!(2), json!([1, 2, 1, 2])),
            (BinaryOp::Multiply, json!(3), json!([0]), json!([0, 0, 0])),
            (BinaryOp::Multiply, json!([1]), json!(-1), json!([])),
        ];

        for (op, left, right, expected) in cases {
            assert_eq!(
                binary(op, &left, &right).unwrap(),
                expected,
                "{} {} {}",
                left,
                op_symbol(op),
                right
            );
        }
    }

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(
            binary(BinaryOp::Divide, &json!(1), &json!(0)).unwrap_err().reason,
            "division by zero"
        );
        assert!(binary(BinaryOp::Add, &json!(i64::MAX), &json!(1))
            .unwrap_err()
            .reason
            .contains("overflow"));
        assert!(binary(BinaryOp::Add, &json!("a"), &json!(1))
            .unwrap_err()
            .reason
            .contains("unsupported operand"));
    }

    #[test]
    fn test_repetition_is_bounded() {
        let too_long = 1i64 << 21;
        for (left, right) in [(json!([1]), json!(too_long)), (json!("a"), json!(too_long))] {
            let err = binary(BinaryOp::Multiply, &left, &right).unwrap_err();
            assert_eq!(err.reason, "repetition result is too large", "{} * {}", left, right);
        }
        assert!(binary(BinaryOp::Multiply, &json!([1]), &json!(1.5)).is_err());
    }

    #[test]
    fn test_slices() {
        let items = json!([0, 1, 2, 3, 4]);
        assert_eq!(slice(&items, Some(1), Some(3), None).unwrap(), json!([1, 2]));
        assert_eq!(slice(&items, None, None, Some(-1)).unwrap(), json!([4, 3, 2, 1, 0]));
        assert_eq!(slice(&items, Some(-2), None, None).unwrap(), json!([3, 4]));
        assert_eq!(slice(&items, Some(10), None, None).unwrap(), json!([]));
        assert_eq!(slice(&json!("hello"), None, Some(2), None).unwrap(), json!("he"));
    }

    #[test]
    fn test_subscript_errors() {
        assert_eq!(
            subscript(&json!({"a": 1}), &json!("b")).unwrap_err().reason,
            "key 'b' not found"
        );
        assert_eq!(
            subscript(&json!([1]), &json!(5)).unwrap_err().reason,
            "list index out of range"
        );
        assert_eq!(subscript(&json!([1, 2]), &json!(-1)).unwrap(), json!(2));
    }
}
