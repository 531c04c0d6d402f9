// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Helpers over the JSON value model shared by the sandbox, the path resolver
//! and the transforms.
//!
//! Every item that flows through a pipeline step is a `serde_json::Value`.
//! This module pins down the few places where the transforms need semantics
//! the JSON model does not give us directly:
//!
//! * **Truthiness** - which values count as "false" for `filter` and boolean logic
//! * **Numeric view** - integers and floats compare and hash as one number line
//! * **Value keys** - structural hashing so any value can be a set member or
//!   a deduplication key component

use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Numeric view of a JSON number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    /// Numeric view of `value`. Booleans are not numbers.
    pub fn from_value(value: &Value) -> Option<Num> {
        match value {
            Value::Number(n) => Some(Num::from_number(n)),
            _ => None,
        }
    }

    pub fn from_number(n: &Number) -> Num {
        if let Some(i) = n.as_i64() {
            Num::Int(i)
        } else {
            // u64 beyond i64::MAX and every float land here
            Num::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    /// Integral value of this number, if it has one that fits an `i64`.
    pub fn as_integral(self) -> Option<i64> {
        match self {
            Num::Int(i) => Some(i),
            Num::Float(f) if f.fract() == 0.0 && f >= -I64_BOUND && f < I64_BOUND => {
                Some(f as i64)
            }
            Num::Float(_) => None,
        }
    }

    /// Exact ordering. Integers are never rounded through `f64`, so
    /// `2^53 + 1` and `2^53` as a float compare unequal.
    pub fn compare(self, other: Num) -> Option<Ordering> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (Num::Int(a), Num::Float(f)) => compare_int_float(a, f),
            (Num::Float(f), Num::Int(b)) => compare_int_float(b, f).map(Ordering::reverse),
            (Num::Float(a), Num::Float(b)) => a.partial_cmp(&b),
        }
    }

    /// Converts back into a JSON value. Non-finite floats have no JSON form.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Num::Int(i) => Some(Value::from(i)),
            Num::Float(f) => Number::from_f64(f).map(Value::Number),
        }
    }
}

/// 2^63, the first float above every `i64`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if float < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    let floor = float.floor();
    match int.cmp(&(floor as i64)) {
        Ordering::Equal if float > floor => Some(Ordering::Less),
        ordering => Some(ordering),
    }
}

/// Python-style truthiness: `null`, `false`, zero, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => Num::from_number(n).as_f64() != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Type name used in diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "bool",
        Value::Number(n) => match Num::from_number(n) {
            Num::Int(_) => "int",
            Num::Float(_) => "float",
        },
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Structural equality where `1 == 1.0` and booleans never equal numbers.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            Num::from_number(x).compare(Num::from_number(y)) == Some(Ordering::Equal)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// A JSON value usable as a `HashMap`/`HashSet` key.
///
/// Equality is [`values_equal`]; hashing agrees with it: integral floats hash
/// like the matching integer and mapping entries hash independently of order.
#[derive(Debug, Clone)]
pub struct ValueKey(pub Value);

impl ValueKey {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        values_equal(&self.0, &other.0)
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            let num = Num::from_number(n);
            match num.as_integral() {
                Some(i) => i.hash(state),
                None => {
                    let f = num.as_f64();
                    // -0.0 is integral, so only non-integral bits reach here
                    f.to_bits().hash(state);
                }
            }
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(state);
                hash_value(&map[key.as_str()], state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_truthiness_table() {
        let cases = vec![
            (json!(null), false),
            (json!(false), false),
            (json!(true), true),
            (json!(0), false),
            (json!(0.0), false),
            (json!(-3), true),
            (json!(""), false),
            (json!("a"), true),
            (json!([]), false),
            (json!([0]), true),
            (json!({}), false),
            (json!({"a": null}), true),
        ];

        for (value, expected) in cases {
            assert_eq!(is_truthy(&value), expected, "truthiness of {}", value);
        }
    }

    #[test]
    fn test_int_and_float_keys_collide() {
        let mut set = HashSet::new();
        set.insert(ValueKey::new(json!(1)));
        assert!(set.contains(&ValueKey::new(json!(1.0))));
        assert!(!set.contains(&ValueKey::new(json!(true))));
        assert!(!set.contains(&ValueKey::new(json!("1"))));
    }

    #[test]
    fn test_large_int_float_equality_is_exact() {
        let cases = vec![
            (json!(9007199254740993i64), json!(9007199254740992.0), false),
            (json!(9007199254740992i64), json!(9007199254740992.0), true),
            (json!(i64::MAX), json!(9.223372036854776e18), false),
            (json!(i64::MIN), json!(-9.223372036854776e18), true),
            (json!(3), json!(3.5), false),
            (json!(-4), json!(-4.0), true),
        ];

        for (int, float, equal) in cases {
            assert_eq!(values_equal(&int, &float), equal, "{} == {}", int, float);
            assert_eq!(values_equal(&float, &int), equal, "{} == {}", float, int);

            let mut set = HashSet::new();
            set.insert(ValueKey::new(float.clone()));
            assert_eq!(set.contains(&ValueKey::new(int.clone())), equal, "{} in {{{}}}", int, float);
        }
    }

    #[test]
    fn test_int_float_ordering() {
        let cases = vec![
            (Num::Int(3), Num::Float(3.5), Some(Ordering::Less)),
            (Num::Int(-3), Num::Float(-3.5), Some(Ordering::Greater)),
            (Num::Float(2.0), Num::Int(2), Some(Ordering::Equal)),
            (Num::Int(i64::MAX), Num::Float(I64_BOUND), Some(Ordering::Less)),
            (Num::Int(0), Num::Float(f64::NEG_INFINITY), Some(Ordering::Greater)),
            (Num::Int(0), Num::Float(f64::NAN), None),
        ];

        for (a, b, expected) in cases {
            assert_eq!(a.compare(b), expected, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_object_keys_ignore_entry_order() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": [1, 2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": [1, 2.0], "x": 1}"#).unwrap();

        let mut set = HashSet::new();
        set.insert(ValueKey::new(a));
        assert!(set.contains(&ValueKey::new(b)));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!(1)), "int");
        assert_eq!(type_name(&json!(1.5)), "float");
        assert_eq!(type_name(&json!({})), "dict");
        assert_eq!(type_name(&json!(null)), "None");
    }
}
