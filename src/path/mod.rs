// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dotted-path resolution over JSON values.
//!
//! Paths use dotted notation with optional bracket segments:
//!
//! ```text
//! user.id          $.user.id
//! items.0.name     items[0].name
//! meta['a.b']      rows[-1]
//! ```
//!
//! A dotted path is turned into its root-anchored query form (`"a.b"` becomes
//! `"$.a.b"`) and resolved either strictly, where a missing segment is a
//! [`TransformError::PathNotFound`], or leniently, where it yields
//! [`Resolved::Absent`].

use serde_json::Value;
use std::fmt::{Display, Formatter};

use crate::errors::TransformError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Mapping key; a numeric spelling also indexes sequences.
    Key(String),
    /// Bracketed sequence index; negative values count from the end.
    Index(i64),
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Outcome of a lenient lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'v> {
    Found(&'v Value),
    Absent,
}

impl<'v> Resolved<'v> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Absent)
    }

    /// Owned value with absence mapped to `null`.
    pub fn into_value_or_null(self) -> Value {
        match self {
            Resolved::Found(value) => value.clone(),
            Resolved::Absent => Value::Null,
        }
    }
}

/// A parsed path, reusable across many items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    source: String,
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(source: &str) -> Result<Path, TransformError> {
        let invalid = |reason: String| TransformError::InvalidArgument {
            argument: "path".to_string(),
            reason: format!("'{}': {}", source, reason),
        };

        let trimmed = source.trim();
        let mut rest = trimmed.strip_prefix('$').unwrap_or(trimmed);
        rest = rest.strip_prefix('.').unwrap_or(rest);

        let chars: Vec<char> = rest.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;
        // A key is required at the start and after every '.'.
        let mut expect_key = !chars.is_empty() && chars[0] != '[';

        while i < chars.len() {
            match chars[i] {
                '[' => {
                    // a quoted key may itself contain ']'
                    let mut search_from = i + 1;
                    while chars.get(search_from).is_some_and(|c| c.is_whitespace()) {
                        search_from += 1;
                    }
                    if let Some(&quote) = chars.get(search_from).filter(|&&c| c == '\'' || c == '"') {
                        let closing = chars[search_from + 1..]
                            .iter()
                            .position(|&c| c == quote)
                            .ok_or_else(|| invalid("unclosed quote".to_string()))?;
                        search_from += closing + 2;
                    }
                    let close = chars[search_from..]
                        .iter()
                        .position(|&c| c == ']')
                        .map(|offset| search_from + offset)
                        .ok_or_else(|| invalid("unclosed '['".to_string()))?;
                    let inner: String = chars[i + 1..close].iter().collect();
                    segments.push(bracket_segment(inner.trim()).map_err(invalid)?);
                    i = close + 1;
                    match chars.get(i) {
                        Some('.') => {
                            i += 1;
                            expect_key = true;
                        }
                        Some('[') | None => {}
                        Some(other) => return Err(invalid(format!("unexpected '{}' after ']'", other))),
                    }
                }
                _ if expect_key => {
                    let start = i;
                    while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                        i += 1;
                    }
                    let key: String = chars[start..i].iter().collect();
                    if key.is_empty() {
                        return Err(invalid("empty segment".to_string()));
                    }
                    if key == "*" {
                        return Err(invalid("wildcards are not supported".to_string()));
                    }
                    segments.push(Segment::Key(key));
                    expect_key = false;
                    if chars.get(i) == Some(&'.') {
                        i += 1;
                        expect_key = true;
                    }
                }
                other => return Err(invalid(format!("unexpected '{}'", other))),
            }
        }

        if expect_key || segments.is_empty() {
            return Err(invalid("empty segment".to_string()));
        }

        Ok(Path {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn to_query(&self) -> String {
        to_query(&self.source)
    }

    /// Walks the segments, reporting the first one that is absent.
    pub fn resolve<'v>(&self, root: &'v Value) -> Resolved<'v> {
        self.walk(root).unwrap_or(Resolved::Absent)
    }

    pub fn resolve_strict<'v>(&self, root: &'v Value) -> Result<&'v Value, TransformError> {
        let mut current = root;
        for segment in &self.segments {
            current = step(current, segment).ok_or_else(|| TransformError::PathNotFound {
                path: self.to_query(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current)
    }

    fn walk<'v>(&self, root: &'v Value) -> Option<Resolved<'v>> {
        let mut current = root;
        for segment in &self.segments {
            current = step(current, segment)?;
        }
        Some(Resolved::Found(current))
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_query())
    }
}

fn bracket_segment(inner: &str) -> Result<Segment, String> {
    if inner.is_empty() {
        return Err("empty brackets".to_string());
    }
    if inner == "*" {
        return Err("wildcards are not supported".to_string());
    }
    for quote in ['\'', '"'] {
        if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
            return Ok(Segment::Key(inner[1..inner.len() - 1].to_string()));
        }
    }
    inner
        .parse::<i64>()
        .map(Segment::Index)
        .map_err(|_| format!("'[{}]' is neither an index nor a quoted key", inner))
}

fn index_into(items: &[Value], index: i64) -> Option<&Value> {
    let len = items.len() as i64;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        items.get(resolved as usize)
    } else {
        None
    }
}

fn step<'v>(current: &'v Value, segment: &Segment) -> Option<&'v Value> {
    match (current, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => index_into(items, *index),
        (Value::Array(items), Segment::Key(key)) => key
            .parse::<i64>()
            .ok()
            .and_then(|index| index_into(items, index)),
        _ => None,
    }
}

/// Root-anchored query form of a dotted path.
pub fn to_query(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('$') {
        path.to_string()
    } else if path.starts_with('[') {
        format!("${}", path)
    } else {
        format!("$.{}", path)
    }
}

/// One-shot resolution. A lenient miss is `Ok(Resolved::Absent)`.
pub fn resolve<'v>(path: &str, item: &'v Value, strict: bool) -> Result<Resolved<'v>, TransformError> {
    let path = Path::parse(path)?;
    if strict {
        path.resolve_strict(item).map(Resolved::Found)
    } else {
        Ok(path.resolve(item))
    }
}

/// Inner text of a `${{ ... }}` template, if the whole string is one.
pub fn strip_template(text: &str) -> Option<&str> {
    text.trim()
        .strip_prefix("${{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    struct TestCase {
        name: &'static str,
        path: &'static str,
        expected: Option<Value>,
    }

    #[test]
    fn test_resolution_table() {
        let doc = json!({
            "user": {"id": 7, "tags": ["a", "b", "c"]},
            "rows": [{"n": 1}, {"n": 2}],
            "meta": {"a.b": true, "0": "zero", "x]y": "bracket", "q[": 1}
        });

        let cases = vec![
            TestCase { name: "nested key", path: "user.id", expected: Some(json!(7)) },
            TestCase { name: "anchored", path: "$.user.id", expected: Some(json!(7)) },
            TestCase { name: "dotted index", path: "rows.1.n", expected: Some(json!(2)) },
            TestCase { name: "bracket index", path: "rows[0].n", expected: Some(json!(1)) },
            TestCase { name: "negative index", path: "user.tags[-1]", expected: Some(json!("c")) },
            TestCase { name: "quoted key", path: "meta['a.b']", expected: Some(json!(true)) },
            TestCase { name: "quoted key containing ']'", path: "meta['x]y']", expected: Some(json!("bracket")) },
            TestCase { name: "double-quoted key containing '['", path: "meta[\"q[\"]", expected: Some(json!(1)) },
            TestCase { name: "numeric key on mapping", path: "meta.0", expected: Some(json!("zero")) },
            TestCase { name: "missing key", path: "user.name", expected: None },
            TestCase { name: "index out of range", path: "rows.5", expected: None },
            TestCase { name: "descend into scalar", path: "user.id.x", expected: None },
        ];

        for case in cases {
            let path = Path::parse(case.path).unwrap_or_else(|e| panic!("{}: {}", case.name, e));
            let lenient = path.resolve(&doc);
            match &case.expected {
                Some(expected) => {
                    assert_eq!(lenient, Resolved::Found(expected), "{}", case.name);
                    assert_eq!(path.resolve_strict(&doc).unwrap(), expected, "{}", case.name);
                }
                None => {
                    assert!(lenient.is_absent(), "{}", case.name);
                    let err = path.resolve_strict(&doc).unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::PathNotFound, "{}", case.name);
                }
            }
        }
    }

    #[test]
    fn test_query_form() {
        assert_eq!(to_query("a.b"), "$.a.b");
        assert_eq!(to_query("$.a.b"), "$.a.b");
        assert_eq!(to_query("[0].a"), "$[0].a");
        assert_eq!(Path::parse("user.id").unwrap().to_query(), "$.user.id");
    }

    #[test]
    fn test_strict_error_names_segment() {
        let err = resolve("user.name", &json!({"user": {}}), true).unwrap_err();
        assert_eq!(
            err,
            TransformError::PathNotFound {
                path: "$.user.name".to_string(),
                segment: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_paths() {
        for source in ["", "$", "a..b", "a.", "a[", "a[*]", "a.*", "a[x]", "a[0]b", "a['x]", "a['x]y'"] {
            let err = Path::parse(source).expect_err(source);
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{:?}", source);
        }
    }

    #[test]
    fn test_strip_template() {
        assert_eq!(strip_template("${{ steps.a.result }}"), Some("steps.a.result"));
        assert_eq!(strip_template("  ${{input}} "), Some("input"));
        assert_eq!(strip_template("plain"), None);
        assert_eq!(strip_template("x ${{ a }}"), None);
    }
}
