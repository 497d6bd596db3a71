//! Recursive structural validator for the JSON-schema subset bounty
//! sponsors publish.
//!
//! Supported keywords: `type` (name or list of names, `integer` refines
//! `number`), `enum`, `const`, `minimum`, `maximum`, `exclusiveMinimum`,
//! `exclusiveMaximum`, `minLength`, `maxLength`, `pattern`, `minItems`,
//! `maxItems`, `items` (single schema or positional list), `required`,
//! `properties`, `additionalProperties` (`false` closes the key set, a
//! schema constrains the extra keys). Unknown keywords are ignored.
//!
//! Validation runs in two passes. The first walks the whole schema, checks
//! the shape of every keyword and compiles each `pattern` once; a malformed
//! schema is rejected before the instance is looked at. The second walks the
//! instance and stops with [`VerifyError::TotalTimeout`] once the caller's
//! deadline has passed.

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::time::Instant;

use crate::error::{VerifyError, VerifyResult};

/// Compiled-regex size ceiling for `pattern`.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

const NUMERIC_KEYWORDS: [&str; 4] = ["minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum"];
const COUNT_KEYWORDS: [&str; 4] = ["minLength", "maxLength", "minItems", "maxItems"];

#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator {
    max_depth: usize,
}

impl SchemaValidator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// First violation wins.
    pub fn validate(&self, schema: &Value, instance: &Value) -> VerifyResult<()> {
        self.run(schema, instance, None)
    }

    /// Like [`validate`](Self::validate), but gives up with
    /// [`VerifyError::TotalTimeout`] once `deadline` is reached.
    pub fn validate_until(
        &self,
        schema: &Value,
        instance: &Value,
        deadline: Instant,
    ) -> VerifyResult<()> {
        self.run(schema, instance, Some(deadline))
    }

    fn run(&self, schema: &Value, instance: &Value, deadline: Option<Instant>) -> VerifyResult<()> {
        let mut pass = Pass {
            max_depth: self.max_depth,
            deadline,
            patterns: HashMap::new(),
        };
        pass.prepare(schema, "$", 0)?;
        pass.check(schema, instance, "$", 0)
    }
}

/// State for one validation: the deadline and the compiled patterns of the
/// schema being applied.
struct Pass<'s> {
    max_depth: usize,
    deadline: Option<Instant>,
    patterns: HashMap<&'s str, Regex>,
}

impl<'s> Pass<'s> {
    /// Shape-check every keyword of `schema` and its subschemas.
    fn prepare(&mut self, schema: &'s Value, path: &str, depth: usize) -> VerifyResult<()> {
        if depth > self.max_depth {
            return Err(VerifyError::DepthExceeded(self.max_depth));
        }
        let rules = match schema {
            Value::Bool(_) => return Ok(()),
            Value::Object(rules) => rules,
            _ => return Err(malformed(path, "schema must be an object or boolean")),
        };

        if let Some(expected) = rules.get("type") {
            for name in type_names(expected, path)? {
                if matches_type(name, &Value::Null).is_none() {
                    return Err(malformed(path, &format!("unknown type `{name}`")));
                }
            }
        }
        if let Some(options) = rules.get("enum") {
            if !options.is_array() {
                return Err(malformed(path, "`enum` must be an array"));
            }
        }
        for keyword in NUMERIC_KEYWORDS {
            f64_rule(rules, keyword, path)?;
        }
        for keyword in COUNT_KEYWORDS {
            usize_rule(rules, keyword, path)?;
        }
        if let Some(pattern) = rules.get("pattern") {
            let pattern = pattern
                .as_str()
                .ok_or_else(|| malformed(path, "`pattern` must be a string"))?;
            if !self.patterns.contains_key(pattern) {
                let regex = RegexBuilder::new(pattern)
                    .size_limit(PATTERN_SIZE_LIMIT)
                    .build()
                    .map_err(|e| malformed(path, &format!("bad `pattern`: {e}")))?;
                self.patterns.insert(pattern, regex);
            }
        }
        if let Some(required) = rules.get("required") {
            let well_formed = required
                .as_array()
                .map_or(false, |keys| keys.iter().all(Value::is_string));
            if !well_formed {
                return Err(malformed(path, "`required` must be an array of strings"));
            }
        }

        match rules.get("items") {
            None => {}
            Some(Value::Array(positional)) => {
                for (i, item_schema) in positional.iter().enumerate() {
                    self.prepare(item_schema, &format!("{path}.items[{i}]"), depth + 1)?;
                }
            }
            Some(item_schema @ (Value::Object(_) | Value::Bool(_))) => {
                self.prepare(item_schema, &format!("{path}.items"), depth + 1)?;
            }
            Some(_) => {
                return Err(malformed(path, "`items` must be a schema or an array of schemas"))
            }
        }
        match rules.get("properties") {
            None => {}
            Some(Value::Object(properties)) => {
                for (key, property_schema) in properties {
                    self.prepare(property_schema, &format!("{path}.{key}"), depth + 1)?;
                }
            }
            Some(_) => return Err(malformed(path, "`properties` must be an object")),
        }
        match rules.get("additionalProperties") {
            None | Some(Value::Bool(_)) => {}
            Some(extra_schema @ Value::Object(_)) => {
                self.prepare(extra_schema, &format!("{path}.*"), depth + 1)?;
            }
            Some(_) => {
                return Err(malformed(
                    path,
                    "`additionalProperties` must be a boolean or an object",
                ))
            }
        }
        Ok(())
    }

    /// Apply a prepared schema to `instance`.
    fn check(
        &self,
        schema: &Value,
        instance: &Value,
        path: &str,
        depth: usize,
    ) -> VerifyResult<()> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(VerifyError::TotalTimeout);
            }
        }
        if depth > self.max_depth {
            return Err(VerifyError::DepthExceeded(self.max_depth));
        }
        let rules = match schema {
            Value::Bool(true) => return Ok(()),
            Value::Bool(false) => return Err(violation(path, "schema `false` accepts nothing")),
            Value::Object(rules) => rules,
            _ => return Err(malformed(path, "schema must be an object or boolean")),
        };

        if let Some(expected) = rules.get("type") {
            check_type(expected, instance, path)?;
        }
        if let Some(options) = rules.get("enum").and_then(Value::as_array) {
            if !options.iter().any(|option| json_eq(option, instance)) {
                return Err(violation(path, "value not in `enum`"));
            }
        }
        if let Some(constant) = rules.get("const") {
            if !json_eq(constant, instance) {
                return Err(violation(path, "value differs from `const`"));
            }
        }

        match instance {
            Value::Number(n) => {
                let value = n
                    .as_f64()
                    .ok_or_else(|| violation(path, "number out of range"))?;
                check_numeric(rules, value, path)?;
            }
            Value::String(s) => self.check_string(rules, s, path)?,
            Value::Array(items) => self.check_array(rules, items, path, depth)?,
            Value::Object(fields) => self.check_object(rules, fields, path, depth)?,
            Value::Null | Value::Bool(_) => {}
        }
        Ok(())
    }

    fn check_string(&self, rules: &Map<String, Value>, s: &str, path: &str) -> VerifyResult<()> {
        let len = s.chars().count();
        if let Some(min) = usize_rule(rules, "minLength", path)? {
            if len < min {
                return Err(violation(path, &format!("shorter than {min} characters")));
            }
        }
        if let Some(max) = usize_rule(rules, "maxLength", path)? {
            if len > max {
                return Err(violation(path, &format!("longer than {max} characters")));
            }
        }
        if let Some(pattern) = rules.get("pattern").and_then(Value::as_str) {
            let regex = self
                .patterns
                .get(pattern)
                .ok_or_else(|| malformed(path, "`pattern` was not compiled"))?;
            if !regex.is_match(s) {
                return Err(violation(path, &format!("does not match `{pattern}`")));
            }
        }
        Ok(())
    }

    fn check_array(
        &self,
        rules: &Map<String, Value>,
        items: &[Value],
        path: &str,
        depth: usize,
    ) -> VerifyResult<()> {
        if let Some(min) = usize_rule(rules, "minItems", path)? {
            if items.len() < min {
                return Err(violation(path, &format!("fewer than {min} items")));
            }
        }
        if let Some(max) = usize_rule(rules, "maxItems", path)? {
            if items.len() > max {
                return Err(violation(path, &format!("more than {max} items")));
            }
        }
        match rules.get("items") {
            None => {}
            Some(Value::Array(positional)) => {
                for (i, (item_schema, item)) in positional.iter().zip(items).enumerate() {
                    self.check(item_schema, item, &format!("{path}[{i}]"), depth + 1)?;
                }
            }
            Some(item_schema) => {
                for (i, item) in items.iter().enumerate() {
                    self.check(item_schema, item, &format!("{path}[{i}]"), depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn check_object(
        &self,
        rules: &Map<String, Value>,
        fields: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> VerifyResult<()> {
        if let Some(required) = rules.get("required").and_then(Value::as_array) {
            for key in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(key) {
                    return Err(violation(path, &format!("missing required key `{key}`")));
                }
            }
        }

        let properties = rules.get("properties").and_then(Value::as_object);
        if let Some(properties) = properties {
            for (key, property_schema) in properties {
                if let Some(value) = fields.get(key) {
                    self.check(property_schema, value, &format!("{path}.{key}"), depth + 1)?;
                }
            }
        }

        let mut extras = fields
            .iter()
            .filter(|(key, _)| properties.map_or(true, |p| !p.contains_key(*key)));
        match rules.get("additionalProperties") {
            Some(Value::Bool(false)) => {
                if let Some((key, _)) = extras.next() {
                    return Err(violation(path, &format!("unexpected key `{key}`")));
                }
            }
            Some(extra_schema @ Value::Object(_)) => {
                for (key, value) in extras {
                    self.check(extra_schema, value, &format!("{path}.{key}"), depth + 1)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn type_names<'v>(expected: &'v Value, path: &str) -> VerifyResult<Vec<&'v str>> {
    match expected {
        Value::String(name) => Ok(vec![name.as_str()]),
        Value::Array(names) => names
            .iter()
            .map(|n| n.as_str().ok_or_else(|| malformed(path, "`type` entries must be strings")))
            .collect(),
        _ => Err(malformed(path, "`type` must be a string or an array")),
    }
}

fn check_type(expected: &Value, instance: &Value, path: &str) -> VerifyResult<()> {
    let names = type_names(expected, path)?;
    let matched = names
        .iter()
        .any(|name| matches_type(name, instance).unwrap_or(false));
    if matched {
        Ok(())
    } else {
        Err(violation(path, &format!("expected type {}", names.join(" | "))))
    }
}

/// `None` for an unknown type name.
fn matches_type(name: &str, instance: &Value) -> Option<bool> {
    let matched = match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => match instance {
            Value::Number(n) => {
                n.is_i64()
                    || n.is_u64()
                    || n.as_f64().map_or(false, |f| f.is_finite() && f.fract() == 0.0)
            }
            _ => false,
        },
        _ => return None,
    };
    Some(matched)
}

/// Structural equality that compares numbers by value, so `1` equals `1.0`.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, v)| y.get(key).map_or(false, |w| json_eq(v, w)))
        }
        _ => a == b,
    }
}

fn check_numeric(rules: &Map<String, Value>, value: f64, path: &str) -> VerifyResult<()> {
    if let Some(min) = f64_rule(rules, "minimum", path)? {
        if value < min {
            return Err(violation(path, &format!("{value} < minimum {min}")));
        }
    }
    if let Some(max) = f64_rule(rules, "maximum", path)? {
        if value > max {
            return Err(violation(path, &format!("{value} > maximum {max}")));
        }
    }
    if let Some(min) = f64_rule(rules, "exclusiveMinimum", path)? {
        if value <= min {
            return Err(violation(path, &format!("{value} <= exclusiveMinimum {min}")));
        }
    }
    if let Some(max) = f64_rule(rules, "exclusiveMaximum", path)? {
        if value >= max {
            return Err(violation(path, &format!("{value} >= exclusiveMaximum {max}")));
        }
    }
    Ok(())
}

fn f64_rule(rules: &Map<String, Value>, keyword: &str, path: &str) -> VerifyResult<Option<f64>> {
    match rules.get(keyword) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed(path, &format!("`{keyword}` must be a number"))),
    }
}

fn usize_rule(
    rules: &Map<String, Value>,
    keyword: &str,
    path: &str,
) -> VerifyResult<Option<usize>> {
    match rules.get(keyword) {
        None => Ok(None),
        Some(v) => v.as_u64().map(|n| Some(n as usize)).ok_or_else(|| {
            malformed(path, &format!("`{keyword}` must be a non-negative integer"))
        }),
    }
}

fn violation(path: &str, reason: &str) -> VerifyError {
    VerifyError::Violation {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn malformed(path: &str, reason: &str) -> VerifyError {
    VerifyError::MalformedSchema {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
