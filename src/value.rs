/*
 * ==========================================================================
 * JQX - a small expression language for querying JSON
 * ==========================================================================
 *
 * Author:   Sam Wilcox
 *
 * License:
 * This file is part of the JQX project.
 *
 * JQX is dual-licensed under the terms of:
 *   - The MIT license
 *   - The Apache License, Version 2.0
 *
 * You may choose either license to govern your use of this software.
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *
 * ==========================================================================
 */

use indexmap::IndexMap;
use std::cmp::Ordering;

/// The runtime JSON value every JQX expression produces and consumes.
///
/// `Object` is backed by an [`IndexMap`] so that key order always matches
/// insertion order, matching the language's invariant that iterating an
/// object never reshuffles its keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),

    /// Sentinel produced by the `out` builtin. Flows through pipes like any
    /// other value; only the CLI boundary unwraps it.
    Output(Box<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Output(_) => "output",
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// A number used as an array index or slice bound must be integral.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Value::Number(n) if *n == n.trunc() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts a decoded JSON document into a runtime value, preserving key
    /// order the way `serde_json`'s `preserve_order` feature hands it to us.
    pub fn from_json(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect())
            }
        }
    }

    /// Canonical key for `sort`/`group`: arrays become tuples and objects
    /// become order-independent keys, mirroring `deep_array_to_tuple`.
    pub fn canonical_key(&self) -> CanonicalKey {
        match self {
            Value::Null => CanonicalKey::Null,
            Value::Bool(b) => CanonicalKey::Bool(*b),
            Value::Number(n) => CanonicalKey::Number(*n),
            Value::String(s) => CanonicalKey::Str(s.clone()),
            Value::Array(items) => {
                CanonicalKey::Array(items.iter().map(Value::canonical_key).collect())
            }
            Value::Object(fields) => CanonicalKey::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.canonical_key()))
                    .collect(),
            ),
            Value::Output(inner) => inner.canonical_key(),
        }
    }
}

/// Structural key used to sort and group JSON values.
///
/// Ordering across different variants is total but otherwise
/// implementation-defined (the language never compares, say, a number to a
/// string); see the Design Notes for why that's acceptable here.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalKey {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<CanonicalKey>),
    Object(Vec<(String, CanonicalKey)>),
}

impl Eq for CanonicalKey {}

impl CanonicalKey {
    fn rank(&self) -> u8 {
        match self {
            CanonicalKey::Null => 0,
            CanonicalKey::Bool(_) => 1,
            CanonicalKey::Number(_) => 2,
            CanonicalKey::Str(_) => 3,
            CanonicalKey::Array(_) => 4,
            CanonicalKey::Object(_) => 5,
        }
    }
}

impl PartialOrd for CanonicalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CanonicalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CanonicalKey::Null, CanonicalKey::Null) => Ordering::Equal,
            (CanonicalKey::Bool(a), CanonicalKey::Bool(b)) => a.cmp(b),
            (CanonicalKey::Number(a), CanonicalKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CanonicalKey::Str(a), CanonicalKey::Str(b)) => a.cmp(b),
            (CanonicalKey::Array(a), CanonicalKey::Array(b)) => a.cmp(b),
            (CanonicalKey::Object(a), CanonicalKey::Object(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_number_prints_without_fraction_is_handled_by_printer_not_value() {
        // Value itself stays an f64; see printer.rs for the display rule.
        assert_eq!(Value::Number(3.0).as_index(), Some(3));
        assert_eq!(Value::Number(3.5).as_index(), None);
    }

    #[test]
    fn canonical_key_orders_arrays_lexicographically() {
        let a = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let b = Value::Array(vec![Value::Number(1.0), Value::Number(3.0)]);
        assert!(a.canonical_key() < b.canonical_key());
    }

    #[test]
    fn canonical_key_preserves_object_insertion_order() {
        // Matches the original's HashableDict, which hashes `tuple(dict.items())`:
        // two objects with the same pairs in different insertion order are
        // distinct group/sort keys.
        let mut m1 = IndexMap::new();
        m1.insert("a".to_string(), Value::Number(1.0));
        m1.insert("b".to_string(), Value::Number(2.0));
        let mut m2 = IndexMap::new();
        m2.insert("b".to_string(), Value::Number(2.0));
        m2.insert("a".to_string(), Value::Number(1.0));
        assert_ne!(Value::Object(m1).canonical_key(), Value::Object(m2).canonical_key());
    }
}
