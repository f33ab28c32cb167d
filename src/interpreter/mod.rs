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

//! The tree-walking evaluator. `evaluate` carries one JSON value (the
//! "dot") down through an `Expr` tree and produces another.

pub mod builtins;

use crate::ast::{ArrayElem, DictElem, Expr};
use crate::error::JqxError;
use crate::value::Value;
use indexmap::IndexMap;

/// Evaluates `expr` against the current dot value `obj`.
pub fn evaluate(obj: &Value, expr: &Expr) -> Result<Value, JqxError> {
    match expr {
        Expr::Echo => Ok(obj.clone()),

        Expr::Access(index_expr) => {
            if obj.is_null() {
                return Ok(Value::Null);
            }
            match obj {
                Value::Array(items) => {
                    let index = evaluate(obj, index_expr)?;
                    let idx = index
                        .as_index()
                        .ok_or_else(|| JqxError::type_error("array index must be an integer"))?;
                    index_array(items, idx)
                }
                Value::Object(fields) => {
                    let index = evaluate(obj, index_expr)?;
                    let key = index
                        .as_str()
                        .ok_or_else(|| JqxError::type_error("object key must be a string"))?;
                    Ok(fields.get(key).cloned().unwrap_or(Value::Null))
                }
                other => Err(JqxError::type_error(format!("cannot index into {}", other.type_name()))),
            }
        }

        Expr::RangeStart(start) => {
            let items = obj.as_array().ok_or_else(|| JqxError::type_error("slice requires an array"))?;
            let s = evaluate_int(obj, start)?;
            let s = slice_bound(s, items.len());
            Ok(Value::Array(items[s..].to_vec()))
        }

        Expr::RangeEnd(end) => {
            let items = obj.as_array().ok_or_else(|| JqxError::type_error("slice requires an array"))?;
            let e = evaluate_int(obj, end)?;
            let e = slice_bound(e, items.len());
            Ok(Value::Array(items[..e].to_vec()))
        }

        Expr::RangeStartEnd(start, end) => {
            let items = obj.as_array().ok_or_else(|| JqxError::type_error("slice requires an array"))?;
            let s = slice_bound(evaluate_int(obj, start)?, items.len());
            let e = slice_bound(evaluate_int(obj, end)?, items.len()).max(s);
            Ok(Value::Array(items[s..e].to_vec()))
        }

        Expr::StringLiteral(s) => Ok(Value::String(s.clone())),

        Expr::FormatString(parts) => {
            let mut result = String::new();
            for part in parts {
                if let Expr::StringLiteral(s) = part {
                    result.push_str(s);
                } else {
                    result.push_str(&crate::printer::obj_to_str(&evaluate(obj, part)?));
                }
            }
            Ok(Value::String(result))
        }

        Expr::NumberLiteral(n) => Ok(Value::Number(*n)),

        Expr::Array(elems) => {
            let mut result = Vec::new();
            for elem in elems {
                match elem {
                    ArrayElem::Value(e) => result.push(evaluate(obj, e)?),
                    ArrayElem::Spread(e) => {
                        let spread = evaluate(obj, e)?;
                        let items = spread
                            .as_array()
                            .ok_or_else(|| JqxError::type_error("can only spread an array into an array"))?;
                        result.extend(items.iter().cloned());
                    }
                }
            }
            Ok(Value::Array(result))
        }

        Expr::Dict(elems) => {
            let mut result: IndexMap<String, Value> = IndexMap::new();
            for elem in elems {
                match elem {
                    DictElem::KvPair(key_expr, value_expr) => {
                        let key = evaluate(obj, key_expr)?;
                        let key = key.as_str().ok_or_else(|| JqxError::type_error("dict key must be a string"))?;
                        let value = evaluate(obj, value_expr)?;
                        result.insert(key.to_string(), value);
                    }
                    DictElem::Spread(e) => {
                        let spread = evaluate(obj, e)?;
                        let fields = spread
                            .as_object()
                            .ok_or_else(|| JqxError::type_error("can only spread an object into a dict"))?;
                        for (k, v) in fields {
                            result.insert(k.clone(), v.clone());
                        }
                    }
                    DictElem::Omit(key) => {
                        result.shift_remove(key);
                    }
                    DictElem::AccessShortcut(source_expr, key_expr) => {
                        let key_value = evaluate(obj, key_expr)?;
                        let key_value = key_value
                            .as_str()
                            .ok_or_else(|| JqxError::type_error("dict access shortcut key must be a string"))?;
                        let source = evaluate(obj, source_expr)?;
                        let fields = source
                            .as_object()
                            .ok_or_else(|| JqxError::type_error("dict access shortcut source must be an object"))?;
                        result.insert(key_value.to_string(), fields.get(key_value).cloned().unwrap_or(Value::Null));
                    }
                }
            }
            Ok(Value::Object(result))
        }

        Expr::UnaryFcn(name, arg) => builtins::call_unary(name, obj, arg),
        Expr::NoArgFcn(name) => builtins::call_noarg(name, obj),

        Expr::Pipe(left, right) => evaluate(&evaluate(obj, left)?, right),

        Expr::Or(left, right) => Ok(Value::Bool(evaluate_bool(obj, left)? || evaluate_bool(obj, right)?)),
        Expr::And(left, right) => Ok(Value::Bool(evaluate_bool(obj, left)? && evaluate_bool(obj, right)?)),

        Expr::Negate(inner) => {
            let val = evaluate_number(obj, inner)?;
            Ok(Value::Number(-val))
        }

        Expr::LessThan(l, r) => compare(obj, l, r, |o| o == std::cmp::Ordering::Less),
        Expr::LessThanOrEqual(l, r) => compare(obj, l, r, |o| o != std::cmp::Ordering::Greater),
        Expr::GreaterThan(l, r) => compare(obj, l, r, |o| o == std::cmp::Ordering::Greater),
        Expr::GreaterThanOrEqual(l, r) => compare(obj, l, r, |o| o != std::cmp::Ordering::Less),

        Expr::Equals(l, r) => Ok(Value::Bool(evaluate(obj, l)? == evaluate(obj, r)?)),
        Expr::NotEqual(l, r) => Ok(Value::Bool(evaluate(obj, l)? != evaluate(obj, r)?)),

        Expr::Add(l, r) => Ok(Value::Number(evaluate_number(obj, l)? + evaluate_number(obj, r)?)),
        Expr::Mul(l, r) => Ok(Value::Number(evaluate_number(obj, l)? * evaluate_number(obj, r)?)),
        Expr::Div(l, r) => {
            let dividend = evaluate_number(obj, l)?;
            let divisor = evaluate_number(obj, r)?;
            if divisor == 0.0 {
                return Err(JqxError::type_error("division by zero"));
            }
            Ok(Value::Number(dividend / divisor))
        }

        Expr::OptionalDefault(left, right) => {
            let left = evaluate(obj, left)?;
            if left.is_null() {
                evaluate(obj, right)
            } else {
                Ok(left)
            }
        }

        Expr::Null => Ok(Value::Null),
        Expr::True => Ok(Value::Bool(true)),
        Expr::False => Ok(Value::Bool(false)),
    }
}

fn compare(
    obj: &Value,
    left: &Expr,
    right: &Expr,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, JqxError> {
    let left = evaluate(obj, left)?;
    let right = evaluate(obj, right)?;
    let ord = match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => {
            a.partial_cmp(b).ok_or_else(|| JqxError::type_error("cannot compare NaN"))?
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(_), Value::Array(_)) => left.canonical_key().cmp(&right.canonical_key()),
        (a, b) => {
            return Err(JqxError::type_error(format!(
                "cannot compare {} to {}",
                a.type_name(),
                b.type_name()
            )))
        }
    };
    Ok(Value::Bool(accept(ord)))
}

pub(crate) fn evaluate_bool(obj: &Value, expr: &Expr) -> Result<bool, JqxError> {
    evaluate(obj, expr)?.as_bool().ok_or_else(|| JqxError::type_error("expected a boolean"))
}

pub(crate) fn evaluate_str(obj: &Value, expr: &Expr) -> Result<String, JqxError> {
    evaluate(obj, expr)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| JqxError::type_error("expected a string"))
}

pub(crate) fn evaluate_int(obj: &Value, expr: &Expr) -> Result<i64, JqxError> {
    evaluate(obj, expr)?.as_index().ok_or_else(|| JqxError::type_error("expected an integer"))
}

pub(crate) fn evaluate_number(obj: &Value, expr: &Expr) -> Result<f64, JqxError> {
    evaluate(obj, expr)?.as_number().ok_or_else(|| JqxError::type_error("expected a number"))
}

fn index_array(items: &[Value], idx: i64) -> Result<Value, JqxError> {
    let len = items.len() as i64;
    let real = if idx < 0 { idx + len } else { idx };
    if real < 0 || real >= len {
        return Err(JqxError::index(format!("index {idx} out of range for an array of length {len}")));
    }
    Ok(items[real as usize].clone())
}

/// Clamps a (possibly negative, possibly out-of-range) Python-style slice
/// bound into `0..=len`.
fn slice_bound(idx: i64, len: usize) -> usize {
    let len = len as i64;
    let real = if idx < 0 { idx + len } else { idx };
    real.clamp(0, len) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr as E;

    #[test]
    fn echo_returns_the_dot_unchanged() {
        let v = Value::Number(1.0);
        assert_eq!(evaluate(&v, &E::Echo).unwrap(), v);
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let expr = E::Div(Box::new(E::NumberLiteral(1.0)), Box::new(E::NumberLiteral(0.0)));
        assert!(evaluate(&Value::Null, &expr).is_err());
    }

    #[test]
    fn arrays_compare_lexicographically() {
        let a = E::Array(vec![ArrayElem::Value(E::NumberLiteral(1.0)), ArrayElem::Value(E::NumberLiteral(2.0))]);
        let b = E::Array(vec![ArrayElem::Value(E::NumberLiteral(1.0)), ArrayElem::Value(E::NumberLiteral(3.0))]);
        let expr = E::LessThan(Box::new(a), Box::new(b));
        assert_eq!(evaluate(&Value::Null, &expr).unwrap(), Value::Bool(true));
    }

    #[test]
    fn access_on_null_short_circuits_to_null() {
        let expr = E::access(E::StringLiteral("a".into()));
        assert_eq!(evaluate(&Value::Null, &expr).unwrap(), Value::Null);
    }

    #[test]
    fn access_missing_object_key_yields_null() {
        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), Value::Number(1.0));
        let obj = Value::Object(fields);
        let expr = E::access(E::StringLiteral("missing".into()));
        assert_eq!(evaluate(&obj, &expr).unwrap(), Value::Null);
    }

    #[test]
    fn negative_array_index_counts_from_the_end() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        let expr = E::access(E::NumberLiteral(-1.0));
        assert_eq!(evaluate(&arr, &expr).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn out_of_range_array_index_is_an_error() {
        let arr = Value::Array(vec![Value::Number(1.0)]);
        let expr = E::access(E::NumberLiteral(5.0));
        assert!(evaluate(&arr, &expr).is_err());
    }

    #[test]
    fn slice_clamps_out_of_range_bounds() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let expr = E::RangeStartEnd(Box::new(E::NumberLiteral(0.0)), Box::new(E::NumberLiteral(99.0)));
        assert_eq!(evaluate(&arr, &expr).unwrap(), arr);
    }

    #[test]
    fn pipe_threads_the_dot_through_both_sides() {
        let expr = E::pipe(E::NumberLiteral(2.0), E::Add(Box::new(E::Echo), Box::new(E::NumberLiteral(1.0))));
        assert_eq!(evaluate(&Value::Null, &expr).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn optional_default_falls_through_only_on_null() {
        let expr = E::OptionalDefault(Box::new(E::Null), Box::new(E::NumberLiteral(7.0)));
        assert_eq!(evaluate(&Value::Null, &expr).unwrap(), Value::Number(7.0));

        let expr = E::OptionalDefault(Box::new(E::NumberLiteral(1.0)), Box::new(E::NumberLiteral(7.0)));
        assert_eq!(evaluate(&Value::Null, &expr).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn dict_omit_removes_a_previously_set_key() {
        let expr = E::Dict(vec![
            DictElem::KvPair(E::StringLiteral("a".into()), E::NumberLiteral(1.0)),
            DictElem::Omit("a".into()),
        ]);
        assert_eq!(evaluate(&Value::Null, &expr).unwrap(), Value::Object(IndexMap::new()));
    }

    #[test]
    fn array_spread_inlines_elements() {
        let expr = E::Array(vec![
            ArrayElem::Spread(E::Array(vec![ArrayElem::Value(E::NumberLiteral(1.0))])),
            ArrayElem::Value(E::NumberLiteral(2.0)),
        ]);
        assert_eq!(
            evaluate(&Value::Null, &expr).unwrap(),
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }
}
