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

//! The built-in function tables. `call_unary` backs functions written
//! `name expr` (the argument is itself an expression evaluated against the
//! same dot); `call_noarg` backs functions written bare, which only look at
//! the dot.

use std::io::{self, BufRead, Read as _, Write as _};
use std::process::{Command, Stdio};

use super::{evaluate, evaluate_bool, evaluate_str};
use crate::ast::{ArrayElem, Expr};
use crate::error::JqxError;
use crate::value::Value;
use indexmap::IndexMap;

pub fn call_unary(name: &str, obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    match name {
        "map" => map(obj, arg),
        "filter" => filter(obj, arg),
        "group" => group(obj, arg),
        "sort" => sort(obj, arg),
        "split" => split_unary(obj, arg),
        "join" => join(obj, arg),
        "exec" => exec(obj, arg),
        "recursivemap" => recursivemap(obj, arg),
        "recursiveflatten" => recursiveflatten(obj, arg),
        "if" => if_fcn(obj, arg),
        "not" => Ok(Value::Bool(!evaluate_bool(obj, arg)?)),
        "read" => read_unary(obj, arg),
        "write" => write_unary(obj, arg),
        _ => Err(JqxError::unknown_function(name)),
    }
}

pub fn call_noarg(name: &str, obj: &Value) -> Result<Value, JqxError> {
    match name {
        "len" => {
            let items = obj.as_array().ok_or_else(|| JqxError::type_error("len requires an array"))?;
            Ok(Value::Number(items.len() as f64))
        }
        "entries" => {
            let fields = obj.as_object().ok_or_else(|| JqxError::type_error("entries requires an object"))?;
            Ok(Value::Array(
                fields
                    .iter()
                    .map(|(k, v)| {
                        let mut entry = IndexMap::new();
                        entry.insert("key".to_string(), Value::String(k.clone()));
                        entry.insert("val".to_string(), v.clone());
                        Value::Object(entry)
                    })
                    .collect(),
            ))
        }
        "todict" => todict(obj),
        "keys" => {
            let fields = obj.as_object().ok_or_else(|| JqxError::type_error("keys requires an object"))?;
            Ok(Value::Array(fields.keys().map(|k| Value::String(k.clone())).collect()))
        }
        "values" => {
            let fields = obj.as_object().ok_or_else(|| JqxError::type_error("values requires an object"))?;
            Ok(Value::Array(fields.values().cloned().collect()))
        }
        "sum" => sum(obj),
        "in" => {
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text)?;
            Ok(Value::String(text))
        }
        "out" => Ok(Value::Output(Box::new(obj.clone()))),
        "parse" => {
            let text = obj.as_str().ok_or_else(|| JqxError::type_error("parse requires a string"))?;
            let decoded: serde_json::Value = serde_json::from_str(text)?;
            Ok(Value::from_json(decoded))
        }
        "trim" => {
            let s = obj.as_str().ok_or_else(|| JqxError::type_error("trim requires a string"))?;
            Ok(Value::String(s.trim().to_string()))
        }
        "lines" => {
            let s = obj.as_str().ok_or_else(|| JqxError::type_error("lines requires a string"))?;
            Ok(Value::Array(s.lines().map(|l| Value::String(l.to_string())).collect()))
        }
        "sort" => sort(obj, &Expr::Echo),
        "lower" => {
            let s = obj.as_str().ok_or_else(|| JqxError::type_error("lower requires a string"))?;
            Ok(Value::String(s.to_lowercase()))
        }
        "upper" => {
            let s = obj.as_str().ok_or_else(|| JqxError::type_error("upper requires a string"))?;
            Ok(Value::String(s.to_uppercase()))
        }
        "split" => {
            let s = obj.as_str().ok_or_else(|| JqxError::type_error("split requires a string"))?;
            Ok(Value::Array(s.split_whitespace().map(|w| Value::String(w.to_string())).collect()))
        }
        "number" => {
            let s = obj.as_str().ok_or_else(|| JqxError::type_error("number requires a string"))?;
            let n: f64 = s.trim().parse().map_err(|_| JqxError::type_error(format!("not a number: {s}")))?;
            Ok(Value::Number(n))
        }
        "read" => {
            let path = obj.as_str().ok_or_else(|| JqxError::type_error("read requires a string"))?;
            Ok(Value::String(std::fs::read_to_string(path)?))
        }
        "isfile" => {
            let path = obj.as_str().ok_or_else(|| JqxError::type_error("isfile requires a string"))?;
            Ok(Value::Bool(std::path::Path::new(path).is_file()))
        }
        "isdir" => {
            let path = obj.as_str().ok_or_else(|| JqxError::type_error("isdir requires a string"))?;
            Ok(Value::Bool(std::path::Path::new(path).is_dir()))
        }
        "exists" => {
            let path = obj.as_str().ok_or_else(|| JqxError::type_error("exists requires a string"))?;
            Ok(Value::Bool(std::path::Path::new(path).exists()))
        }
        "listdir" => {
            let path = obj.as_str().ok_or_else(|| JqxError::type_error("listdir requires a string"))?;
            let mut names = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                names.push(Value::String(entry.file_name().to_string_lossy().into_owned()));
            }
            Ok(Value::Array(names))
        }
        "joinlines" => {
            let items = string_array(obj, "joinlines")?;
            if items.is_empty() {
                return Ok(Value::String(String::new()));
            }
            Ok(Value::String(format!("{}\n", items.join("\n"))))
        }
        "env" => {
            let mut fields = IndexMap::new();
            for (k, v) in std::env::vars() {
                fields.insert(k, Value::String(v));
            }
            Ok(Value::Object(fields))
        }
        "flatten" => {
            let items = obj.as_array().ok_or_else(|| JqxError::type_error("flatten requires an array"))?;
            let mut result = Vec::new();
            for item in items {
                let inner = item.as_array().ok_or_else(|| JqxError::type_error("flatten requires an array of arrays"))?;
                result.extend(inner.iter().cloned());
            }
            Ok(Value::Array(result))
        }
        "all" => Ok(Value::Bool(bool_array(obj, "all")?.into_iter().all(|b| b))),
        "any" => Ok(Value::Bool(bool_array(obj, "any")?.into_iter().any(|b| b))),
        "not" => {
            let b = obj.as_bool().ok_or_else(|| JqxError::type_error("not requires a boolean"))?;
            Ok(Value::Bool(!b))
        }
        "sh" => run_shell(obj),
        "combinations" => {
            let groups = array_of_arrays(obj, "combinations")?;
            Ok(Value::Array(cartesian_product(&groups).into_iter().map(Value::Array).collect()))
        }
        "zip" => {
            let groups = array_of_arrays(obj, "zip")?;
            let len = groups.iter().map(|g| g.len()).min().unwrap_or(0);
            let mut result = Vec::with_capacity(len);
            for i in 0..len {
                result.push(Value::Array(groups.iter().map(|g| g[i].clone()).collect()));
            }
            Ok(Value::Array(result))
        }
        _ => Err(JqxError::unknown_function(name)),
    }
}

fn map(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    match obj {
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                result.push(evaluate(item, arg)?);
            }
            Ok(Value::Array(result))
        }
        Value::Object(fields) => {
            let mut result = IndexMap::new();
            for (k, v) in fields {
                result.insert(k.clone(), evaluate(v, arg)?);
            }
            Ok(Value::Object(result))
        }
        other => Err(JqxError::type_error(format!("unable to map over a value of type {}", other.type_name()))),
    }
}

fn filter(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let items = obj.as_array().ok_or_else(|| JqxError::type_error("filter requires an array"))?;
    let mut result = Vec::new();
    for item in items {
        if evaluate_bool(item, arg)? {
            result.push(item.clone());
        }
    }
    Ok(Value::Array(result))
}

/// Unpacks the two-element array argument that `group` requires: a key
/// getter and an aggregator, evaluated against `{key, rows}`.
fn unpack_pair<'a>(arg: &'a Expr) -> Result<(&'a Expr, &'a Expr), JqxError> {
    let Expr::Array(elems) = arg else {
        return Err(JqxError::type_error("group requires a [keyGetter, aggregator] argument"));
    };
    if elems.len() != 2 {
        return Err(JqxError::type_error("group requires exactly two elements"));
    }
    let first = match &elems[0] {
        ArrayElem::Value(e) => e,
        ArrayElem::Spread(_) => return Err(JqxError::type_error("group's argument elements must not be spreads")),
    };
    let second = match &elems[1] {
        ArrayElem::Value(e) => e,
        ArrayElem::Spread(_) => return Err(JqxError::type_error("group's argument elements must not be spreads")),
    };
    Ok((first, second))
}

/// Groups `obj` by `key_getter`, preserving first-occurrence key order —
/// the grouping equivalent of Python's insertion-ordered `dict`.
fn group(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let items = obj.as_array().ok_or_else(|| JqxError::type_error("group requires an array"))?;
    let (key_getter, aggregator) = unpack_pair(arg)?;

    let mut buckets: Vec<(crate::value::CanonicalKey, Value, Vec<Value>)> = Vec::new();
    for row in items {
        let key = evaluate(row, key_getter)?;
        let ck = key.canonical_key();
        match buckets.iter_mut().find(|(k, _, _)| *k == ck) {
            Some((_, _, rows)) => rows.push(row.clone()),
            None => buckets.push((ck, key, vec![row.clone()])),
        }
    }

    let mut result = Vec::with_capacity(buckets.len());
    for (_, key, rows) in buckets {
        let mut fields = IndexMap::new();
        fields.insert("key".to_string(), key);
        fields.insert("rows".to_string(), Value::Array(rows));
        result.push(evaluate(&Value::Object(fields), aggregator)?);
    }
    Ok(Value::Array(result))
}

fn sort(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let items = obj.as_array().ok_or_else(|| JqxError::type_error("sort requires an array"))?;
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        keyed.push((evaluate(item, arg)?.canonical_key(), item.clone()));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(Value::Array(keyed.into_iter().map(|(_, v)| v).collect()))
}

fn split_unary(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let s = obj.as_str().ok_or_else(|| JqxError::type_error("split requires a string"))?;
    let sep = evaluate_str(obj, arg)?;
    if sep.is_empty() {
        return Err(JqxError::type_error("split separator must not be empty"));
    }
    Ok(Value::Array(s.split(sep.as_str()).map(|p| Value::String(p.to_string())).collect()))
}

fn join(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let items = string_array(obj, "join")?;
    let sep = evaluate_str(obj, arg)?;
    Ok(Value::String(items.join(&sep)))
}

fn exec(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let Expr::Array(elems) = arg else {
        return Err(JqxError::type_error("exec requires an array argument"));
    };
    if elems.is_empty() {
        return Err(JqxError::type_error("exec requires at least one argument"));
    }
    let mut argv = Vec::with_capacity(elems.len());
    for elem in elems {
        let ArrayElem::Value(e) = elem else {
            return Err(JqxError::type_error("exec's argument elements must not be spreads"));
        };
        argv.push(evaluate_str(obj, e)?);
    }

    let stdin_text = match obj {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        _ => return Err(JqxError::type_error("exec's dot must be null or a string")),
    };

    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);
    command.stdout(Stdio::piped());
    command.stderr(Stdio::inherit());
    command.stdin(if stdin_text.is_some() { Stdio::piped() } else { Stdio::null() });

    let mut child = command.spawn()?;
    if let Some(text) = stdin_text {
        child.stdin.take().expect("stdin was piped").write_all(text.as_bytes())?;
    }
    let output = child.wait_with_output()?;
    Ok(Value::String(String::from_utf8_lossy(&output.stdout).into_owned()))
}

fn recursivemap(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let Expr::Array(elems) = arg else {
        return Err(JqxError::type_error("recursivemap requires a [childGetter, mapper] argument"));
    };
    if elems.len() != 2 {
        return Err(JqxError::type_error("recursivemap requires exactly two elements"));
    }
    let (child_getter, mapper) = unpack_pair(arg)?;
    recursivemap_node(obj, child_getter, mapper)
}

fn recursivemap_node(node: &Value, child_getter: &Expr, mapper: &Expr) -> Result<Value, JqxError> {
    let children = evaluate(node, child_getter)?;
    let children = children
        .as_array()
        .ok_or_else(|| JqxError::type_error("recursivemap's child getter must produce an array"))?;
    let mut vals = Vec::with_capacity(children.len());
    for child in children {
        vals.push(recursivemap_node(child, child_getter, mapper)?);
    }
    let mut fields = IndexMap::new();
    fields.insert("node".to_string(), node.clone());
    fields.insert("vals".to_string(), Value::Array(vals));
    evaluate(&Value::Object(fields), mapper)
}

fn recursiveflatten(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let mut results = Vec::new();
    recursiveflatten_node(obj, arg, &mut results)?;
    Ok(Value::Array(results))
}

fn recursiveflatten_node(node: &Value, child_getter: &Expr, results: &mut Vec<Value>) -> Result<(), JqxError> {
    results.push(node.clone());
    let children = evaluate(node, child_getter)?;
    if !children.is_null() {
        let children = children
            .as_array()
            .ok_or_else(|| JqxError::type_error("recursiveflatten's child getter must produce an array or null"))?;
        for child in children {
            recursiveflatten_node(child, child_getter, results)?;
        }
    }
    Ok(())
}

fn if_fcn(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let Expr::Array(elems) = arg else {
        return Err(JqxError::type_error("if requires a [cond, then, else] argument"));
    };
    if elems.len() != 3 {
        return Err(JqxError::type_error("if requires exactly three elements"));
    }
    let mut exprs = Vec::with_capacity(3);
    for elem in elems {
        let ArrayElem::Value(e) = elem else {
            return Err(JqxError::type_error("if's argument elements must not be spreads"));
        };
        exprs.push(e);
    }
    if evaluate_bool(obj, exprs[0])? {
        evaluate(obj, exprs[1])
    } else {
        evaluate(obj, exprs[2])
    }
}

fn read_unary(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let path = evaluate_str(obj, arg)?;
    Ok(Value::String(std::fs::read_to_string(path)?))
}

fn write_unary(obj: &Value, arg: &Expr) -> Result<Value, JqxError> {
    let text = obj.as_str().ok_or_else(|| JqxError::type_error("write requires a string dot"))?;
    let path = evaluate_str(obj, arg)?;
    std::fs::write(path, text)?;
    Ok(obj.clone())
}

fn todict(obj: &Value) -> Result<Value, JqxError> {
    let items = obj.as_array().ok_or_else(|| JqxError::type_error("todict requires an array"))?;

    let as_kv_objects = items.iter().all(|elem| {
        elem.as_object().map(|o| matches!(o.get("key"), Some(Value::String(_)))).unwrap_or(false)
    });
    if as_kv_objects {
        let mut result = IndexMap::new();
        for elem in items {
            let fields = elem.as_object().expect("checked above");
            let key = fields.get("key").and_then(Value::as_str).expect("checked above").to_string();
            result.insert(key, fields.get("val").cloned().unwrap_or(Value::Null));
        }
        return Ok(Value::Object(result));
    }

    let as_kv_pairs = items.iter().all(|elem| {
        elem.as_array().map(|a| a.len() == 2 && matches!(a[0], Value::String(_))).unwrap_or(false)
    });
    if as_kv_pairs {
        let mut result = IndexMap::new();
        for elem in items {
            let pair = elem.as_array().expect("checked above");
            let key = pair[0].as_str().expect("checked above").to_string();
            result.insert(key, pair[1].clone());
        }
        return Ok(Value::Object(result));
    }

    Err(JqxError::type_error("unable to turn array into an object"))
}

fn sum(obj: &Value) -> Result<Value, JqxError> {
    let items = obj.as_array().ok_or_else(|| JqxError::type_error("sum requires an array"))?;
    let mut result: Option<f64> = None;
    for item in items {
        if item.is_null() {
            continue;
        }
        let n = item.as_number().ok_or_else(|| JqxError::type_error("sum requires an array of numbers"))?;
        result = Some(result.map_or(n, |acc| acc + n));
    }
    Ok(result.map(Value::Number).unwrap_or(Value::Null))
}

fn string_array<'a>(obj: &'a Value, fcn_name: &str) -> Result<Vec<&'a str>, JqxError> {
    let items = obj
        .as_array()
        .ok_or_else(|| JqxError::type_error(format!("{fcn_name} requires an array")))?;
    items
        .iter()
        .map(|v| v.as_str().ok_or_else(|| JqxError::type_error(format!("{fcn_name} requires an array of strings"))))
        .collect()
}

fn bool_array(obj: &Value, fcn_name: &str) -> Result<Vec<bool>, JqxError> {
    let items = obj
        .as_array()
        .ok_or_else(|| JqxError::type_error(format!("{fcn_name} requires an array")))?;
    items
        .iter()
        .map(|v| v.as_bool().ok_or_else(|| JqxError::type_error(format!("{fcn_name} requires an array of booleans"))))
        .collect()
}

fn array_of_arrays(obj: &Value, fcn_name: &str) -> Result<Vec<Vec<Value>>, JqxError> {
    let items = obj
        .as_array()
        .ok_or_else(|| JqxError::type_error(format!("{fcn_name} requires an array")))?;
    items
        .iter()
        .map(|v| v.as_array().cloned().ok_or_else(|| JqxError::type_error(format!("{fcn_name} requires an array of arrays"))))
        .collect()
}

/// Cartesian product over `groups`, matching `itertools.product(*groups)`.
fn cartesian_product(groups: &[Vec<Value>]) -> Vec<Vec<Value>> {
    let mut result = vec![Vec::new()];
    for group in groups {
        let mut next = Vec::with_capacity(result.len() * group.len());
        for partial in &result {
            for item in group {
                let mut combo = partial.clone();
                combo.push(item.clone());
                next.push(combo);
            }
        }
        result = next;
    }
    if groups.is_empty() {
        Vec::new()
    } else {
        result
    }
}

/// A tiny REPL: each line is parsed and evaluated fresh against the original
/// dot (never the previous line's result), returning as soon as one line
/// produces an `out` value.
fn run_shell(obj: &Value) -> Result<Value, JqxError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(Value::Null);
        }
        let query = line.trim_end_matches(['\n', '\r']);

        let expr = crate::parser::parse(query)?;
        let result = evaluate(obj, &expr)?;
        if let Value::Output(inner) = result {
            return Ok(*inner);
        }
        println!("{}", crate::printer::to_printable_str(&result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr as E;

    #[test]
    fn map_over_array_applies_expr_to_each_element() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let result = map(&arr, &E::Add(Box::new(E::Echo), Box::new(E::NumberLiteral(1.0)))).unwrap();
        assert_eq!(result, Value::Array(vec![Value::Number(2.0), Value::Number(3.0)]));
    }

    #[test]
    fn filter_keeps_only_truthy_elements() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        let expr = E::GreaterThan(Box::new(E::Echo), Box::new(E::NumberLiteral(1.0)));
        let result = filter(&arr, &expr).unwrap();
        assert_eq!(result, Value::Array(vec![Value::Number(2.0), Value::Number(3.0)]));
    }

    #[test]
    fn sum_skips_nulls_but_rejects_non_numbers() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Null, Value::Number(2.0)]);
        assert_eq!(sum(&arr).unwrap(), Value::Number(3.0));

        let all_null = Value::Array(vec![Value::Null, Value::Null]);
        assert_eq!(sum(&all_null).unwrap(), Value::Null);
    }

    #[test]
    fn group_preserves_first_occurrence_key_order() {
        let arr = Value::Array(vec![
            Value::Object(IndexMap::from([("k".to_string(), Value::String("b".into()))])),
            Value::Object(IndexMap::from([("k".to_string(), Value::String("a".into()))])),
            Value::Object(IndexMap::from([("k".to_string(), Value::String("b".into()))])),
        ]);
        let key_getter = E::access(E::StringLiteral("k".into()));
        let aggregator = E::access(E::StringLiteral("key".into()));
        let arg = E::Array(vec![ArrayElem::Value(key_getter), ArrayElem::Value(aggregator)]);
        let result = group(&arr, &arg).unwrap();
        assert_eq!(
            result,
            Value::Array(vec![Value::String("b".into()), Value::String("a".into())])
        );
    }

    #[test]
    fn combinations_is_the_cartesian_product() {
        let groups = vec![vec![Value::Number(1.0), Value::Number(2.0)], vec![Value::String("a".into())]];
        let result = cartesian_product(&groups);
        assert_eq!(
            result,
            vec![
                vec![Value::Number(1.0), Value::String("a".into())],
                vec![Value::Number(2.0), Value::String("a".into())],
            ]
        );
    }

    #[test]
    fn zip_truncates_to_the_shortest_group() {
        let obj = Value::Array(vec![
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Array(vec![Value::Number(10.0)]),
        ]);
        let result = call_noarg("zip", &obj).unwrap();
        assert_eq!(result, Value::Array(vec![Value::Array(vec![Value::Number(1.0), Value::Number(10.0)])]));
    }
}
