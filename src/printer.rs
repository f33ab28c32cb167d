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

//! Turns a [`Value`] back into text. There are two entry points, matching
//! the original's two call sites: [`obj_to_str`] for format-string
//! interpolation (strings pass through raw, everything else becomes
//! compact JSON) and [`to_printable_str`] for the CLI's final answer
//! (strings get quoted, everything else is pretty-printed with indent 2).
//!
//! Integral numbers print without a trailing `.0` — JQX has no separate
//! int type, so `3.0` and `3` are the same [`Value::Number`], and only the
//! printer decides which spelling a human sees.

use crate::value::Value;

pub fn obj_to_str(v: &Value) -> String {
    if let Value::String(s) = v {
        return s.clone();
    }
    dump(v, None)
}

pub fn to_printable_str(v: &Value) -> String {
    if let Value::String(s) = v {
        let mut out = String::new();
        write_json_string(s, &mut out);
        return out;
    }
    dump(v, Some(2))
}

fn dump(v: &Value, indent: Option<usize>) -> String {
    let mut out = String::new();
    write_value(v, indent, 0, &mut out);
    out
}

fn write_value(v: &Value, indent: Option<usize>, depth: usize, out: &mut String) {
    match v {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::String(s) => write_json_string(s, out),
        Value::Output(inner) => write_value(inner, indent, depth, out),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_newline_indent(out, indent, depth + 1);
                write_value(item, indent, depth + 1, out);
            }
            push_newline_indent(out, indent, depth);
            out.push(']');
        }
        Value::Object(fields) => {
            if fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (k, val)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_newline_indent(out, indent, depth + 1);
                write_json_string(k, out);
                out.push(':');
                if indent.is_some() {
                    out.push(' ');
                }
                write_value(val, indent, depth + 1, out);
            }
            push_newline_indent(out, indent, depth);
            out.push('}');
        }
    }
}

fn push_newline_indent(out: &mut String, indent: Option<usize>, depth: usize) {
    if let Some(width) = indent {
        out.push('\n');
        out.push_str(&" ".repeat(width * depth));
    }
}

/// Numbers that are mathematically integral print without a fraction,
/// mirroring `deep_float_to_int`; everything else prints via its default
/// `Display`, which Rust already renders without a redundant `.0` only when
/// there's a fractional part — so this never produces `3.0`.
fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn obj_to_str_returns_strings_unquoted() {
        assert_eq!(obj_to_str(&Value::String("hi".into())), "hi");
    }

    #[test]
    fn obj_to_str_is_compact_for_non_strings() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(obj_to_str(&arr), "[1,2]");
    }

    #[test]
    fn integral_numbers_print_without_a_fraction() {
        assert_eq!(obj_to_str(&Value::Number(3.0)), "3");
        assert_eq!(obj_to_str(&Value::Number(3.5)), "3.5");
    }

    #[test]
    fn to_printable_str_quotes_top_level_strings() {
        assert_eq!(to_printable_str(&Value::String("hi".into())), "\"hi\"");
    }

    #[test]
    fn to_printable_str_pretty_prints_with_indent_two() {
        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), Value::Number(1.0));
        let obj = Value::Object(fields);
        assert_eq!(to_printable_str(&obj), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn empty_containers_print_without_a_newline() {
        assert_eq!(to_printable_str(&Value::Array(vec![])), "[]");
        assert_eq!(to_printable_str(&Value::Object(IndexMap::new())), "{}");
    }

    #[test]
    fn output_sentinel_unwraps_transparently() {
        let inner = Value::Number(1.0);
        assert_eq!(to_printable_str(&Value::Output(Box::new(inner.clone()))), to_printable_str(&inner));
    }
}
