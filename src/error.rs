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

use std::fmt;

/// A half-open byte range into the original query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

/// Every error JQX can surface, from lexing through evaluation.
///
/// There is deliberately no `anyhow`-style catch-all variant: each stage of
/// the pipeline produces the specific kind of error it's responsible for,
/// and the CLI boundary is the only place that turns one into an exit code.
#[derive(Debug, Clone)]
pub enum JqxError {
    Lex {
        message: String,
        span: Span,
    },
    Parse {
        message: String,
        span: Span,
        expected: Vec<String>,
    },
    Grammar {
        message: String,
    },
    Type {
        message: String,
    },
    Index {
        message: String,
    },
    Io {
        message: String,
    },
    UnknownFunction {
        name: String,
    },
}

impl JqxError {
    pub fn code(&self) -> &'static str {
        match self {
            JqxError::Lex { .. } => "E_LEX",
            JqxError::Parse { .. } => "E_PARSE",
            JqxError::Grammar { .. } => "E_GRAMMAR",
            JqxError::Type { .. } => "E_TYPE",
            JqxError::Index { .. } => "E_INDEX",
            JqxError::Io { .. } => "E_IO",
            JqxError::UnknownFunction { .. } => "E_UNKNOWN_FUNCTION",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            JqxError::Lex { span, .. } => *span,
            JqxError::Parse { span, .. } => *span,
            _ => Span::default(),
        }
    }

    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        JqxError::Lex { message: message.into(), span }
    }

    pub fn parse(message: impl Into<String>, span: Span, expected: Vec<String>) -> Self {
        JqxError::Parse { message: message.into(), span, expected }
    }

    pub fn grammar(message: impl Into<String>) -> Self {
        JqxError::Grammar { message: message.into() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JqxError::Type { message: message.into() }
    }

    pub fn index(message: impl Into<String>) -> Self {
        JqxError::Index { message: message.into() }
    }

    pub fn io(message: impl Into<String>) -> Self {
        JqxError::Io { message: message.into() }
    }

    pub fn unknown_function(name: impl Into<String>) -> Self {
        JqxError::UnknownFunction { name: name.into() }
    }
}

impl fmt::Display for JqxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JqxError::Lex { message, .. } => write!(f, "lex error: {message}"),
            JqxError::Parse { message, expected, .. } => {
                if expected.is_empty() {
                    write!(f, "parse error: {message}")
                } else {
                    write!(f, "parse error: {message} (expected one of: {})", expected.join(", "))
                }
            }
            JqxError::Grammar { message } => write!(f, "grammar error: {message}"),
            JqxError::Type { message } => write!(f, "type error: {message}"),
            JqxError::Index { message } => write!(f, "index error: {message}"),
            JqxError::Io { message } => write!(f, "io error: {message}"),
            JqxError::UnknownFunction { name } => write!(f, "unknown function: {name}"),
        }
    }
}

impl std::error::Error for JqxError {}

impl From<std::io::Error> for JqxError {
    fn from(e: std::io::Error) -> Self {
        JqxError::io(e.to_string())
    }
}

impl From<serde_json::Error> for JqxError {
    fn from(e: serde_json::Error) -> Self {
        JqxError::type_error(format!("invalid JSON: {e}"))
    }
}
