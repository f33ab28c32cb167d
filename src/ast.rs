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

/// A parsed JQX expression. Immutable once built; the evaluator only reads
/// it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Echo,
    Access(Box<Expr>),
    RangeStart(Box<Expr>),
    RangeEnd(Box<Expr>),
    RangeStartEnd(Box<Expr>, Box<Expr>),
    StringLiteral(String),
    FormatString(Vec<Expr>),
    NumberLiteral(f64),
    Array(Vec<ArrayElem>),
    Dict(Vec<DictElem>),
    UnaryFcn(String, Box<Expr>),
    NoArgFcn(String),
    Pipe(Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    LessThan(Box<Expr>, Box<Expr>),
    LessThanOrEqual(Box<Expr>, Box<Expr>),
    GreaterThan(Box<Expr>, Box<Expr>),
    GreaterThanOrEqual(Box<Expr>, Box<Expr>),
    Equals(Box<Expr>, Box<Expr>),
    NotEqual(Box<Expr>, Box<Expr>),
    OptionalDefault(Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Null,
    True,
    False,
}

impl Expr {
    pub fn access(e: Expr) -> Expr {
        Expr::Access(Box::new(e))
    }

    pub fn pipe(l: Expr, r: Expr) -> Expr {
        Expr::Pipe(Box::new(l), Box::new(r))
    }
}

/// One element of an array literal: either a plain expression or a `*expr`
/// spread that inlines another array's elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElem {
    Value(Expr),
    Spread(Expr),
}

/// One element of a dict literal.
#[derive(Debug, Clone, PartialEq)]
pub enum DictElem {
    /// `key: value`, where key is itself an expression (identifiers and
    /// string literals both desugar to a `StringLiteral` key expr).
    KvPair(Expr, Expr),
    /// `*expr` — merge another object's keys in.
    Spread(Expr),
    /// `-ident` — remove a key from the dict built so far.
    Omit(String),
    /// `.ident` or `.[expr]` inside a `{}` literal — shorthand for
    /// `key: <source>.key`.
    AccessShortcut(Expr, Expr),
}
