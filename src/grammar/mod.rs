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

pub mod build;

use crate::ast::{ArrayElem, DictElem, Expr};
use crate::error::JqxError;
use crate::lexicon::escape_string_literal;
use crate::token::Terminal;

/// Every nonterminal in the JQX grammar, one variant per `ParserRule` name
/// in the source grammar. `Main` is the synthetic augmented start symbol
/// the table builder adds on top of `Expr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NonTerminal {
    Main,
    Expr,
    OpPipeExpr,
    OpUnaryFcnExpr,
    OpOptionDefaultExpr,
    OpOrExpr,
    OpAndExpr,
    EqualityOperator,
    OpEqualityExpr,
    AdditionOperator,
    OpAddExpr,
    MulOperator,
    OpMulExpr,
    OpMinusExpr,
    OpNoArgFcnExpr,
    OpDotExpr,
    OpBaseExpr,
    NullExpr,
    TrueExpr,
    FalseExpr,
    NoArgFcnExpr,
    BaseDotExpr,
    AccessNode,
    BaseDotAccess,
    BaseBracketAccess,
    BracketAccessInnerExpr,
    BracketAccessInnerExprColonRight,
    ArrayExpr,
    ArrayExprContents,
    ArrayElement,
    DictExpr,
    DictContents,
    DictContentsElem,
    DictElemKvPair,
    DictElemStringLiteralKvPair,
    DictElemBracketKvPair,
    DictElemSpread,
    DictElemOmit,
    DictElemAccessShortcut,
    StringLiteral,
    SingleQuoteStringLiteral,
    DoubleQuoteStringLiteral,
    FormatString,
    InnerFormatStringSingleQuote,
    InnerFormatStringDoubleQuote,
    NumberLiteral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    T(Terminal),
    N(NonTerminal),
}

fn t(term: Terminal) -> Symbol {
    Symbol::T(term)
}

fn n(nt: NonTerminal) -> Symbol {
    Symbol::N(nt)
}

/// The value produced by a reducer. A grammar rule's children are always
/// one of these shapes; which shape depends only on which nonterminal
/// produced them, so the parser driver never needs to guess.
#[derive(Debug, Clone)]
pub enum Val {
    Tok(String),
    Expr(Expr),
    ExprList(Vec<Expr>),
    ArrayElem(ArrayElem),
    ArrayElems(Vec<ArrayElem>),
    DictElem(DictElem),
    DictElems(Vec<DictElem>),
    ColonRight(Option<Expr>),
}

impl Val {
    pub fn into_expr(self) -> Result<Expr, JqxError> {
        match self {
            Val::Expr(e) => Ok(e),
            other => Err(JqxError::grammar(format!("reducer expected an expr, got {other:?}"))),
        }
    }

    pub fn into_tok(self) -> Result<String, JqxError> {
        match self {
            Val::Tok(s) => Ok(s),
            other => Err(JqxError::grammar(format!("reducer expected a token, got {other:?}"))),
        }
    }

    pub fn into_expr_list(self) -> Result<Vec<Expr>, JqxError> {
        match self {
            Val::ExprList(v) => Ok(v),
            other => Err(JqxError::grammar(format!("reducer expected an expr list, got {other:?}"))),
        }
    }

    pub fn into_array_elem(self) -> Result<ArrayElem, JqxError> {
        match self {
            Val::ArrayElem(v) => Ok(v),
            other => Err(JqxError::grammar(format!("reducer expected an array element, got {other:?}"))),
        }
    }

    pub fn into_array_elems(self) -> Result<Vec<ArrayElem>, JqxError> {
        match self {
            Val::ArrayElems(v) => Ok(v),
            other => Err(JqxError::grammar(format!("reducer expected array elements, got {other:?}"))),
        }
    }

    pub fn into_dict_elem(self) -> Result<DictElem, JqxError> {
        match self {
            Val::DictElem(v) => Ok(v),
            other => Err(JqxError::grammar(format!("reducer expected a dict element, got {other:?}"))),
        }
    }

    pub fn into_dict_elems(self) -> Result<Vec<DictElem>, JqxError> {
        match self {
            Val::DictElems(v) => Ok(v),
            other => Err(JqxError::grammar(format!("reducer expected dict elements, got {other:?}"))),
        }
    }

    pub fn into_colon_right(self) -> Result<Option<Expr>, JqxError> {
        match self {
            Val::ColonRight(v) => Ok(v),
            other => Err(JqxError::grammar(format!("reducer expected a colon-right tail, got {other:?}"))),
        }
    }
}

/// One production of the grammar: the nonterminal it belongs to, the
/// sequence of symbols it matches, and the reducer that turns the matched
/// children into this production's `Val`.
pub struct Rule {
    pub nt: NonTerminal,
    pub steps: Vec<Symbol>,
    pub reduce: fn(Vec<Val>) -> Result<Val, JqxError>,
}

fn strip_outer_chars(text: &str) -> &str {
    let mut chars = text.char_indices();
    let Some((_, first)) = chars.next() else { return text };
    let start = first.len_utf8();
    let end = text.len() - text.chars().next_back().map(|c| c.len_utf8()).unwrap_or(0);
    if end <= start {
        ""
    } else {
        &text[start..end]
    }
}

fn string_literal_from_raw(raw: &str) -> Result<Expr, JqxError> {
    Ok(Expr::StringLiteral(escape_string_literal(strip_outer_chars(raw))?))
}

/// The full, declaration-ordered JQX grammar, transcribed from the
/// productions this language was distilled from.
pub fn rules() -> Vec<Rule> {
    use NonTerminal::*;
    use Terminal::*;

    vec![
        Rule {
            nt: Expr,
            steps: vec![n(OpPipeExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpPipeExpr,
            steps: vec![n(OpUnaryFcnExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpPipeExpr,
            steps: vec![n(OpPipeExpr), t(Pipe), n(OpUnaryFcnExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                let _pipe_tok = e.remove(1);
                let left = e.remove(0).into_expr()?;
                Ok(Val::Expr(Expr::pipe(left, right)))
            },
        },
        Rule {
            nt: OpUnaryFcnExpr,
            steps: vec![n(OpOptionDefaultExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpUnaryFcnExpr,
            steps: vec![t(Identifier), n(OpUnaryFcnExpr)],
            reduce: |mut e| {
                let arg = e.remove(1).into_expr()?;
                let name = e.remove(0).into_tok()?;
                Ok(Val::Expr(Expr::UnaryFcn(name, Box::new(arg))))
            },
        },
        Rule {
            nt: OpOptionDefaultExpr,
            steps: vec![n(OpOrExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpOptionDefaultExpr,
            steps: vec![n(OpOptionDefaultExpr), t(DoubleQuestion), n(OpOrExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                e.remove(1);
                let left = e.remove(0).into_expr()?;
                Ok(Val::Expr(Expr::OptionalDefault(Box::new(left), Box::new(right))))
            },
        },
        Rule {
            nt: OpOrExpr,
            steps: vec![n(OpAndExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpOrExpr,
            steps: vec![n(OpOrExpr), t(Or), n(OpAndExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                e.remove(1);
                let left = e.remove(0).into_expr()?;
                Ok(Val::Expr(Expr::Or(Box::new(left), Box::new(right))))
            },
        },
        Rule {
            nt: OpAndExpr,
            steps: vec![n(OpEqualityExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpAndExpr,
            steps: vec![n(OpAndExpr), t(And), n(OpEqualityExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                e.remove(1);
                let left = e.remove(0).into_expr()?;
                Ok(Val::Expr(Expr::And(Box::new(left), Box::new(right))))
            },
        },
        Rule { nt: EqualityOperator, steps: vec![t(LessThan)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule { nt: EqualityOperator, steps: vec![t(LessThanOrEqual)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule { nt: EqualityOperator, steps: vec![t(GreaterThan)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule { nt: EqualityOperator, steps: vec![t(GreaterThanOrEqual)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule { nt: EqualityOperator, steps: vec![t(DoubleEqual)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule { nt: EqualityOperator, steps: vec![t(NotEqual)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule {
            nt: OpEqualityExpr,
            steps: vec![n(OpAddExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpEqualityExpr,
            steps: vec![n(OpAddExpr), n(EqualityOperator), n(OpAddExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                let op = e.remove(1).into_tok()?;
                let left = e.remove(0).into_expr()?;
                let (l, r) = (Box::new(left), Box::new(right));
                let built = match op.as_str() {
                    "<" => Expr::LessThan(l, r),
                    "<=" => Expr::LessThanOrEqual(l, r),
                    ">" => Expr::GreaterThan(l, r),
                    ">=" => Expr::GreaterThanOrEqual(l, r),
                    "==" => Expr::Equals(l, r),
                    "!=" => Expr::NotEqual(l, r),
                    other => return Err(JqxError::grammar(format!("unknown equality operator {other}"))),
                };
                Ok(Val::Expr(built))
            },
        },
        Rule { nt: AdditionOperator, steps: vec![t(Plus)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule {
            nt: OpAddExpr,
            steps: vec![n(OpMulExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpAddExpr,
            steps: vec![n(OpAddExpr), n(AdditionOperator), n(OpMulExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                e.remove(1);
                let left = e.remove(0).into_expr()?;
                Ok(Val::Expr(Expr::Add(Box::new(left), Box::new(right))))
            },
        },
        Rule { nt: MulOperator, steps: vec![t(Asterisk)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule { nt: MulOperator, steps: vec![t(Divide)], reduce: |mut e| Ok(Val::Tok(e.remove(0).into_tok()?)) },
        Rule {
            nt: OpMulExpr,
            steps: vec![n(OpMinusExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpMulExpr,
            steps: vec![n(OpMulExpr), n(MulOperator), n(OpMinusExpr)],
            reduce: |mut e| {
                let right = e.remove(2).into_expr()?;
                let op = e.remove(1).into_tok()?;
                let left = e.remove(0).into_expr()?;
                let (l, r) = (Box::new(left), Box::new(right));
                let built = match op.as_str() {
                    "*" => Expr::Mul(l, r),
                    "/" => Expr::Div(l, r),
                    other => return Err(JqxError::grammar(format!("unknown mul operator {other}"))),
                };
                Ok(Val::Expr(built))
            },
        },
        Rule {
            nt: OpMinusExpr,
            steps: vec![n(OpNoArgFcnExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpMinusExpr,
            steps: vec![t(Minus), n(OpNoArgFcnExpr)],
            reduce: |mut e| {
                let arg = e.remove(1).into_expr()?;
                Ok(Val::Expr(Expr::Negate(Box::new(arg))))
            },
        },
        Rule {
            nt: OpNoArgFcnExpr,
            steps: vec![n(NoArgFcnExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpNoArgFcnExpr,
            steps: vec![n(OpDotExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpDotExpr,
            steps: vec![n(OpBaseExpr)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: OpDotExpr,
            steps: vec![n(OpDotExpr), n(AccessNode)],
            reduce: |mut e| {
                let right = e.remove(1).into_expr()?;
                let left = e.remove(0).into_expr()?;
                Ok(Val::Expr(Expr::pipe(left, right)))
            },
        },
        Rule { nt: OpBaseExpr, steps: vec![n(BaseDotExpr)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(BaseDotAccess)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(StringLiteral)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(FormatString)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(NumberLiteral)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(ArrayExpr)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(DictExpr)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(NullExpr)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(TrueExpr)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule { nt: OpBaseExpr, steps: vec![n(FalseExpr)], reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)) },
        Rule {
            nt: OpBaseExpr,
            steps: vec![t(LeftParen), n(Expr), t(RightParen)],
            reduce: |mut e| Ok(Val::Expr(e.remove(1).into_expr()?)),
        },
        Rule { nt: NullExpr, steps: vec![t(Null)], reduce: |_e| Ok(Val::Expr(Expr::Null)) },
        Rule { nt: TrueExpr, steps: vec![t(True)], reduce: |_e| Ok(Val::Expr(Expr::True)) },
        Rule { nt: FalseExpr, steps: vec![t(False)], reduce: |_e| Ok(Val::Expr(Expr::False)) },
        Rule {
            nt: NoArgFcnExpr,
            steps: vec![t(Identifier)],
            reduce: |mut e| Ok(Val::Expr(Expr::NoArgFcn(e.remove(0).into_tok()?))),
        },
        Rule { nt: BaseDotExpr, steps: vec![t(Dot)], reduce: |_e| Ok(Val::Expr(Expr::Echo)) },
        Rule {
            nt: AccessNode,
            steps: vec![n(BaseDotAccess)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: AccessNode,
            steps: vec![n(BaseBracketAccess)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: BaseDotAccess,
            steps: vec![t(Dot), t(Identifier)],
            reduce: |mut e| {
                let name = e.remove(1).into_tok()?;
                Ok(Val::Expr(Expr::access(Expr::StringLiteral(name))))
            },
        },
        Rule {
            nt: BaseBracketAccess,
            steps: vec![t(LeftBracket), n(BracketAccessInnerExpr), t(RightBracket)],
            reduce: |mut e| Ok(Val::Expr(e.remove(1).into_expr()?)),
        },
        Rule {
            nt: BracketAccessInnerExpr,
            steps: vec![n(Expr)],
            reduce: |mut e| Ok(Val::Expr(Expr::access(e.remove(0).into_expr()?))),
        },
        Rule {
            nt: BracketAccessInnerExpr,
            steps: vec![t(Colon), n(Expr)],
            reduce: |mut e| Ok(Val::Expr(Expr::RangeEnd(Box::new(e.remove(1).into_expr()?)))),
        },
        Rule {
            nt: BracketAccessInnerExpr,
            steps: vec![n(Expr), n(BracketAccessInnerExprColonRight)],
            reduce: |mut e| {
                let tail = e.remove(1).into_colon_right()?;
                let start = e.remove(0).into_expr()?;
                Ok(Val::Expr(match tail {
                    None => Expr::RangeStart(Box::new(start)),
                    Some(end) => Expr::RangeStartEnd(Box::new(start), Box::new(end)),
                }))
            },
        },
        Rule {
            nt: BracketAccessInnerExprColonRight,
            steps: vec![t(Colon)],
            reduce: |_e| Ok(Val::ColonRight(None)),
        },
        Rule {
            nt: BracketAccessInnerExprColonRight,
            steps: vec![t(Colon), n(Expr)],
            reduce: |mut e| Ok(Val::ColonRight(Some(e.remove(1).into_expr()?))),
        },
        Rule {
            nt: ArrayExpr,
            steps: vec![t(LeftBracket), t(RightBracket)],
            reduce: |_e| Ok(Val::Expr(Expr::Array(vec![]))),
        },
        Rule {
            nt: ArrayExpr,
            steps: vec![t(LeftBracket), n(ArrayExprContents), t(RightBracket)],
            reduce: |mut e| Ok(Val::Expr(Expr::Array(e.remove(1).into_array_elems()?))),
        },
        Rule {
            nt: ArrayExprContents,
            steps: vec![n(ArrayElement)],
            reduce: |mut e| Ok(Val::ArrayElems(vec![e.remove(0).into_array_elem()?])),
        },
        Rule {
            nt: ArrayExprContents,
            steps: vec![n(ArrayExprContents), t(Comma), n(ArrayElement)],
            reduce: |mut e| {
                let last = e.remove(2).into_array_elem()?;
                e.remove(1);
                let mut list = e.remove(0).into_array_elems()?;
                list.push(last);
                Ok(Val::ArrayElems(list))
            },
        },
        Rule {
            nt: ArrayElement,
            steps: vec![n(Expr)],
            reduce: |mut e| Ok(Val::ArrayElem(ArrayElem::Value(e.remove(0).into_expr()?))),
        },
        Rule {
            nt: ArrayElement,
            steps: vec![t(Asterisk), n(Expr)],
            reduce: |mut e| Ok(Val::ArrayElem(ArrayElem::Spread(e.remove(1).into_expr()?))),
        },
        Rule {
            nt: DictExpr,
            steps: vec![t(LeftBrace), t(RightBrace)],
            reduce: |_e| Ok(Val::Expr(Expr::Dict(vec![]))),
        },
        Rule {
            nt: DictExpr,
            steps: vec![t(LeftBrace), n(DictContents), t(RightBrace)],
            reduce: |mut e| Ok(Val::Expr(Expr::Dict(e.remove(1).into_dict_elems()?))),
        },
        Rule {
            nt: DictContents,
            steps: vec![n(DictContentsElem)],
            reduce: |mut e| Ok(Val::DictElems(vec![e.remove(0).into_dict_elem()?])),
        },
        Rule {
            nt: DictContents,
            steps: vec![n(DictContents), t(Comma), n(DictContentsElem)],
            reduce: |mut e| {
                let last = e.remove(2).into_dict_elem()?;
                e.remove(1);
                let mut list = e.remove(0).into_dict_elems()?;
                list.push(last);
                Ok(Val::DictElems(list))
            },
        },
        Rule { nt: DictContentsElem, steps: vec![n(DictElemKvPair)], reduce: |mut e| Ok(Val::DictElem(e.remove(0).into_dict_elem()?)) },
        Rule { nt: DictContentsElem, steps: vec![n(DictElemStringLiteralKvPair)], reduce: |mut e| Ok(Val::DictElem(e.remove(0).into_dict_elem()?)) },
        Rule { nt: DictContentsElem, steps: vec![n(DictElemBracketKvPair)], reduce: |mut e| Ok(Val::DictElem(e.remove(0).into_dict_elem()?)) },
        Rule { nt: DictContentsElem, steps: vec![n(DictElemSpread)], reduce: |mut e| Ok(Val::DictElem(e.remove(0).into_dict_elem()?)) },
        Rule { nt: DictContentsElem, steps: vec![n(DictElemOmit)], reduce: |mut e| Ok(Val::DictElem(e.remove(0).into_dict_elem()?)) },
        Rule { nt: DictContentsElem, steps: vec![n(DictElemAccessShortcut)], reduce: |mut e| Ok(Val::DictElem(e.remove(0).into_dict_elem()?)) },
        Rule {
            nt: DictElemKvPair,
            steps: vec![t(Identifier), t(Colon), n(Expr)],
            reduce: |mut e| {
                let value = e.remove(2).into_expr()?;
                let name = e.remove(0).into_tok()?;
                Ok(Val::DictElem(DictElem::KvPair(Expr::StringLiteral(name), value)))
            },
        },
        Rule {
            nt: DictElemStringLiteralKvPair,
            steps: vec![n(StringLiteral), t(Colon), n(Expr)],
            reduce: |mut e| {
                let value = e.remove(2).into_expr()?;
                let key = e.remove(0).into_expr()?;
                Ok(Val::DictElem(DictElem::KvPair(key, value)))
            },
        },
        Rule {
            nt: DictElemBracketKvPair,
            steps: vec![t(LeftBracket), n(Expr), t(RightBracket), t(Colon), n(Expr)],
            reduce: |mut e| {
                let value = e.remove(4).into_expr()?;
                let key = e.remove(1).into_expr()?;
                Ok(Val::DictElem(DictElem::KvPair(key, value)))
            },
        },
        Rule {
            nt: DictElemSpread,
            steps: vec![t(Asterisk), n(Expr)],
            reduce: |mut e| Ok(Val::DictElem(DictElem::Spread(e.remove(1).into_expr()?))),
        },
        Rule {
            nt: DictElemOmit,
            steps: vec![t(Minus), t(Identifier)],
            reduce: |mut e| Ok(Val::DictElem(DictElem::Omit(e.remove(1).into_tok()?))),
        },
        Rule {
            nt: DictElemAccessShortcut,
            steps: vec![n(BaseDotAccess)],
            reduce: |mut e| {
                let accessed = e.remove(0).into_expr()?;
                let key_expr = match accessed {
                    Expr::Access(inner) => *inner,
                    other => return Err(JqxError::grammar(format!("expected an access expr, got {other:?}"))),
                };
                Ok(Val::DictElem(DictElem::AccessShortcut(Expr::Echo, key_expr)))
            },
        },
        Rule {
            nt: DictElemAccessShortcut,
            steps: vec![t(Dot), t(LeftBracket), n(Expr), t(RightBracket)],
            reduce: |mut e| {
                let key_expr = e.remove(2).into_expr()?;
                Ok(Val::DictElem(DictElem::AccessShortcut(Expr::Echo, key_expr)))
            },
        },
        Rule {
            nt: StringLiteral,
            steps: vec![n(SingleQuoteStringLiteral)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: StringLiteral,
            steps: vec![n(DoubleQuoteStringLiteral)],
            reduce: |mut e| Ok(Val::Expr(e.remove(0).into_expr()?)),
        },
        Rule {
            nt: SingleQuoteStringLiteral,
            steps: vec![t(StringSingleQuote)],
            reduce: |mut e| Ok(Val::Expr(string_literal_from_raw(&e.remove(0).into_tok()?)?)),
        },
        Rule {
            nt: DoubleQuoteStringLiteral,
            steps: vec![t(StringDoubleQuote)],
            reduce: |mut e| Ok(Val::Expr(string_literal_from_raw(&e.remove(0).into_tok()?)?)),
        },
        Rule {
            nt: FormatString,
            steps: vec![t(FStringSingleQuoteLeft), n(InnerFormatStringSingleQuote), t(FStringSingleQuoteRight)],
            reduce: |mut e| {
                let right_tok = e.remove(2).into_tok()?;
                let middle = e.remove(1).into_expr_list()?;
                let left_tok = e.remove(0).into_tok()?;
                let mut parts = vec![string_literal_from_raw(&left_tok)?];
                parts.extend(middle);
                parts.push(string_literal_from_raw(&right_tok)?);
                Ok(Val::Expr(Expr::FormatString(parts)))
            },
        },
        Rule {
            nt: FormatString,
            steps: vec![t(FStringDoubleQuoteLeft), n(InnerFormatStringDoubleQuote), t(FStringDoubleQuoteRight)],
            reduce: |mut e| {
                let right_tok = e.remove(2).into_tok()?;
                let middle = e.remove(1).into_expr_list()?;
                let left_tok = e.remove(0).into_tok()?;
                let mut parts = vec![string_literal_from_raw(&left_tok)?];
                parts.extend(middle);
                parts.push(string_literal_from_raw(&right_tok)?);
                Ok(Val::Expr(Expr::FormatString(parts)))
            },
        },
        Rule {
            nt: InnerFormatStringSingleQuote,
            steps: vec![n(Expr)],
            reduce: |mut e| Ok(Val::ExprList(vec![e.remove(0).into_expr()?])),
        },
        Rule {
            nt: InnerFormatStringSingleQuote,
            steps: vec![n(InnerFormatStringSingleQuote), t(FStringSingleQuoteMiddle), n(Expr)],
            reduce: |mut e| {
                let tail = e.remove(2).into_expr()?;
                let middle_tok = e.remove(1).into_tok()?;
                let mut parts = e.remove(0).into_expr_list()?;
                parts.push(string_literal_from_raw(&middle_tok)?);
                parts.push(tail);
                Ok(Val::ExprList(parts))
            },
        },
        Rule {
            nt: InnerFormatStringDoubleQuote,
            steps: vec![n(Expr)],
            reduce: |mut e| Ok(Val::ExprList(vec![e.remove(0).into_expr()?])),
        },
        Rule {
            nt: InnerFormatStringDoubleQuote,
            steps: vec![n(InnerFormatStringDoubleQuote), t(FStringDoubleQuoteMiddle), n(Expr)],
            reduce: |mut e| {
                let tail = e.remove(2).into_expr()?;
                let middle_tok = e.remove(1).into_tok()?;
                let mut parts = e.remove(0).into_expr_list()?;
                parts.push(string_literal_from_raw(&middle_tok)?);
                parts.push(tail);
                Ok(Val::ExprList(parts))
            },
        },
        Rule {
            nt: NumberLiteral,
            steps: vec![t(Integer)],
            reduce: |mut e| {
                let tok = e.remove(0).into_tok()?;
                let n: f64 = tok.parse().map_err(|_| JqxError::grammar(format!("invalid integer literal {tok}")))?;
                Ok(Val::Expr(Expr::NumberLiteral(n)))
            },
        },
        Rule {
            nt: NumberLiteral,
            steps: vec![t(Float)],
            reduce: |mut e| {
                let tok = e.remove(0).into_tok()?;
                let n: f64 = tok.parse().map_err(|_| JqxError::grammar(format!("invalid float literal {tok}")))?;
                Ok(Val::Expr(Expr::NumberLiteral(n)))
            },
        },
    ]
}
