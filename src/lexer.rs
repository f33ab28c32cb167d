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

use crate::error::{JqxError, Span};
use crate::lexicon::{build_groups, ignore_pattern, LexGroup};
use crate::token::{Terminal, Token};
use regex::Regex;

/// A context-aware lexer: the set of terminals it's willing to match at any
/// given call is supplied by the caller (the parser driver), because which
/// tokens are legal next depends on parser state — this is what lets the
/// same `}...{"` text mean "continue this format string" in one position
/// and a syntax error anywhere else.
///
/// Two tokens of lookahead are cached at a time, mirroring the parser's
/// need to peek past the current token before committing to shift or
/// reduce.
pub struct Lexer<'a> {
    text: &'a str,
    groups: Vec<LexGroup>,
    ignore: Regex,
    pos: usize,
    t0: Option<Token>,
    t1: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            groups: build_groups(),
            ignore: ignore_pattern(),
            pos: 0,
            t0: None,
            t1: None,
        }
    }

    fn skip_ignore(&self, idx: usize) -> usize {
        if idx > self.text.len() {
            return idx;
        }
        match self.ignore.find(&self.text[idx..]) {
            Some(m) => idx + m.end(),
            None => idx,
        }
    }

    /// Finds the longest match among the groups whose terminal set
    /// intersects `active`, breaking ties by declared group order.
    fn scan_at(&self, idx: usize, active: &[Terminal]) -> Result<Token, JqxError> {
        let idx = self.skip_ignore(idx);
        if idx >= self.text.len() {
            return Ok(Token::end(idx));
        }

        let slice = &self.text[idx..];
        let mut best: Option<(usize, usize, &LexGroup)> = None;
        for (group_order, group) in self.groups.iter().enumerate() {
            if !group.terminals.iter().any(|t| active.contains(t)) {
                continue;
            }
            let Some(m) = group.pattern.find(slice) else { continue };
            let len = m.end();
            if len == 0 {
                continue;
            }
            let is_better = match best {
                None => true,
                Some((best_len, best_order, _)) => len > best_len || (len == best_len && group_order < best_order),
            };
            if is_better {
                best = Some((len, group_order, group));
            }
        }

        let (len, _, group) = best.ok_or_else(|| {
            JqxError::lex(
                format!("no token recognized near {:?}", &slice[..slice.len().min(16)]),
                Span::point(idx),
            )
        })?;

        let text = &slice[..len];
        let terminal = match group.classify {
            Some(classify) => classify(text),
            None => group.terminals[0],
        };
        Ok(Token::new(terminal, text, Span::new(idx, idx + len)))
    }

    /// Peeks the current (not yet consumed) token, restricting the match to
    /// `active` terminals. Idempotent until `step` is called.
    pub fn peek0(&mut self, active: &[Terminal]) -> Result<Token, JqxError> {
        if self.t0.is_none() {
            self.t0 = Some(self.scan_at(self.pos, active)?);
        }
        Ok(self.t0.clone().unwrap())
    }

    /// Peeks one token past the current one. Requires `peek0` to have run
    /// first so there is a current token to measure from.
    pub fn peek1(&mut self, active: &[Terminal]) -> Result<Token, JqxError> {
        if self.t1.is_none() {
            let after = self
                .t0
                .as_ref()
                .map(|t| t.span.end)
                .unwrap_or(self.pos);
            self.t1 = Some(self.scan_at(after, active)?);
        }
        Ok(self.t1.clone().unwrap())
    }

    /// Commits to the current token and advances.
    pub fn step(&mut self) {
        if let Some(t0) = self.t0.take() {
            self.pos = t0.span.end;
        }
        self.t0 = self.t1.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_terminals() -> Vec<Terminal> {
        vec![
            Terminal::Integer, Terminal::Float, Terminal::Identifier, Terminal::Null,
            Terminal::True, Terminal::False, Terminal::And, Terminal::Or, Terminal::Dot,
            Terminal::Comma, Terminal::Colon, Terminal::Pipe, Terminal::Asterisk,
            Terminal::Divide, Terminal::Plus, Terminal::Minus, Terminal::LeftParen,
            Terminal::RightParen, Terminal::LeftBracket, Terminal::RightBracket,
            Terminal::LeftBrace, Terminal::RightBrace, Terminal::LessThanOrEqual,
            Terminal::LessThan, Terminal::GreaterThanOrEqual, Terminal::GreaterThan,
            Terminal::DoubleEqual, Terminal::NotEqual, Terminal::DoubleQuestion,
            Terminal::StringSingleQuote, Terminal::StringDoubleQuote,
        ]
    }

    #[test]
    fn skips_leading_whitespace() {
        let mut lx = Lexer::new("   .a");
        let t = lx.peek0(&all_terminals()).unwrap();
        assert_eq!(t.terminal, Terminal::Dot);
        assert_eq!(t.span.start, 3);
    }

    #[test]
    fn classifies_keywords_within_the_identifier_group() {
        let mut lx = Lexer::new("true");
        let t = lx.peek0(&all_terminals()).unwrap();
        assert_eq!(t.terminal, Terminal::True);
    }

    #[test]
    fn integer_wins_tie_against_float_by_declaration_order() {
        let mut lx = Lexer::new("42");
        let t = lx.peek0(&[Terminal::Integer, Terminal::Float]).unwrap();
        assert_eq!(t.terminal, Terminal::Integer);
    }

    #[test]
    fn peek1_measures_from_the_end_of_the_cached_current_token() {
        let mut lx = Lexer::new(".a.b");
        let t0 = lx.peek0(&[Terminal::Dot]).unwrap();
        assert_eq!(t0.terminal, Terminal::Dot);
        let t1 = lx.peek1(&[Terminal::Identifier]).unwrap();
        assert_eq!(t1.terminal, Terminal::Identifier);
        assert_eq!(t1.text, "a");
    }

    #[test]
    fn step_advances_past_the_current_token_and_shifts_cache() {
        let mut lx = Lexer::new(".a");
        lx.peek0(&[Terminal::Dot]).unwrap();
        lx.peek1(&[Terminal::Identifier]).unwrap();
        lx.step();
        let t = lx.peek0(&[Terminal::Identifier]).unwrap();
        assert_eq!(t.terminal, Terminal::Identifier);
        assert_eq!(t.text, "a");
    }
}
