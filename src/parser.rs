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

//! The two-stack shift/reduce driver that walks the table built by
//! [`crate::grammar::build`].

use crate::ast::Expr;
use crate::error::JqxError;
use crate::grammar::build::{tables, ParserTables};
use crate::grammar::{Rule, Symbol, Val};
use crate::lexer::Lexer;
use crate::token::Terminal;

/// Parses `text` into an `Expr`, driving the lexer with the token group the
/// table says is legal at each point.
pub fn parse(text: &str) -> Result<Expr, JqxError> {
    let tables = tables();
    let mut lexer = Lexer::new(text);
    let mut state_stack: Vec<usize> = vec![0];
    let mut val_stack: Vec<(Symbol, Val)> = Vec::new();
    let mut token_group = 0usize;

    loop {
        let active = tables.group(token_group);
        let token = lexer.peek0(active)?;

        // Reduce until the stack is ready to accept the next terminal: the
        // invariant `len(state_stack) == len(val_stack) + 1` holds between
        // tokens, so entering this loop means the top of the value stack is
        // a completed nonterminal still waiting on its goto transition.
        while state_stack.len() == val_stack.len() {
            let state = *state_stack.last().expect("state stack is never empty");
            let prev_sym = val_stack.last().expect("loop condition guarantees a value").0;
            let row = tables
                .lookup(state, prev_sym, None)
                .or_else(|| tables.lookup(state, prev_sym, Some(token.terminal)))
                .ok_or_else(|| JqxError::grammar(format!("no goto/reduce action for state {state} on {prev_sym:?}")))?;

            if let Some(next_state) = row.next_state {
                state_stack.push(next_state);
            } else {
                let reduce_rule = row
                    .reduce_rule
                    .ok_or_else(|| JqxError::grammar("table row has neither a shift nor a reduce action"))?;
                apply_reduce(tables, reduce_rule, &mut state_stack, &mut val_stack, None)?;
            }
        }

        let state = *state_stack.last().expect("state stack is never empty");
        let row = tables.lookup(state, Symbol::T(token.terminal), None).ok_or_else(|| {
            let expected: Vec<String> = active.iter().map(|t| t.to_string()).collect();
            JqxError::parse(format!("unexpected token {:?}", token.terminal), token.span, expected)
        })?;

        token_group = row.token_group.unwrap_or(token_group);

        let is_end = token.terminal == Terminal::End;
        if let Some(next_state) = row.next_state {
            state_stack.push(next_state);
            val_stack.push((Symbol::T(token.terminal), Val::Tok(token.text.clone())));
        } else {
            let reduce_rule = row
                .reduce_rule
                .ok_or_else(|| JqxError::grammar("table row has neither a shift nor a reduce action"))?;
            apply_reduce(tables, reduce_rule, &mut state_stack, &mut val_stack, Some(token.text.clone()))?;
        }

        lexer.step();
        if is_end {
            break;
        }
    }

    if val_stack.len() != 1 {
        return Err(JqxError::grammar("parser finished with an unreduced value stack"));
    }
    val_stack.remove(0).1.into_expr()
}

/// Pops the children a rule needs and invokes its reducer.
///
/// When `current_token_text` is `Some`, the incoming terminal is the last
/// child of the rule and was never separately pushed onto `val_stack` — only
/// `len(steps) - 1` entries come off the value stack, with its raw text
/// appended as the final reducer argument. Either way, exactly
/// `len(steps) - 1` state entries come off: the state that shifted this
/// rule's first symbol stays on top, ready for the goto that follows.
fn apply_reduce(
    tables: &ParserTables,
    rule_idx: usize,
    state_stack: &mut Vec<usize>,
    val_stack: &mut Vec<(Symbol, Val)>,
    current_token_text: Option<String>,
) -> Result<(), JqxError> {
    let rule: &Rule = tables.rule(rule_idx);
    let total_steps = rule.steps.len();
    let state_pop = total_steps - 1;
    let val_pop = if current_token_text.is_some() { total_steps - 1 } else { total_steps };

    let split_at = val_stack.len() - val_pop;
    let mut args: Vec<Val> = val_stack.split_off(split_at).into_iter().map(|(_, v)| v).collect();
    let new_state_len = state_stack.len() - state_pop;
    state_stack.truncate(new_state_len);

    if let Some(text) = current_token_text {
        args.push(Val::Tok(text));
    }

    let value = (rule.reduce)(args)?;
    val_stack.push((Symbol::N(rule.nt), value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_dot_as_echo() {
        assert_eq!(parse(".").unwrap(), Expr::Echo);
    }

    #[test]
    fn parses_a_dotted_access_chain() {
        let expr = parse(".a.b").unwrap();
        assert_eq!(
            expr,
            Expr::pipe(
                Expr::access(Expr::StringLiteral("a".into())),
                Expr::access(Expr::StringLiteral("b".into())),
            )
        );
    }

    #[test]
    fn parses_number_literals() {
        assert_eq!(parse("42").unwrap(), Expr::NumberLiteral(42.0));
        assert_eq!(parse("3.5").unwrap(), Expr::NumberLiteral(3.5));
    }

    #[test]
    fn parses_unary_minus_over_a_literal() {
        assert_eq!(parse("-5").unwrap(), Expr::Negate(Box::new(Expr::NumberLiteral(5.0))));
    }

    #[test]
    fn parses_a_pipe_chain_left_associatively() {
        let expr = parse("map . | sum").unwrap();
        assert_eq!(
            expr,
            Expr::pipe(Expr::UnaryFcn("map".into(), Box::new(Expr::Echo)), Expr::NoArgFcn("sum".into()))
        );
    }

    #[test]
    fn parses_addition_with_left_associativity() {
        let expr = parse(".a + .b + .c").unwrap();
        let ab = Expr::Add(
            Box::new(Expr::access(Expr::StringLiteral("a".into()))),
            Box::new(Expr::access(Expr::StringLiteral("b".into()))),
        );
        assert_eq!(expr, Expr::Add(Box::new(ab), Box::new(Expr::access(Expr::StringLiteral("c".into())))));
    }

    #[test]
    fn parses_a_single_quoted_string_literal() {
        assert_eq!(parse("'hi'").unwrap(), Expr::StringLiteral("hi".into()));
    }

    #[test]
    fn parses_a_format_string_with_one_interpolation() {
        let expr = parse("'a{1}b'").unwrap();
        assert_eq!(
            expr,
            Expr::FormatString(vec![
                Expr::StringLiteral("a".into()),
                Expr::NumberLiteral(1.0),
                Expr::StringLiteral("b".into()),
            ])
        );
    }

    #[test]
    fn parses_an_empty_array_and_dict() {
        assert_eq!(parse("[]").unwrap(), Expr::Array(vec![]));
        assert_eq!(parse("{}").unwrap(), Expr::Dict(vec![]));
    }

    #[test]
    fn parses_a_bracket_slice_with_both_bounds() {
        use crate::ast::Expr as E;
        let expr = parse(".[1:2]").unwrap();
        let slice = E::RangeStartEnd(Box::new(E::NumberLiteral(1.0)), Box::new(E::NumberLiteral(2.0)));
        assert_eq!(expr, E::pipe(E::Echo, slice));
    }

    #[test]
    fn rejects_unknown_token() {
        assert!(parse("@@@").is_err());
    }
}
