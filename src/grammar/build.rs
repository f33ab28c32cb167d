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

//! LR(1) table construction.
//!
//! Builds the shift/reduce/goto table the parser driver walks. The grammar
//! is closed over a synthetic `Main -> Expr End` rule so there is always a
//! single accepting state. The construction is the textbook one: state-set
//! closure, first-sets, per-parse-state follow-sets, then one lookup row per
//! `(state, next symbol, lookahead)` edge, collapsing the lookahead to `None`
//! whenever every row for that edge agrees.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::OnceLock;

use super::{rules, NonTerminal, Rule, Symbol, Val};
use crate::error::JqxError;
use crate::token::Terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RuleState {
    rule: usize,
    step: usize,
}

impl RuleState {
    fn incr(self) -> Self {
        Self { rule: self.rule, step: self.step + 1 }
    }
}

/// One resolved transition out of a parser state.
#[derive(Debug, Clone)]
pub struct LookupRow {
    pub next_state: Option<usize>,
    pub reduce_rule: Option<usize>,
    pub token_group: Option<usize>,
}

/// The augmented rule list plus the full lookup table the driver consults.
pub struct ParserTables {
    rules: Vec<Rule>,
    lookup: HashMap<(usize, Symbol, Option<Terminal>), LookupRow>,
    token_groups: Vec<Vec<Terminal>>,
}

impl ParserTables {
    pub fn rule(&self, idx: usize) -> &Rule {
        &self.rules[idx]
    }

    pub fn lookup(&self, state: usize, sym: Symbol, lookahead: Option<Terminal>) -> Option<&LookupRow> {
        self.lookup.get(&(state, sym, lookahead))
    }

    pub fn group(&self, id: usize) -> &[Terminal] {
        &self.token_groups[id]
    }
}

/// The process-wide parser tables, built once on first use.
pub fn tables() -> &'static ParserTables {
    static TABLES: OnceLock<ParserTables> = OnceLock::new();
    TABLES.get_or_init(|| build().expect("the JQX grammar must build without conflicts"))
}

fn build_rule_map(rules: &[Rule]) -> HashMap<NonTerminal, Vec<usize>> {
    let mut map: HashMap<NonTerminal, Vec<usize>> = HashMap::new();
    for (idx, rule) in rules.iter().enumerate() {
        map.entry(rule.nt).or_default().push(idx);
    }
    map
}

fn build_parent_states(rules: &[Rule]) -> HashMap<NonTerminal, Vec<RuleState>> {
    let mut map: HashMap<NonTerminal, Vec<RuleState>> = HashMap::new();
    for (rule_idx, rule) in rules.iter().enumerate() {
        for (step_idx, sym) in rule.steps.iter().enumerate() {
            if let Symbol::N(nt) = sym {
                map.entry(*nt).or_default().push(RuleState { rule: rule_idx, step: step_idx });
            }
        }
    }
    map
}

/// Closure of a state-set: every nonterminal about to be consumed pulls in
/// `(rule, 0)` for each of its own productions, transitively.
fn expand_states(states: Vec<RuleState>, rules: &[Rule], rule_map: &HashMap<NonTerminal, Vec<usize>>) -> Vec<RuleState> {
    let mut reached: BTreeSet<RuleState> = BTreeSet::new();
    let mut stack = states;
    while let Some(state) = stack.pop() {
        if !reached.insert(state) {
            continue;
        }
        let next_step = rules[state.rule].steps[state.step];
        if let Symbol::N(nt) = next_step {
            if let Some(rule_indices) = rule_map.get(&nt) {
                for &new_rule in rule_indices {
                    stack.push(RuleState { rule: new_rule, step: 0 });
                }
            }
        }
    }
    reached.into_iter().collect()
}

/// First-sets over symbols, computed with the in-place-mutation trick: an
/// empty set is registered for a nonterminal before recursing into its own
/// productions, so a self-referential rule (ordinary left recursion) sees
/// whatever its sibling productions have already contributed instead of
/// looping forever.
fn first_of(
    sym: Symbol,
    rules: &[Rule],
    rule_map: &HashMap<NonTerminal, Vec<usize>>,
    memo: &mut HashMap<Symbol, BTreeSet<Terminal>>,
) -> BTreeSet<Terminal> {
    if let Some(found) = memo.get(&sym) {
        return found.clone();
    }
    match sym {
        Symbol::T(t) => {
            let mut set = BTreeSet::new();
            set.insert(t);
            memo.insert(sym, set.clone());
            set
        }
        Symbol::N(nt) => {
            memo.insert(sym, BTreeSet::new());
            let rule_indices = rule_map.get(&nt).cloned().unwrap_or_default();
            for rule_idx in rule_indices {
                let first_step = rules[rule_idx].steps[0];
                let sub = first_of(first_step, rules, rule_map, memo);
                memo.get_mut(&sym).unwrap().extend(sub);
            }
            memo.get(&sym).cloned().unwrap()
        }
    }
}

fn compute_first_tokens(rules: &[Rule], rule_map: &HashMap<NonTerminal, Vec<usize>>) -> HashMap<Symbol, BTreeSet<Terminal>> {
    let mut memo: HashMap<Symbol, BTreeSet<Terminal>> = HashMap::new();
    for rule in rules {
        first_of(Symbol::N(rule.nt), rules, rule_map, &mut memo);
        for &step in &rule.steps {
            first_of(step, rules, rule_map, &mut memo);
        }
    }
    memo
}

/// Follow-set per parse state, keyed by `(rule, step)` with `step` always a
/// valid index (never "one past the end"): the case `step+1 == len(steps)`
/// is exactly "what follows once this whole rule reduces", computed by
/// unioning the follow-sets of every parent state that is about to consume
/// this rule's nonterminal. Same in-place-mutation memoization as the
/// first-set computation, this time keyed by `RuleState`.
fn following_of(
    state: RuleState,
    rules: &[Rule],
    first_tokens: &HashMap<Symbol, BTreeSet<Terminal>>,
    parent_states: &HashMap<NonTerminal, Vec<RuleState>>,
    memo: &mut HashMap<RuleState, BTreeSet<Terminal>>,
) -> BTreeSet<Terminal> {
    if let Some(found) = memo.get(&state) {
        return found.clone();
    }
    memo.insert(state, BTreeSet::new());
    let rule = &rules[state.rule];
    if state.step + 1 < rule.steps.len() {
        let next_sym = rule.steps[state.step + 1];
        let toks = match next_sym {
            Symbol::T(t) => {
                let mut s = BTreeSet::new();
                s.insert(t);
                s
            }
            Symbol::N(_) => first_tokens.get(&next_sym).cloned().unwrap_or_default(),
        };
        memo.get_mut(&state).unwrap().extend(toks);
    } else {
        let parents = parent_states.get(&rule.nt).cloned().unwrap_or_default();
        for parent in parents {
            let toks = following_of(parent, rules, first_tokens, parent_states, memo);
            memo.get_mut(&state).unwrap().extend(toks);
        }
    }
    memo.get(&state).cloned().unwrap()
}

fn compute_following(
    rules: &[Rule],
    first_tokens: &HashMap<Symbol, BTreeSet<Terminal>>,
) -> HashMap<RuleState, BTreeSet<Terminal>> {
    let parent_states = build_parent_states(rules);
    let mut memo: HashMap<RuleState, BTreeSet<Terminal>> = HashMap::new();
    for (rule_idx, rule) in rules.iter().enumerate() {
        for step_idx in 0..rule.steps.len() {
            following_of(RuleState { rule: rule_idx, step: step_idx }, rules, first_tokens, &parent_states, &mut memo);
        }
    }
    memo
}

/// One edge out of a state-set: either a reduction on rule `X`, or a shift
/// into `next_states` (not yet closed). `follow_tokens` is the full set to
/// register as a token group (only meaningful on terminal-keyed edges);
/// `follow_token` is the single disambiguating lookahead used when `X` is a
/// nonterminal split across several lookaheads.
struct Edge {
    token: Symbol,
    follow_token: Option<Terminal>,
    follow_tokens: Option<BTreeSet<Terminal>>,
    reduce_rule: Option<usize>,
    next_states: Option<Vec<RuleState>>,
}

fn get_next_states(
    states: &[RuleState],
    rules: &[Rule],
    following: &HashMap<RuleState, BTreeSet<Terminal>>,
    first_tokens: &HashMap<Symbol, BTreeSet<Terminal>>,
) -> Result<Vec<Edge>, JqxError> {
    let mut next_groups: BTreeMap<Symbol, Vec<RuleState>> = BTreeMap::new();
    for &state in states {
        let next_sym = rules[state.rule].steps[state.step];
        next_groups.entry(next_sym).or_default().push(state);
    }

    let mut next_actions = Vec::new();
    for (sym, next_states) in next_groups {
        let is_base_token = matches!(sym, Symbol::T(_));
        let mut reduce_states = Vec::new();
        let mut shift_states = Vec::new();
        for state in &next_states {
            if state.step + 1 < rules[state.rule].steps.len() {
                shift_states.push(state.incr());
            } else {
                reduce_states.push(*state);
            }
        }

        if reduce_states.len() == 1 && shift_states.is_empty() {
            let follow_tokens = if is_base_token {
                Some(following.get(&reduce_states[0]).cloned().unwrap_or_default())
            } else {
                None
            };
            next_actions.push(Edge {
                token: sym,
                follow_token: None,
                follow_tokens,
                reduce_rule: Some(reduce_states[0].rule),
                next_states: None,
            });
        } else if reduce_states.is_empty() {
            let follow_tokens = if is_base_token {
                let mut set = BTreeSet::new();
                for state in &shift_states {
                    let next_sym2 = rules[state.rule].steps[state.step];
                    set.extend(first_tokens.get(&next_sym2).cloned().unwrap_or_default());
                }
                Some(set)
            } else {
                None
            };
            next_actions.push(Edge {
                token: sym,
                follow_token: None,
                follow_tokens,
                reduce_rule: None,
                next_states: Some(shift_states),
            });
        } else {
            if is_base_token {
                return Err(JqxError::grammar(format!(
                    "shift/reduce conflict on terminal {sym:?} not resolvable by lookahead"
                )));
            }

            let mut follow_groups: BTreeMap<Terminal, Vec<RuleState>> = BTreeMap::new();
            for state in &next_states {
                if let Some(tokens) = following.get(state) {
                    for &tok in tokens {
                        follow_groups.entry(tok).or_default().push(*state);
                    }
                }
            }

            for (follow_token, states_group) in follow_groups {
                let mut reduce_states2 = Vec::new();
                let mut shift_states2 = Vec::new();
                for state in &states_group {
                    if state.step + 1 < rules[state.rule].steps.len() {
                        shift_states2.push(state.incr());
                    } else {
                        reduce_states2.push(*state);
                    }
                }
                if !reduce_states2.is_empty() {
                    if reduce_states2.len() != 1 {
                        return Err(JqxError::grammar(format!("reduce/reduce conflict on {sym:?}/{follow_token:?}")));
                    }
                    if !shift_states2.is_empty() {
                        return Err(JqxError::grammar(format!("shift/reduce conflict on {sym:?}/{follow_token:?}")));
                    }
                    next_actions.push(Edge {
                        token: sym,
                        follow_token: Some(follow_token),
                        follow_tokens: None,
                        reduce_rule: Some(reduce_states2[0].rule),
                        next_states: None,
                    });
                } else {
                    next_actions.push(Edge {
                        token: sym,
                        follow_token: Some(follow_token),
                        follow_tokens: None,
                        reduce_rule: None,
                        next_states: Some(shift_states2),
                    });
                }
            }
        }
    }
    Ok(next_actions)
}

struct RawRow {
    state: usize,
    token: Symbol,
    follow_token: Option<Terminal>,
    token_group: Option<usize>,
    next_state: Option<usize>,
    reduce_rule: Option<usize>,
}

fn register_group(tokens: &BTreeSet<Terminal>, group_lookup: &mut HashMap<Vec<Terminal>, usize>, token_groups: &mut Vec<Vec<Terminal>>) -> usize {
    let key: Vec<Terminal> = tokens.iter().copied().collect();
    if let Some(&g) = group_lookup.get(&key) {
        return g;
    }
    let g = token_groups.len();
    group_lookup.insert(key.clone(), g);
    token_groups.push(key);
    g
}

fn get_or_create_state(
    states: Vec<RuleState>,
    rules: &[Rule],
    rule_map: &HashMap<NonTerminal, Vec<usize>>,
    states_to_idx: &mut HashMap<Vec<RuleState>, usize>,
    queue: &mut VecDeque<(usize, Vec<RuleState>)>,
) -> usize {
    let expanded = expand_states(states, rules, rule_map);
    if let Some(&idx) = states_to_idx.get(&expanded) {
        return idx;
    }
    let idx = states_to_idx.len();
    states_to_idx.insert(expanded.clone(), idx);
    queue.push_back((idx, expanded));
    idx
}

fn get_lookup_tbl_rows(
    rules: &[Rule],
    start_rule: usize,
    rule_map: &HashMap<NonTerminal, Vec<usize>>,
    first_tokens: &HashMap<Symbol, BTreeSet<Terminal>>,
    following: &HashMap<RuleState, BTreeSet<Terminal>>,
) -> Result<(Vec<RawRow>, Vec<Vec<Terminal>>), JqxError> {
    let mut states_to_idx: HashMap<Vec<RuleState>, usize> = HashMap::new();
    let mut rows: Vec<RawRow> = Vec::new();
    let mut group_lookup: HashMap<Vec<Terminal>, usize> = HashMap::new();
    let mut token_groups: Vec<Vec<Terminal>> = Vec::new();
    let mut queue: VecDeque<(usize, Vec<RuleState>)> = VecDeque::new();

    let start_first = first_tokens.get(&Symbol::N(rules[start_rule].nt)).cloned().unwrap_or_default();
    register_group(&start_first, &mut group_lookup, &mut token_groups);

    get_or_create_state(vec![RuleState { rule: start_rule, step: 0 }], rules, rule_map, &mut states_to_idx, &mut queue);

    while let Some((idx, states)) = queue.pop_front() {
        let edges = get_next_states(&states, rules, following, first_tokens)?;
        for edge in edges {
            let token_group = edge.follow_tokens.as_ref().map(|toks| register_group(toks, &mut group_lookup, &mut token_groups));
            if let Some(reduce_rule) = edge.reduce_rule {
                rows.push(RawRow {
                    state: idx,
                    token: edge.token,
                    follow_token: edge.follow_token,
                    token_group,
                    next_state: None,
                    reduce_rule: Some(reduce_rule),
                });
            } else if let Some(next_states) = edge.next_states {
                let next_idx = get_or_create_state(next_states, rules, rule_map, &mut states_to_idx, &mut queue);
                rows.push(RawRow {
                    state: idx,
                    token: edge.token,
                    follow_token: edge.follow_token,
                    token_group,
                    next_state: Some(next_idx),
                    reduce_rule: None,
                });
            } else {
                return Err(JqxError::grammar("edge with neither a reduce rule nor a successor state"));
            }
        }
    }

    rows.sort_by_key(|r| (r.state, r.token));
    Ok((rows, token_groups))
}

fn main_reduce(mut args: Vec<Val>) -> Result<Val, JqxError> {
    if args.is_empty() {
        return Err(JqxError::grammar("Main rule reduced with no children"));
    }
    Ok(args.remove(0))
}

pub fn build() -> Result<ParserTables, JqxError> {
    let mut all_rules = vec![Rule {
        nt: NonTerminal::Main,
        steps: vec![Symbol::N(NonTerminal::Expr), Symbol::T(Terminal::End)],
        reduce: main_reduce,
    }];
    all_rules.extend(rules());

    let rule_map = build_rule_map(&all_rules);
    let first_tokens = compute_first_tokens(&all_rules, &rule_map);
    let following = compute_following(&all_rules, &first_tokens);

    let (raw_rows, token_groups) = get_lookup_tbl_rows(&all_rules, 0, &rule_map, &first_tokens, &following)?;

    let mut lookup = HashMap::new();
    for row in raw_rows {
        let key = (row.state, row.token, row.follow_token);
        let value = LookupRow { next_state: row.next_state, reduce_rule: row.reduce_rule, token_group: row.token_group };
        if lookup.insert(key, value).is_some() {
            return Err(JqxError::grammar("duplicate lookup table entry (ambiguous grammar)"));
        }
    }

    Ok(ParserTables { rules: all_rules, lookup, token_groups })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_builds_without_conflicts() {
        assert!(build().is_ok());
    }

    #[test]
    fn start_token_group_is_registered_first_and_nonempty() {
        let t = tables();
        assert!(!t.group(0).is_empty());
    }

    #[test]
    fn state_zero_accepts_a_dot() {
        let t = tables();
        let row = t.lookup(0, Symbol::T(Terminal::Dot), None);
        assert!(row.is_some());
    }

    #[test]
    fn main_rule_is_first_in_the_augmented_rule_list() {
        let t = tables();
        assert_eq!(t.rule(0).nt, NonTerminal::Main);
    }
}
