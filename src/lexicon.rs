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
use crate::token::Terminal;
use regex::Regex;

/// A declared family of terminals sharing one physical pattern.
///
/// Most groups wrap exactly one terminal. The identifier/keyword group is
/// the only many-to-one case: it matches with a single pattern and then
/// `classify` picks the exact terminal from the matched text.
pub struct LexGroup {
    pub terminals: &'static [Terminal],
    pub pattern: Regex,
    pub classify: Option<fn(&str) -> Terminal>,
}

fn classify_identifier(text: &str) -> Terminal {
    match text {
        "null" => Terminal::Null,
        "true" => Terminal::True,
        "false" => Terminal::False,
        "and" => Terminal::And,
        "or" => Terminal::Or,
        _ => Terminal::Identifier,
    }
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})")).expect("lexicon pattern must compile")
}

/// Builds the full, declaration-ordered list of lexical groups.
///
/// Declaration order is load-bearing: when two groups' patterns both match
/// the longest possible run at a position (e.g. `INTEGER` and `FLOAT` on a
/// bare integer), the earlier group in this list wins.
pub fn build_groups() -> Vec<LexGroup> {
    vec![
        LexGroup { terminals: &[Terminal::Integer], pattern: anchored(r"[0-9]+"), classify: None },
        LexGroup { terminals: &[Terminal::Float], pattern: anchored(r"[0-9]+(?:\.[0-9]+)?"), classify: None },
        LexGroup {
            terminals: &[
                Terminal::Identifier,
                Terminal::Null,
                Terminal::True,
                Terminal::False,
                Terminal::And,
                Terminal::Or,
            ],
            pattern: anchored(r"[_A-Za-z][_A-Za-z0-9]*"),
            classify: Some(classify_identifier),
        },
        LexGroup { terminals: &[Terminal::Dot], pattern: anchored(r"\."), classify: None },
        LexGroup { terminals: &[Terminal::Comma], pattern: anchored(r","), classify: None },
        LexGroup { terminals: &[Terminal::Colon], pattern: anchored(r":"), classify: None },
        LexGroup { terminals: &[Terminal::Pipe], pattern: anchored(r"\|"), classify: None },
        LexGroup { terminals: &[Terminal::Asterisk], pattern: anchored(r"\*"), classify: None },
        LexGroup { terminals: &[Terminal::Divide], pattern: anchored(r"/"), classify: None },
        LexGroup { terminals: &[Terminal::Plus], pattern: anchored(r"\+"), classify: None },
        LexGroup { terminals: &[Terminal::Minus], pattern: anchored(r"-"), classify: None },
        LexGroup { terminals: &[Terminal::LeftParen], pattern: anchored(r"\("), classify: None },
        LexGroup { terminals: &[Terminal::RightParen], pattern: anchored(r"\)"), classify: None },
        LexGroup { terminals: &[Terminal::LeftBracket], pattern: anchored(r"\["), classify: None },
        LexGroup { terminals: &[Terminal::RightBracket], pattern: anchored(r"\]"), classify: None },
        LexGroup { terminals: &[Terminal::LeftBrace], pattern: anchored(r"\{"), classify: None },
        LexGroup { terminals: &[Terminal::RightBrace], pattern: anchored(r"\}"), classify: None },
        LexGroup { terminals: &[Terminal::LessThanOrEqual], pattern: anchored(r"<="), classify: None },
        LexGroup { terminals: &[Terminal::LessThan], pattern: anchored(r"<"), classify: None },
        LexGroup { terminals: &[Terminal::GreaterThanOrEqual], pattern: anchored(r">="), classify: None },
        LexGroup { terminals: &[Terminal::GreaterThan], pattern: anchored(r">"), classify: None },
        LexGroup { terminals: &[Terminal::DoubleEqual], pattern: anchored(r"=="), classify: None },
        LexGroup { terminals: &[Terminal::NotEqual], pattern: anchored(r"!="), classify: None },
        LexGroup { terminals: &[Terminal::DoubleQuestion], pattern: anchored(r"\?\?"), classify: None },
        LexGroup {
            terminals: &[Terminal::StringSingleQuote],
            pattern: anchored(r"'(?:[^'\\{}]|\\.)*'"),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::FStringSingleQuoteLeft],
            pattern: anchored(r"'(?:[^'\\{}]|\\.)*\{"),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::FStringSingleQuoteMiddle],
            pattern: anchored(r"\}(?:[^'\\{}]|\\.)*\{"),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::FStringSingleQuoteRight],
            pattern: anchored(r"\}(?:[^'\\{}]|\\.)*'"),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::StringDoubleQuote],
            pattern: anchored(r#""(?:[^"\\{}]|\\.)*""#),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::FStringDoubleQuoteLeft],
            pattern: anchored(r#""(?:[^"\\{}]|\\.)*\{"#),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::FStringDoubleQuoteMiddle],
            pattern: anchored(r#"\}(?:[^"\\{}]|\\.)*\{"#),
            classify: None,
        },
        LexGroup {
            terminals: &[Terminal::FStringDoubleQuoteRight],
            pattern: anchored(r#"\}(?:[^"\\{}]|\\.)*""#),
            classify: None,
        },
    ]
}

pub fn ignore_pattern() -> Regex {
    anchored(r"[ \n\t\r]*")
}

/// Un-escapes the body of a string/format-string literal.
///
/// Extends the original's escape table with `\\` -> `\`, which the source
/// program omits (and would panic on); see DESIGN.md.
pub fn escape_string_literal(text: &str) -> Result<String, JqxError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 1;
            let escaped = *chars
                .get(i)
                .ok_or_else(|| JqxError::lex("dangling escape at end of string", Span::default()))?;
            let mapped = match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '"' => '"',
                '\'' => '\'',
                '{' => '{',
                '}' => '}',
                '\\' => '\\',
                other => {
                    return Err(JqxError::lex(format!("unrecognized escape sequence \\{other}"), Span::default()))
                }
            };
            out.push(mapped);
        } else {
            out.push(c);
        }
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_float_tie_breaks_toward_declared_order() {
        let groups = build_groups();
        let int_len = groups[0].pattern.find("123 rest").unwrap().end();
        let float_len = groups[1].pattern.find("123 rest").unwrap().end();
        assert_eq!(int_len, float_len);
    }

    #[test]
    fn escape_table_covers_backslash_backslash() {
        assert_eq!(escape_string_literal(r"a\\b").unwrap(), "a\\b");
    }

    #[test]
    fn escape_table_covers_braces() {
        assert_eq!(escape_string_literal(r"\{x\}").unwrap(), "{x}");
    }
}
