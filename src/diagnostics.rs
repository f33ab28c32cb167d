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

use crate::error::JqxError;

/// Renders human-friendly, compiler-style diagnostics for [`JqxError`].
///
/// A JQX query is always a single line of CLI argument text, so unlike a
/// full-file diagnostic printer this one only ever has one line to show;
/// the error's byte-offset [`Span`](crate::error::Span) doubles as the
/// column directly, with no line lookup needed.
pub struct DiagnosticPrinter {
    /// The query text the error was raised against.
    source: String,
}

impl DiagnosticPrinter {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    /// Prints a formatted error diagnostic to stderr.
    ///
    /// # Output Example
    /// ```text
    /// error[E_PARSE]: unexpected token Comma
    ///   |
    /// 1 | .a, .b
    ///   |   ^
    /// help: expected one of: Dot, Pipe, End
    /// ```
    pub fn print(&self, error: &JqxError) {
        let span = error.span();

        eprintln!("error[{}]: {}", error.code(), error);
        eprintln!("  |");
        eprintln!("1 | {}", self.source);

        let mut underline = String::new();
        for _ in 0..span.start {
            underline.push(' ');
        }
        let width = span.end.saturating_sub(span.start).max(1);
        for _ in 0..width {
            underline.push('^');
        }
        eprintln!("  | {underline}");

        if let JqxError::Parse { expected, .. } = error {
            if !expected.is_empty() {
                eprintln!("help: expected one of: {}", expected.join(", "));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;

    #[test]
    fn print_does_not_panic_on_a_zero_width_span() {
        let printer = DiagnosticPrinter::new(".a");
        printer.print(&JqxError::lex("bad token", Span::point(2)));
    }
}
