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

mod ast;
mod diagnostics;
mod error;
mod grammar;
mod interpreter;
mod lexer;
mod lexicon;
mod parser;
mod printer;
mod token;
mod value;

use std::io::Write;

use error::JqxError;
use value::Value;

fn main() {
    let query = std::env::args().nth(1).unwrap_or_else(|| "in".to_string());

    match run(&query) {
        Ok(()) => {}
        Err(err) => {
            diagnostics::DiagnosticPrinter::new(query).print(&err);
            std::process::exit(1);
        }
    }
}

fn run(query: &str) -> Result<(), JqxError> {
    let expr = parser::parse(query)?;
    let result = interpreter::evaluate(&Value::Null, &expr)?;

    match result {
        // `out` with a string payload writes raw bytes with no trailing
        // newline; anything else (including a non-string `out`) falls
        // through to the pretty printer, which unwraps the sentinel itself.
        Value::Output(inner) if inner.as_str().is_some() => {
            let text = inner.as_str().expect("checked above");
            std::io::stdout().write_all(text.as_bytes())?;
        }
        other => {
            println!("{}", printer::to_printable_str(&other));
        }
    }

    Ok(())
}
