#![allow(clippy::needless_return)]

//! Flint is a small dynamically typed, lexically scoped, class-based
//! scripting language. The interpreter is a tree walk: it executes programs
//! by evaluating the parsed syntax tree directly, without compiling to
//! bytecode first.
//!
//! Source text moves through four passes, each consuming the output of the
//! previous one:
//!
//! ## Scanning
//! The [`scanner`](scanner) turns the source string into a flat list of
//! [`tokens`](token::Token). It runs in a single pass with one character of
//! lookahead (two for number fractions) and stops at the first malformed
//! token, such as an unterminated string, reporting it as a
//! [`ScanError`](error::ScanError).
//!
//! ## Parsing
//! The [`parser`](parser) is a hand-written recursive descent parser that
//! turns the token list into [`expressions`](expr::Expr) and
//! [`statements`](stmt::Stmt). Expressions produce a value when evaluated;
//! statements produce effects. A syntax error is reported as a
//! [`ParseError`](error::ParseError) keyed to the offending token and stops
//! the parse.
//!
//! ## Resolving
//! The [`resolver`](resolver) walks the finished tree once and enforces the
//! rules the grammar cannot express: reading a variable inside its own
//! initializer, declaring the same name twice in one scope, `return` or
//! `break` at the top level, `this` and `super` outside a class. Violations
//! are reported as a [`ResolveError`](error::ResolveError) before anything
//! runs. Along the way it records, for every local reference, how many
//! scopes separate the use from the definition; the interpreter later uses
//! those distances to read from exactly the right
//! [`environment`](environment::Environment).
//!
//! ## Interpreting
//! The [`interpreter`](interpreter) evaluates the resolved tree. Values are
//! [`objects`](object::Object): nil, booleans, 64-bit floats, strings,
//! functions, classes and instances. Functions capture the environment they
//! were declared in, so closures keep their scope alive after the block
//! exits. Type mismatches, undefined names, arity mismatches and friends
//! surface as a [`RuntimeError`](error::RuntimeError) carrying the token
//! that caused them.
//!
//! A program runs either from a file or from an interactive prompt. At the
//! prompt, expression statements additionally echo their value.

use std::fs;
use std::io::Write;

use rustyline::error::ReadlineError;

pub mod error;
pub mod token;
pub mod scanner;
pub mod expr;
pub mod stmt;
pub mod environment;
pub mod parser;
pub mod ast;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod function;
pub mod resolver;
pub mod class;

use parser::Parser;
use scanner::Scanner;
use resolver::Resolver;

#[allow(non_camel_case_types)]
pub struct flint<'a> {
    interpreter: interpreter::Interpreter<'a>,
}

impl<'a> flint<'a> {
    /// Creates a new driver. Program output is written to `output`;
    /// diagnostics always go to stderr.
    pub fn new(output: &'a mut dyn Write) -> Self {
        flint {
            interpreter: interpreter::Interpreter::new(output),
        }
    }

    /// Reads the file and executes it as a program. An unreadable file is
    /// reported on stderr and the driver returns normally.
    pub fn run_file(&mut self, path: String) {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) => {
                eprintln!("can't open file '{path}': {error}");
                return;
            },
        };

        self.run(&contents);
    }

    /// Reads lines from the prompt and executes each one. Empty lines and
    /// lines starting with '#' are skipped; the session ends on EOF.
    pub fn run_prompt(&mut self) {
        self.interpreter.enable_repl_mode();

        let mut editor = rustyline::DefaultEditor::new().expect("failed to initialize the prompt");

        let history = home::home_dir().map(|dir| dir.join(".flint_history"));
        if let Some(history) = &history {
            let _ = editor.load_history(history);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }

                    let _ = editor.add_history_entry(line.as_str());
                    self.run(&line);
                    error::reset_error();
                },
                Err(ReadlineError::Interrupted) => continue,
                Err(_) => break,
            }
        }

        if let Some(history) = &history {
            let _ = editor.save_history(history);
        }
    }

    /// Runs the source through the whole pipeline. Each stage only starts if
    /// the previous one finished without errors.
    pub fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens();

        if error::did_error() {
            return;
        }

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();

        if error::did_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter);
        resolver.resolve(&statements);

        if error::did_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}
