//! One interpreter session: scan → parse → resolve → execute, with
//! diagnostics written to a configurable sink.
//!
//! Global state (variables, functions, classes) persists across calls to
//! [`Lox::run`] and [`Lox::run_prompt_line`], which is what makes the REPL
//! work.

use std::fmt::Display;
use std::io::{self, Write};

use log::{debug, info, warn};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::token::{Token, TokenType};

/// Outcome of running one chunk of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// Lexical, syntax or resolution errors; nothing was executed.
    StaticError,
    /// Execution started and stopped at a runtime error.
    RuntimeError,
}

impl RunStatus {
    /// Process exit code for a script run: 0, 65 or 70.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::StaticError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    err: Box<dyn Write>,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout, diagnostics to stderr.
    pub fn new() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            err,
        }
    }

    /// Run a whole program.
    pub fn run(&mut self, source: &str) -> RunStatus {
        info!("Running program of {} byte(s)", source.len());

        let (tokens, scanned_cleanly) = self.scan(source);
        let parsed = Parser::new(&tokens).parse();
        self.finish(parsed, scanned_cleanly, |statements| statements)
    }

    /// Run one REPL line.  Lines that look like a statement run as a
    /// program; anything else is parsed as a single expression whose value
    /// is printed.
    pub fn run_prompt_line(&mut self, line: &str) -> RunStatus {
        if line.trim().is_empty() {
            return RunStatus::Ok;
        }

        let (tokens, scanned_cleanly) = self.scan(line);

        if starts_statement(&tokens) {
            debug!("Prompt line parsed as statements");
            let parsed = Parser::new(&tokens).parse();
            return self.finish(parsed, scanned_cleanly, |statements| statements);
        }

        debug!("Prompt line parsed as an expression");
        let parsed = Parser::new(&tokens).parse_expression();
        self.finish(parsed, scanned_cleanly, |expr| vec![Stmt::Print(expr)])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline stages
    // ─────────────────────────────────────────────────────────────────────────

    /// Scan `source`, reporting lexical errors.  The tokens are returned
    /// either way so the parser can still report syntax errors.
    fn scan(&mut self, source: &str) -> (Vec<Token>, bool) {
        let (tokens, errors) = scan_tokens(source);
        self.report_all(&errors);

        (tokens, errors.is_empty())
    }

    /// Report parse errors, or execute the parsed program if every stage so
    /// far was clean.
    fn finish<T>(
        &mut self,
        parsed: Result<T, Vec<LoxError>>,
        scanned_cleanly: bool,
        into_statements: impl FnOnce(T) -> Vec<Stmt>,
    ) -> RunStatus {
        match parsed {
            Ok(_) if !scanned_cleanly => RunStatus::StaticError,
            Ok(parsed) => self.execute(&into_statements(parsed)),
            Err(errors) => {
                self.report_all(&errors);
                RunStatus::StaticError
            }
        }
    }

    /// Resolve, then interpret if resolution found no errors.
    fn execute(&mut self, statements: &[Stmt]) -> RunStatus {
        let report = Resolver::new().resolve(statements);

        self.report_all(&report.warnings);
        if report.has_errors() {
            self.report_all(&report.errors);
            return RunStatus::StaticError;
        }

        match self.interpreter.interpret(statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.report(&e);
                RunStatus::RuntimeError
            }
        }
    }

    fn report_all<D: Display>(&mut self, diagnostics: &[D]) {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }

    fn report(&mut self, diagnostic: &dyn Display) {
        if let Err(e) = writeln!(self.err, "{}", diagnostic).and_then(|_| self.err.flush()) {
            warn!("Failed to write diagnostic: {}", e);
        }
    }
}

/// Leading tokens that make a prompt line a statement list.
fn starts_statement(tokens: &[Token]) -> bool {
    let Some(first) = tokens.first() else {
        return false;
    };

    match first.token_type {
        TokenType::VAR
        | TokenType::IF
        | TokenType::WHILE
        | TokenType::LEFT_BRACE
        | TokenType::PRINT
        | TokenType::FUN
        | TokenType::FOR
        | TokenType::CLASS
        | TokenType::RETURN
        | TokenType::THIS => true,
        TokenType::IDENTIFIER => tokens
            .get(1)
            .is_some_and(|next| next.token_type == TokenType::EQUAL),
        _ => false,
    }
}
