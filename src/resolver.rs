//! Static resolver pass.
//!
//! This resolver does three things in one AST walk:
//! 1. Mirror the interpreter's lexical scopes with a stack of name tables.
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `this` / `return`).  Errors are collected; the walk never stops early.
//! 3. Write, into the [`Depth`] slot of each `Variable` / `Assign` / `This`
//!    node, how many scopes out its binding lives.  Nodes left empty are
//!    globals.
//!
//! Alongside, every `var`-declared local is tracked by its slot in the scope;
//! one still unread when its scope closes produces a [`LoxWarning`].

use crate::ast::{ClassDecl, Depth, Expr, FunctionDecl, Stmt, VarDecl};
use crate::error::{LoxError, LoxWarning};
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// What kind of function body we are in.  Drives the `return` checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
    StaticMethod,
}

/// Where `this` may appear.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    /// Inside a static method, at any nesting depth.
    Static,
}

struct Local {
    name: Token,
    defined: bool,
    used: bool,
    /// Only `var` declarations are reported when unused.
    tracked: bool,
}

#[derive(Default)]
struct Scope {
    slots: HashMap<String, usize>,
    locals: Vec<Local>,
}

/// Everything the pass found.  Any error means the program must not run.
#[derive(Debug, Default)]
pub struct ResolveReport {
    pub errors: Vec<LoxError>,
    pub warnings: Vec<LoxWarning>,
}

impl ResolveReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct Resolver {
    scopes: Vec<Scope>,
    current_function: FunctionType,
    current_class: ClassType,
    report: ResolveReport,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            report: ResolveReport::default(),
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(mut self, statements: &[Stmt]) -> ResolveReport {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        info!(
            "Resolve pass done: {} error(s), {} warning(s)",
            self.report.errors.len(),
            self.report.warnings.len()
        );

        self.report
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.resolve_stmt_kind(stmt));
    }

    fn resolve_stmt_kind(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Class(decl) => self.resolve_class(decl),

            Stmt::Var(decl) => self.resolve_var(decl),

            Stmt::MultiVar(decls) => {
                for decl in decls {
                    self.resolve_var(decl);
                }
            }

            Stmt::Function(decl) => {
                // the name is visible *inside* its own body (recursion)
                self.declare(&decl.name, false);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    /// declare → resolve initializer → define, so the initializer cannot
    /// see the variable it initializes.
    fn resolve_var(&mut self, decl: &VarDecl) {
        self.declare(&decl.name, true);
        if let Some(expr) = &decl.initializer {
            self.resolve_expr(expr);
        }
        self.define(&decl.name);
    }

    fn resolve_class(&mut self, decl: &ClassDecl) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(&decl.name, false);
        self.define(&decl.name);

        self.begin_scope();
        self.bind_this(&decl.name);

        for method in &decl.methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.current_class = ClassType::Static;
        for method in &decl.static_methods {
            self.resolve_function(method, FunctionType::StaticMethod);
        }

        self.end_scope();
        self.current_class = enclosing_class;
    }

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        debug!("Resolving {:?} '{}'", kind, function.name.lexeme);

        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param, false);
            self.define(param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_kind(expr));
    }

    fn resolve_expr_kind(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) | Expr::Unary { right: inner, .. } => self.resolve_expr(inner),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { name, depth } => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.slots.get(&name.lexeme).map(|&i| &scope.locals[i]))
                    .is_some_and(|local| !local.defined);

                if in_own_initializer {
                    self.error(name, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(name, depth, true);
            }

            Expr::Assign { name, value, depth } => {
                self.resolve_expr(value);
                self.resolve_local(name, depth, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { keyword, depth } => match self.current_class {
                ClassType::None => self.error(keyword, "Cannot use 'this' outside of class."),
                ClassType::Static => self.error(keyword, "Cannot use 'this' in a static context."),
                ClassType::Class => self.resolve_local(keyword, depth, false),
            },

            // Anonymous: nothing is declared in the enclosing scope.
            Expr::Lambda(decl) => self.resolve_function(decl, FunctionType::Function),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope, warning about tracked locals never read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        for local in scope.locals {
            if local.tracked && !local.used {
                debug!("Unused local '{}'", local.name.lexeme);

                self.report.warnings.push(LoxWarning {
                    message: format!("Local variable '{}' is never used.", local.name.lexeme),
                    line: local.name.line,
                });
            }
        }
    }

    fn bind_this(&mut self, class_name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            let mut this = class_name.clone();
            this.lexeme = "this".to_string();

            scope.slots.insert(this.lexeme.clone(), scope.locals.len());
            scope.locals.push(Local {
                name: this,
                defined: true,
                used: false,
                tracked: false,
            });
        }
    }

    /// Add `name` to the innermost scope as declared-but-not-defined.
    /// Globals (empty stack) are not tracked.
    fn declare(&mut self, name: &Token, tracked: bool) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if let Some(&slot) = scope.slots.get(&name.lexeme) {
            scope.locals[slot].defined = false;
            self.error(
                name,
                "Variable with this name already declared in this scope.",
            );
            return;
        }

        scope.slots.insert(name.lexeme.clone(), scope.locals.len());
        scope.locals.push(Local {
            name: name.clone(),
            defined: false,
            used: false,
            tracked,
        });
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(&slot) = scope.slots.get(&name.lexeme) {
                scope.locals[slot].defined = true;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at distance `d`, or leave the slot
    /// empty (global) if no scope declares the name.
    fn resolve_local(&mut self, name: &Token, depth: &Depth, is_read: bool) {
        for (distance, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(&slot) = scope.slots.get(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, distance);
                depth.set(distance);

                if is_read {
                    scope.locals[slot].used = true;
                }
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.report.errors.push(LoxError::resolve(token, message));
    }
}
