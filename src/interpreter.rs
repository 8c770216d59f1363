//! Tree-walking evaluator.
//!
//! Statements return a [`Flow`] so that `return` can unwind through nested
//! blocks and loops without using the error channel; only genuine runtime
//! errors travel through `Err`.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{ClassDecl, Depth, Expr, LiteralValue, Stmt, VarDecl};
use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::class::LoxClass;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Nested calls allowed before a program is stopped with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 255;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    out: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `out`; natives `clock` and `print` are bound
    /// in the global scope.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_ref();

        for native in [
            NativeFunction {
                name: "clock",
                arity: 0,
                func: native_clock,
            },
            NativeFunction {
                name: "print",
                arity: 1,
                func: native_print,
            },
        ] {
            debug!("Defining native function '{}'", native.name);
            globals
                .borrow_mut()
                .define(native.name, Value::Callable(Callable::Native(Rc::new(native))));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            out,
            call_depth: 0,
        }
    }

    /// The root scope that persists across runs.
    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Runs a program.  Stops at the first runtime error; whatever already
    /// executed stays executed.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = statements
            .iter()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        self.out.flush()?;
        result?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Writes `text` and a line break to the program's output.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.write_line(&value.to_string())?;
            }

            Stmt::Var(decl) => self.define_var(decl)?,

            Stmt::MultiVar(decls) => {
                for decl in decls {
                    self.define_var(decl)?;
                }
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, scope.into_ref());
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
            }

            Stmt::Class(decl) => self.declare_class(decl),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Runs `statements` inside `scope`, restoring the current scope
    /// afterwards whether they finish, return, or fail.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous = mem::replace(&mut self.environment, scope);
        let mut result = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn define_var(&mut self, decl: &VarDecl) -> Result<()> {
        let value = match &decl.initializer {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };

        debug!("Variable '{}' defined with value: {}", decl.name.lexeme, value);
        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, value);
        Ok(())
    }

    fn declare_class(&mut self, decl: &ClassDecl) {
        debug!("Declaring class '{}'", decl.name.lexeme);

        let methods: HashMap<String, Rc<LoxFunction>> = decl
            .methods
            .iter()
            .map(|method| {
                let is_init = method.name.lexeme == "init";
                let function =
                    LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_init);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        // Static methods see the class body scope the resolver counted, minus
        // the `this` binding they are not allowed to use.
        let class_scope = Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
        let static_methods: HashMap<String, Rc<LoxFunction>> = decl
            .static_methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(Rc::clone(method), Rc::clone(&class_scope), false);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(decl.name.lexeme.clone(), methods, static_methods);
        self.environment.borrow_mut().define(
            &decl.name.lexeme,
            Value::Callable(Callable::Class(Rc::new(class))),
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(
                            operator,
                            format!("Operand of '{}' must be a number.", operator.lexeme),
                        )),
                    },
                    _ => Err(invalid_operator(operator)),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { name, depth } => self.look_up_variable(name, depth),

            Expr::This { keyword, depth } => self.look_up_variable(keyword, depth),

            Expr::Assign { name, value, depth } => {
                let value = self.evaluate(value)?;

                match depth.get() {
                    Some(distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                self.call(&callable, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),

                Value::Callable(Callable::Class(class)) => class
                    .find_static_method(&name.lexeme)
                    .map(|method| Value::Callable(Callable::Function(method)))
                    .ok_or_else(|| {
                        LoxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
                    }),

                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::Lambda(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }
        }
    }

    fn look_up_variable(&self, name: &Token, depth: &Depth) -> Result<Value> {
        match depth.get() {
            Some(distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call(&mut self, callable: &Callable, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callable.call(self, paren, arguments);
        self.call_depth -= 1;

        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
        TokenType::PLUS => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), right) => Ok(Value::String(format!("{}{}", a, right))),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands of '+' must be two numbers or the first operand must be a string.",
                )),
            };
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
        return Err(LoxError::runtime(
            operator,
            format!("Operands of '{}' must be numbers.", operator.lexeme),
        ));
    };
    let (a, b) = (*a, *b);

    let value = match operator.token_type {
        TokenType::GREATER => Value::Bool(a > b),
        TokenType::GREATER_EQUAL => Value::Bool(a >= b),
        TokenType::LESS => Value::Bool(a < b),
        TokenType::LESS_EQUAL => Value::Bool(a <= b),
        TokenType::MINUS => Value::Number(a - b),
        TokenType::STAR => Value::Number(a * b),
        TokenType::PERCENT => Value::Number(a % b),
        TokenType::SLASH => {
            if b == 0.0 {
                return Err(LoxError::runtime(operator, "Division by zero."));
            }
            Value::Number(a / b)
        }
        _ => return Err(invalid_operator(operator)),
    };

    Ok(value)
}

fn invalid_operator(operator: &Token) -> LoxError {
    LoxError::runtime(
        operator,
        format!("Invalid operator '{}'.", operator.lexeme),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Natives
// ─────────────────────────────────────────────────────────────────────────────

fn native_clock(_interpreter: &mut Interpreter, paren: &Token, _args: &[Value]) -> Result<Value> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e: SystemTimeError| LoxError::runtime(paren, format!("Clock error: {}.", e)))?
        .as_secs_f64();

    debug!("Native function 'clock' returned: {}", seconds);
    Ok(Value::Number(seconds))
}

fn native_print(interpreter: &mut Interpreter, _paren: &Token, args: &[Value]) -> Result<Value> {
    for value in args {
        interpreter.write_line(&value.to_string())?;
    }

    Ok(Value::Nil)
}
