//! Everything that can appear on the left of `(...)`: user functions (and
//! lambdas), host-implemented natives, and classes.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxClass;
use crate::environment::{EnvRef, Environment};
use crate::error::Result;
use crate::instance::LoxInstance;
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Callable category of [`Value`].
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<LoxFunction>),
    Native(Rc<NativeFunction>),
    Class(Rc<LoxClass>),
}

impl Callable {
    /// Number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Native(native) => native.arity,
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already-evaluated, arity-checked arguments.  `paren` is
    /// the call site, used to locate errors raised by natives.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),

            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(interpreter, paren, &arguments)
            }

            Callable::Class(class) => {
                let instance = Rc::new(LoxInstance::new(Rc::clone(class)));

                if let Some(initializer) = class.find_method("init") {
                    initializer.bind(&instance).call(interpreter, arguments)?;
                }

                Ok(Value::Instance(instance))
            }
        }
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Class(class) => write!(f, "{}", class.name),
        }
    }
}

/// A user-defined function or lambda paired with the scope it was created in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure has one extra scope binding
    /// `this` to `instance`.
    pub fn bind(&self, instance: &Rc<LoxInstance>) -> Rc<LoxFunction> {
        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));
        scope.define("this", Value::Instance(Rc::clone(instance)));

        Rc::new(LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: scope.into_ref(),
            is_initializer: self.is_initializer,
        })
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            scope.define(&param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.declaration.body, scope.into_ref())?;

        // An initializer always hands back the instance, whatever it returned.
        if self.is_initializer {
            return Ok(self.closure.borrow().get_local("this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

/// Host-implemented behaviour exposed as a global.  Receives the call
/// site's closing paren for error reporting.
pub type NativeFn = fn(&mut Interpreter, &Token, &[Value]) -> Result<Value>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
