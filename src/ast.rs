//! Syntax tree produced by the [`Parser`](crate::parser::Parser) and consumed
//! by the resolver, the interpreter and the debug printers.
//!
//! Nodes that refer to a variable (`Variable`, `Assign`, `This`) carry a
//! [`Depth`] slot.  The resolver fills it in once; the interpreter reads it to
//! jump straight to the declaring scope.  Keeping the slot on the node ties
//! the resolution to this exact occurrence, so two identical-looking
//! references never share an entry.

use std::cell::Cell;
use std::rc::Rc;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// `true` or `false`.
    Bool(bool),

    /// The `nil` literal.
    Nil,
}

/// Lexical distance recorded by the resolver.  `None` means global.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Depth(Cell<Option<usize>>);

impl Depth {
    pub fn get(&self) -> Option<usize> {
        self.0.get()
    }

    pub fn set(&self, distance: usize) {
        self.0.set(Some(distance));
    }
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `name = value`
    Assign {
        name: Token,
        value: Box<Expr>,
        depth: Depth,
    },

    /// `condition ? then_branch : else_branch` (right‑associative).
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Infix operator expression such as `a + b` or `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Function‑, method‑ or class‑call expression.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Literal(LiteralValue),

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { keyword: Token, depth: Depth },

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    /// Variable access.
    Variable { name: Token, depth: Depth },

    /// Anonymous function.  `name` is the `lambda` keyword token.
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            name,
            depth: Depth::default(),
        }
    }

    pub fn assign(name: Token, value: Expr) -> Self {
        Expr::Assign {
            name,
            value: Box::new(value),
            depth: Depth::default(),
        }
    }
}

/// A named (or lambda) function: shared between the AST and every closure
/// created from it, hence the `Rc` at use sites.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// `name (= initializer)?` ‑ one declarator of a `var` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    pub methods: Vec<Rc<FunctionDecl>>,
    /// Methods declared with a leading `class` keyword.
    pub static_methods: Vec<Rc<FunctionDecl>>,
}

/// Complete executable constructs.  A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),

    Class(ClassDecl),

    Expression(Expr),

    Function(Rc<FunctionDecl>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Print(Expr),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,
        value: Option<Expr>,
    },

    Var(VarDecl),

    /// `var a = 1, b, c = 3;`
    MultiVar(Vec<VarDecl>),
}
