use crate::ast::{Expr, FunctionDecl, LiteralValue};

/// Converts an expression to the parenthesized prefix form, e.g.
/// `(* (- 123) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => literal(lit),

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::This { .. } => "this".into(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Lambda(decl) => format!("(lambda ({}))", params(decl)),
        }
    }
}

/// Reverse‑Polish form: operands first, operator last, e.g.
/// `(1 + 2) * (4 - 3)` → `1 2 + 4 3 - *`.
pub struct RpnPrinter;

impl RpnPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            Expr::Literal(lit) => literal(lit),

            Expr::Grouping(inner) => Self::print(inner),

            // Unary minus gets its own symbol so it can't be confused with
            // subtraction.
            Expr::Unary { operator, right } => {
                let op = if operator.lexeme == "-" { "~" } else { "!" };
                format!("{} {}", Self::print(right), op)
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::print(left),
                Self::print(right),
                operator.lexeme
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            // no postfix notation for these; fall back to the prefix form
            other => AstPrinter::print(other),
        }
    }
}

fn literal(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::Bool(b) => b.to_string(),

        LiteralValue::Nil => "nil".into(),

        LiteralValue::Str(s) => s.clone(),

        LiteralValue::Number(n) => {
            if n.is_finite() && n.fract() == 0.0 {
                // 3.0 → 3
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
    }
}

fn params(decl: &FunctionDecl) -> String {
    decl.params
        .iter()
        .map(|p| p.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(LiteralValue::Number(n)))
    }

    fn op(token_type: TokenType, lexeme: &str) -> Token {
        Token::new(token_type, lexeme, 1)
    }

    #[test]
    fn prefix_form() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: op(TokenType::MINUS, "-"),
                right: num(123.0),
            }),
            operator: op(TokenType::STAR, "*"),
            right: Box::new(Expr::Grouping(num(45.67))),
        };

        assert_eq!(AstPrinter::print(&expr), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn postfix_form() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Grouping(Box::new(Expr::Binary {
                left: num(1.0),
                operator: op(TokenType::PLUS, "+"),
                right: num(2.0),
            }))),
            operator: op(TokenType::STAR, "*"),
            right: Box::new(Expr::Grouping(Box::new(Expr::Binary {
                left: num(4.0),
                operator: op(TokenType::MINUS, "-"),
                right: num(3.0),
            }))),
        };

        assert_eq!(RpnPrinter::print(&expr), "1 2 + 4 3 - *");
    }
}
