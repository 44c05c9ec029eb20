//! A restricted arithmetic expression used by `encalc`/`decalc` field
//! attributes. Grammar and precedence follow ordinary arithmetic: a
//! single free variable `v`, the four basic operators plus `//`, `%`
//! and `**`, unary `-`/`~`, parentheses, and the one named function
//! `round(x, n)`.
//!
//! This is a hand-written recursive-descent parser and tree-walking
//! evaluator, not a general-purpose expression language: there is no
//! name binding beyond `v`, no attribute access, no indexing, and no
//! way to call anything but `round`. A schema-supplied expression can
//! never reach arbitrary code.

use crate::result::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var,
    Num(f64),
    Neg(Box<Expr>),
    BitNot(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    FloorDiv(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Round(Box<Expr>, Box<Expr>),
}

/// Parses `source` into an `Expr`. An empty or all-whitespace source is
/// not accepted here; callers represent "no transform" as `None` rather
/// than an empty expression.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Evaluates `expr` with `v` bound to `value`.
pub fn eval(expr: &Expr, value: f64) -> Result<f64> {
    match expr {
        Expr::Var => Ok(value),
        Expr::Num(n) => Ok(*n),
        Expr::Neg(a) => Ok(-eval(a, value)?),
        Expr::BitNot(a) => {
            let a = eval(a, value)?;
            as_i64(a).map(|v| (!v) as f64)
        }
        Expr::Add(a, b) => Ok(eval(a, value)? + eval(b, value)?),
        Expr::Sub(a, b) => Ok(eval(a, value)? - eval(b, value)?),
        Expr::Mul(a, b) => Ok(eval(a, value)? * eval(b, value)?),
        Expr::Div(a, b) => {
            let (a, b) = (eval(a, value)?, eval(b, value)?);
            if b == 0.0 {
                return Err(Error::Input("division by zero in calc expression".into()));
            }
            Ok(a / b)
        }
        Expr::FloorDiv(a, b) => {
            let (a, b) = (eval(a, value)?, eval(b, value)?);
            if b == 0.0 {
                return Err(Error::Input("division by zero in calc expression".into()));
            }
            Ok((a / b).floor())
        }
        Expr::Mod(a, b) => {
            let (a, b) = (eval(a, value)?, eval(b, value)?);
            if b == 0.0 {
                return Err(Error::Input("division by zero in calc expression".into()));
            }
            Ok(a.rem_euclid(b))
        }
        Expr::Pow(a, b) => Ok(eval(a, value)?.powf(eval(b, value)?)),
        Expr::Round(a, b) => {
            let a = eval(a, value)?;
            let n = as_i64(eval(b, value)?)?;
            Ok(round_to_places(a, n))
        }
    }
}

/// Renders `expr` back to source text. Used only by the schema
/// exporter; the result is always fully parenthesized so it reparses
/// to an equivalent tree, not necessarily the operator's original
/// spelling.
pub fn unparse(expr: &Expr) -> String {
    match expr {
        Expr::Var => "v".to_string(),
        Expr::Num(n) => format_num(*n),
        Expr::Neg(a) => format!("-({})", unparse(a)),
        Expr::BitNot(a) => format!("~({})", unparse(a)),
        Expr::Add(a, b) => format!("({}) + ({})", unparse(a), unparse(b)),
        Expr::Sub(a, b) => format!("({}) - ({})", unparse(a), unparse(b)),
        Expr::Mul(a, b) => format!("({}) * ({})", unparse(a), unparse(b)),
        Expr::Div(a, b) => format!("({}) / ({})", unparse(a), unparse(b)),
        Expr::FloorDiv(a, b) => format!("({}) // ({})", unparse(a), unparse(b)),
        Expr::Mod(a, b) => format!("({}) % ({})", unparse(a), unparse(b)),
        Expr::Pow(a, b) => format!("({}) ** ({})", unparse(a), unparse(b)),
        Expr::Round(a, b) => format!("round({}, {})", unparse(a), unparse(b)),
    }
}

fn format_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn as_i64(v: f64) -> Result<i64> {
    if v.fract() != 0.0 {
        return Err(Error::Input(format!("expected an integer in calc expression, got {v}")));
    }
    Ok(v as i64)
}

/// Rounds `value` to `places` decimal places, ties to even.
fn round_to_places(value: f64, places: i64) -> f64 {
    let scale = 10f64.powi(places as i32);
    round_ties_even(value * scale) / scale
}

fn round_ties_even(value: f64) -> f64 {
    let floor = value.floor();
    let diff = value - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Var,
    Round,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    StarStar,
    Tilde,
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '~' => {
                tokens.push(Token::Tilde);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::StarStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::SlashSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let num = text
                    .parse::<f64>()
                    .map_err(|_| Error::Schema(format!("invalid numeric literal '{text}' in calc expression")))?;
                tokens.push(Token::Num(num));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                match text.as_str() {
                    "v" => tokens.push(Token::Var),
                    "round" => tokens.push(Token::Round),
                    other => {
                        return Err(Error::Schema(format!(
                            "unknown identifier '{other}' in calc expression"
                        )))
                    }
                }
            }
            other => {
                return Err(Error::Schema(format!("unexpected character '{other}' in calc expression")))
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expect_end(&self) -> Result<()> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(Error::Schema("trailing tokens in calc expression".into()))
        }
    }

    fn expect(&mut self, tok: &Token) -> Result<()> {
        if self.advance() == Some(tok) {
            Ok(())
        } else {
            Err(Error::Schema(format!("expected {tok:?} in calc expression")))
        }
    }

    // expr := term (('+'|'-') term)*
    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.parse_term()?));
                }
                Some(Token::Minus) => {
                    self.advance();
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.parse_term()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // term := unary (('*'|'/'|'//'|'%') unary)*
    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.parse_unary()?));
                }
                Some(Token::Slash) => {
                    self.advance();
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.parse_unary()?));
                }
                Some(Token::SlashSlash) => {
                    self.advance();
                    lhs = Expr::FloorDiv(Box::new(lhs), Box::new(self.parse_unary()?));
                }
                Some(Token::Percent) => {
                    self.advance();
                    lhs = Expr::Mod(Box::new(lhs), Box::new(self.parse_unary()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // unary := ('-'|'~') unary | power
    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Tilde) => {
                self.advance();
                Ok(Expr::BitNot(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_power(),
        }
    }

    // power := atom ('**' unary)?
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_atom()?;
        if matches!(self.peek(), Some(Token::StarStar)) {
            self.advance();
            let exponent = self.parse_unary()?;
            Ok(Expr::Pow(Box::new(base), Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    // atom := NUMBER | 'v' | 'round' '(' expr ',' expr ')' | '(' expr ')'
    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance().cloned() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Var) => Ok(Expr::Var),
            Some(Token::Round) => {
                self.expect(&Token::LParen)?;
                let x = self.parse_expr()?;
                self.expect(&Token::Comma)?;
                let n = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Round(Box::new(x), Box::new(n)))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(Error::Schema(format!("unexpected token {other:?} in calc expression"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_expression() {
        let expr = parse("v").unwrap();
        assert_eq!(eval(&expr, 42.0).unwrap(), 42.0);
    }

    #[test]
    fn linear_transform() {
        let expr = parse("v * 0.1").unwrap();
        assert!((eval(&expr, 500.0).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_unary_minus() {
        let expr = parse("-2 ** 2").unwrap();
        assert_eq!(eval(&expr, 0.0).unwrap(), -4.0);
    }

    #[test]
    fn round_function_rounds_ties_to_even() {
        let expr = parse("round(v, 0)").unwrap();
        assert_eq!(eval(&expr, 2.5).unwrap(), 2.0);
        assert_eq!(eval(&expr, 3.5).unwrap(), 4.0);
    }

    #[test]
    fn rejects_unknown_identifiers() {
        assert!(parse("open(v)").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("v + 1 )").is_err());
    }

    #[test]
    fn unparse_reparses_to_an_equivalent_expression() {
        let expr = parse("(v + 1) * 2 - round(v / 3, 1)").unwrap();
        let reparsed = parse(&unparse(&expr)).unwrap();
        assert_eq!(eval(&expr, 7.0).unwrap(), eval(&reparsed, 7.0).unwrap());
    }
}
