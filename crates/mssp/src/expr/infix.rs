//! Infix rendering and parsing.
//!
//! Rendering parenthesizes every binary operation and every negative
//! literal, so [`parse_infix`] rebuilds exactly the tree that was printed.
//! The parser also accepts ordinary infix input with precedence
//! (`**` > unary minus > `* /` > `+ -`), `**` being right-associative.

use std::fmt;

use super::ast::{BinaryOp, Expr, UnaryOp, COEFFICIENT_WORD};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Coefficient => write!(f, "{}", COEFFICIENT_WORD),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Integer(n) if *n < 0 => write!(f, "({})", n),
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Constant(v) if *v < 0.0 => write!(f, "({:?})", v),
            Expr::Constant(v) => write!(f, "{:?}", v),
            Expr::Unary(op, arg) => write!(f, "{}({})", op.name(), arg),
            Expr::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}

/// Errors raised while parsing infix text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected character `{ch}` at {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unexpected `{found}` at {pos}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(s) | Token::Ident(s) => write!(f, "{}", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Pow => write!(f, "**"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let start = i;
        match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => tokens.push((start, Token::Plus)),
            '-' => tokens.push((start, Token::Minus)),
            '/' => tokens.push((start, Token::Slash)),
            '(' => tokens.push((start, Token::LParen)),
            ')' => tokens.push((start, Token::RParen)),
            '^' => tokens.push((start, Token::Pow)),
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    i += 1;
                    tokens.push((start, Token::Pow));
                } else {
                    tokens.push((start, Token::Star));
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '.') {
                    i += 1;
                }
                // Exponent: e / E followed by optional sign and digits
                if i + 1 < chars.len() && matches!(chars[i + 1], 'e' | 'E') {
                    let mut j = i + 2;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j + 1 < chars.len() && chars[j + 1].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                tokens.push((start, Token::Number(chars[start..=i].iter().collect())));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_alphanumeric() || chars[i + 1] == '_') {
                    i += 1;
                }
                tokens.push((start, Token::Ident(chars[start..=i].iter().collect())));
            }
            other => return Err(ParseError::UnexpectedChar { pos: start, ch: other }),
        }
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.next() {
            Some((_, t)) if t == expected => Ok(()),
            Some((pos, t)) => Err(ParseError::UnexpectedToken {
                pos,
                found: t.to_string(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// sum := product (('+' | '-') product)*
    fn sum(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.product()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    /// product := unary (('*' | '/') unary)*
    fn product(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    /// unary := '-' unary | power
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            let inner = self.unary()?;
            return Ok(match inner {
                Expr::Integer(n) => Expr::Integer(-n),
                Expr::Constant(v) => Expr::Constant(-v),
                other => Expr::binary(BinaryOp::Mul, Expr::Integer(-1), other),
            });
        }
        self.power()
    }

    /// power := atom ('**' unary)?
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some((_, Token::Number(text))) => parse_number(&text),
            Some((_, Token::Ident(name))) => {
                if self.peek() == Some(&Token::LParen) {
                    let op = UnaryOp::from_name(&name).ok_or(ParseError::UnknownFunction(name))?;
                    self.pos += 1;
                    let arg = self.sum()?;
                    self.expect(Token::RParen)?;
                    return Ok(Expr::unary(op, arg));
                }
                if name == COEFFICIENT_WORD {
                    return Ok(Expr::Coefficient);
                }
                Ok(Expr::Variable(name))
            }
            Some((_, Token::LParen)) => {
                let inner = self.sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some((pos, t)) => Err(ParseError::UnexpectedToken {
                pos,
                found: t.to_string(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}

fn parse_number(text: &str) -> Result<Expr, ParseError> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Expr::Integer(n));
        }
    }
    text.parse::<f64>()
        .map(Expr::Constant)
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

/// Parse infix text into an expression.
pub fn parse_infix(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.sum()?;
    match parser.next() {
        None => Ok(expr),
        Some((pos, t)) => Err(ParseError::UnexpectedToken {
            pos,
            found: t.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn is_x(w: &str) -> bool {
        w == "x_1"
    }

    #[rstest]
    #[case(&["add", "mul", "c", "sin", "x_1", "c"], "((c * sin(x_1)) + c)")]
    #[case(&["add", "x_1", "add", "x_1", "c"], "(x_1 + (x_1 + c))")]
    #[case(&["mul", "-1", "x_1"], "((-1) * x_1)")]
    #[case(&["pow", "pow", "x_1", "2", "3"], "((x_1 ** 2) ** 3)")]
    #[case(&["div", "c", "sub", "x_1", "exp", "x_1"], "(c / (x_1 - exp(x_1)))")]
    fn render_and_reparse(#[case] prefix: &[&str], #[case] infix: &str) {
        let e = Expr::from_prefix(prefix, is_x).unwrap();
        assert_eq!(e.to_string(), infix);
        assert_eq!(parse_infix(infix).unwrap(), e);
    }

    #[test]
    fn precedence_and_associativity() {
        let e = parse_infix("c + x_1 * 2 ** 3 ** 2").unwrap();
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Add,
                Expr::Coefficient,
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::var("x_1"),
                    Expr::binary(
                        BinaryOp::Pow,
                        Expr::Integer(2),
                        Expr::binary(BinaryOp::Pow, Expr::Integer(3), Expr::Integer(2)),
                    ),
                ),
            )
        );
        let e = parse_infix("x_1 - c - 1").unwrap();
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(BinaryOp::Sub, Expr::var("x_1"), Expr::Coefficient),
                Expr::Integer(1),
            )
        );
    }

    #[test]
    fn unary_minus() {
        assert_eq!(parse_infix("-x_1").unwrap(), Expr::binary(BinaryOp::Mul, Expr::Integer(-1), Expr::var("x_1")));
        assert_eq!(parse_infix("(-2.5)").unwrap(), Expr::Constant(-2.5));
        assert_eq!(parse_infix("1e-3").unwrap(), Expr::Constant(1e-3));
    }

    #[test]
    fn constants_render_unambiguously() {
        let e = Expr::binary(BinaryOp::Add, Expr::Constant(2.0), Expr::Constant(-0.5));
        assert_eq!(e.to_string(), "(2.0 + (-0.5))");
        assert_eq!(parse_infix(&e.to_string()).unwrap(), e);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_infix("(x_1 + c"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse_infix("foo(x_1)"), Err(ParseError::UnknownFunction("foo".into())));
        assert_eq!(parse_infix("x_1 $ 2"), Err(ParseError::UnexpectedChar { pos: 4, ch: '$' }));
        assert!(matches!(parse_infix("x_1 c"), Err(ParseError::UnexpectedToken { .. })));
        assert_eq!(parse_infix(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse_infix("1.2.3"), Err(ParseError::InvalidNumber("1.2.3".into())));
    }
}
