//! Expression tree and prefix-notation codec.

use std::collections::BTreeSet;

// =============================================================================
// Operators
// =============================================================================

/// Single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Abs,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 13] = [
        UnaryOp::Sin,
        UnaryOp::Cos,
        UnaryOp::Tan,
        UnaryOp::Exp,
        UnaryOp::Log,
        UnaryOp::Sqrt,
        UnaryOp::Abs,
        UnaryOp::Asin,
        UnaryOp::Acos,
        UnaryOp::Atan,
        UnaryOp::Sinh,
        UnaryOp::Cosh,
        UnaryOp::Tanh,
    ];

    /// Word used both in prefix notation and as the infix function name.
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Abs => "abs",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    #[inline]
    pub fn apply(self, v: f64) -> f64 {
        match self {
            UnaryOp::Sin => v.sin(),
            UnaryOp::Cos => v.cos(),
            UnaryOp::Tan => v.tan(),
            UnaryOp::Exp => v.exp(),
            UnaryOp::Log => v.ln(),
            UnaryOp::Sqrt => v.sqrt(),
            UnaryOp::Abs => v.abs(),
            UnaryOp::Asin => v.asin(),
            UnaryOp::Acos => v.acos(),
            UnaryOp::Atan => v.atan(),
            UnaryOp::Sinh => v.sinh(),
            UnaryOp::Cosh => v.cosh(),
            UnaryOp::Tanh => v.tanh(),
        }
    }
}

/// Two-argument operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 5] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
    ];

    /// Prefix-notation word.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Pow => "pow",
        }
    }

    /// Infix operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }
}

// =============================================================================
// Expr
// =============================================================================

/// Word for the free coefficient placeholder.
pub const COEFFICIENT_WORD: &str = "c";

/// A symbolic expression.
///
/// Skeletons hold [`Expr::Coefficient`] placeholders; fitting replaces them
/// with [`Expr::Constant`] values in prefix order.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Free numeric coefficient.
    Coefficient,
    Variable(String),
    Integer(i64),
    /// Fitted real value.
    Constant(f64),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Errors raised while reading prefix notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("empty prefix expression")]
    Empty,

    #[error("unknown word `{0}`")]
    UnknownWord(String),

    #[error("operator `{0}` is missing operands")]
    Truncated(String),

    #[error("{0} words left after a complete expression")]
    TrailingWords(usize),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn unary(op: UnaryOp, arg: Expr) -> Self {
        Expr::Unary(op, Box::new(arg))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Read a prefix-notation word sequence.
    ///
    /// `is_variable` decides which leaf words are variables; `c` is the
    /// coefficient placeholder and integer words are literals.
    pub fn from_prefix<S: AsRef<str>>(
        words: &[S],
        is_variable: impl Fn(&str) -> bool,
    ) -> Result<Self, GrammarError> {
        if words.is_empty() {
            return Err(GrammarError::Empty);
        }
        let mut pos = 0;
        let expr = parse_prefix_at(words, &mut pos, &is_variable)?;
        if pos != words.len() {
            return Err(GrammarError::TrailingWords(words.len() - pos));
        }
        Ok(expr)
    }

    /// Write the expression in prefix notation.
    pub fn to_prefix(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.write_prefix(&mut out);
        out
    }

    fn write_prefix(&self, out: &mut Vec<String>) {
        match self {
            Expr::Coefficient => out.push(COEFFICIENT_WORD.to_string()),
            Expr::Variable(name) => out.push(name.clone()),
            Expr::Integer(n) => out.push(n.to_string()),
            Expr::Constant(v) => out.push(format!("{:?}", v)),
            Expr::Unary(op, arg) => {
                out.push(op.name().to_string());
                arg.write_prefix(out);
            }
            Expr::Binary(op, lhs, rhs) => {
                out.push(op.name().to_string());
                lhs.write_prefix(out);
                rhs.write_prefix(out);
            }
        }
    }

    /// Number of coefficient placeholders.
    pub fn coefficient_count(&self) -> usize {
        match self {
            Expr::Coefficient => 1,
            Expr::Variable(_) | Expr::Integer(_) | Expr::Constant(_) => 0,
            Expr::Unary(_, arg) => arg.coefficient_count(),
            Expr::Binary(_, lhs, rhs) => lhs.coefficient_count() + rhs.coefficient_count(),
        }
    }

    /// Variable names used by the expression.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Unary(_, arg) => arg.collect_variables(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Coefficient | Expr::Integer(_) | Expr::Constant(_) => {}
        }
    }

    /// Rename every occurrence of variable `from` to `to`.
    pub fn substitute_variable(&self, from: &str, to: &str) -> Expr {
        match self {
            Expr::Variable(name) if name == from => Expr::Variable(to.to_string()),
            Expr::Unary(op, arg) => Expr::unary(*op, arg.substitute_variable(from, to)),
            Expr::Binary(op, lhs, rhs) => Expr::binary(
                *op,
                lhs.substitute_variable(from, to),
                rhs.substitute_variable(from, to),
            ),
            other => other.clone(),
        }
    }

    /// Replace coefficient placeholders, in prefix order, by `values`.
    ///
    /// Placeholders beyond `values.len()` are left in place.
    pub fn bind_coefficients(&self, values: &[f64]) -> Expr {
        let mut next = 0;
        self.bind_at(values, &mut next)
    }

    fn bind_at(&self, values: &[f64], next: &mut usize) -> Expr {
        match self {
            Expr::Coefficient => {
                let bound = values.get(*next).map_or(Expr::Coefficient, |&v| Expr::Constant(v));
                *next += 1;
                bound
            }
            Expr::Unary(op, arg) => Expr::unary(*op, arg.bind_at(values, next)),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.bind_at(values, next);
                let rhs = rhs.bind_at(values, next);
                Expr::binary(*op, lhs, rhs)
            }
            other => other.clone(),
        }
    }

    /// Evaluate a univariate expression: every variable takes the value `x`,
    /// coefficients are read from `coefficients` in prefix order (missing
    /// ones evaluate to NaN).
    pub fn eval(&self, x: f64, coefficients: &[f64]) -> f64 {
        let mut next = 0;
        self.eval_at(x, coefficients, &mut next)
    }

    fn eval_at(&self, x: f64, coefficients: &[f64], next: &mut usize) -> f64 {
        match self {
            Expr::Coefficient => {
                let v = coefficients.get(*next).copied().unwrap_or(f64::NAN);
                *next += 1;
                v
            }
            Expr::Variable(_) => x,
            Expr::Integer(n) => *n as f64,
            Expr::Constant(v) => *v,
            Expr::Unary(op, arg) => op.apply(arg.eval_at(x, coefficients, next)),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval_at(x, coefficients, next);
                let b = rhs.eval_at(x, coefficients, next);
                op.apply(a, b)
            }
        }
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        match self {
            Expr::Unary(_, arg) => 1 + arg.size(),
            Expr::Binary(_, lhs, rhs) => 1 + lhs.size() + rhs.size(),
            _ => 1,
        }
    }
}

fn parse_prefix_at<S: AsRef<str>>(
    words: &[S],
    pos: &mut usize,
    is_variable: &impl Fn(&str) -> bool,
) -> Result<Expr, GrammarError> {
    let word = words[*pos].as_ref();
    *pos += 1;

    if let Some(op) = BinaryOp::from_name(word) {
        if *pos >= words.len() {
            return Err(GrammarError::Truncated(word.to_string()));
        }
        let lhs = parse_prefix_at(words, pos, is_variable)?;
        if *pos >= words.len() {
            return Err(GrammarError::Truncated(word.to_string()));
        }
        let rhs = parse_prefix_at(words, pos, is_variable)?;
        return Ok(Expr::binary(op, lhs, rhs));
    }
    if let Some(op) = UnaryOp::from_name(word) {
        if *pos >= words.len() {
            return Err(GrammarError::Truncated(word.to_string()));
        }
        return Ok(Expr::unary(op, parse_prefix_at(words, pos, is_variable)?));
    }
    if word == COEFFICIENT_WORD {
        return Ok(Expr::Coefficient);
    }
    if let Ok(n) = word.parse::<i64>() {
        return Ok(Expr::Integer(n));
    }
    if is_variable(word) {
        return Ok(Expr::Variable(word.to_string()));
    }
    Err(GrammarError::UnknownWord(word.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn is_x(w: &str) -> bool {
        w == "x_1"
    }

    #[test]
    fn prefix_roundtrip() {
        let words = ["add", "mul", "c", "sin", "x_1", "c"];
        let e = Expr::from_prefix(&words, is_x).unwrap();
        assert_eq!(e.to_prefix(), words.to_vec());
        assert_eq!(e.coefficient_count(), 2);
        assert_eq!(e.size(), 6);
    }

    #[test]
    fn prefix_errors() {
        let empty: [&str; 0] = [];
        assert_eq!(Expr::from_prefix(&empty, is_x), Err(GrammarError::Empty));
        assert_eq!(
            Expr::from_prefix(&["add", "x_1"], is_x),
            Err(GrammarError::Truncated("add".into()))
        );
        assert_eq!(
            Expr::from_prefix(&["sin"], is_x),
            Err(GrammarError::Truncated("sin".into()))
        );
        assert_eq!(
            Expr::from_prefix(&["x_1", "c"], is_x),
            Err(GrammarError::TrailingWords(1))
        );
        assert_eq!(
            Expr::from_prefix(&["add", "x_1", "y"], is_x),
            Err(GrammarError::UnknownWord("y".into()))
        );
    }

    #[test]
    fn eval_consumes_coefficients_in_prefix_order() {
        // c0 * sin(x) + c1
        let e = Expr::from_prefix(&["add", "mul", "c", "sin", "x_1", "c"], is_x).unwrap();
        let v = e.eval(std::f64::consts::FRAC_PI_2, &[2.0, 0.5]);
        assert_relative_eq!(v, 2.5, epsilon = 1e-12);
        assert!(e.eval(1.0, &[1.0]).is_nan());
    }

    #[test]
    fn bind_and_substitute() {
        let e = Expr::from_prefix(&["pow", "x_1", "c"], is_x).unwrap();
        let bound = e.bind_coefficients(&[3.0]).substitute_variable("x_1", "x2");
        assert_eq!(
            bound,
            Expr::binary(BinaryOp::Pow, Expr::var("x2"), Expr::Constant(3.0))
        );
        assert_eq!(bound.coefficient_count(), 0);
        assert_eq!(bound.variables().into_iter().collect::<Vec<_>>(), vec!["x2"]);
    }

    #[test]
    fn integers_are_literals() {
        let e = Expr::from_prefix(&["mul", "-1", "x_1"], is_x).unwrap();
        assert_eq!(e.eval(4.0, &[]), -4.0);
    }
}
