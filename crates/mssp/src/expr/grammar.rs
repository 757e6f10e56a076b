//! Expression grammar capability.

use super::ast::{Expr, GrammarError};
use super::infix::{parse_infix, ParseError};

/// Placeholder variable name used in training skeletons.
pub const PLACEHOLDER_VARIABLE: &str = "x_1";

/// Conversion between prefix words, infix text and expressions.
///
/// Implementations must be deterministic: the same words always produce the
/// same infix string.
pub trait ExpressionGrammar: Send + Sync {
    /// Render a prefix-notation word sequence as infix text.
    fn prefix_to_infix(&self, words: &[&str]) -> Result<String, GrammarError>;

    /// Parse infix text into an expression.
    fn parse_infix(&self, text: &str) -> Result<Expr, ParseError>;
}

/// Default grammar over the [`Expr`] operator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGrammar {
    variables: Vec<String>,
}

impl Default for PrefixGrammar {
    fn default() -> Self {
        Self::new([PLACEHOLDER_VARIABLE])
    }
}

impl PrefixGrammar {
    /// Grammar accepting the given variable words.
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn is_variable(&self, word: &str) -> bool {
        self.variables.iter().any(|v| v == word)
    }

    /// Read prefix words into an expression.
    pub fn parse_prefix(&self, words: &[&str]) -> Result<Expr, GrammarError> {
        Expr::from_prefix(words, |w| self.is_variable(w))
    }
}

impl ExpressionGrammar for PrefixGrammar {
    fn prefix_to_infix(&self, words: &[&str]) -> Result<String, GrammarError> {
        Ok(self.parse_prefix(words)?.to_string())
    }

    fn parse_infix(&self, text: &str) -> Result<Expr, ParseError> {
        parse_infix(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_to_infix_to_prefix() {
        let g = PrefixGrammar::default();
        let words = ["mul", "c", "log", "add", "x_1", "3"];
        let infix = g.prefix_to_infix(&words).unwrap();
        assert_eq!(infix, "(c * log((x_1 + 3)))");
        let expr = g.parse_infix(&infix).unwrap();
        assert_eq!(expr.to_prefix(), words.to_vec());
    }

    #[test]
    fn unknown_variable_rejected() {
        let g = PrefixGrammar::default();
        assert_eq!(
            g.prefix_to_infix(&["add", "x_2", "c"]),
            Err(GrammarError::UnknownWord("x_2".into()))
        );
        let g = PrefixGrammar::new(["x_1", "x_2"]);
        assert!(g.prefix_to_infix(&["add", "x_2", "c"]).is_ok());
    }
}
