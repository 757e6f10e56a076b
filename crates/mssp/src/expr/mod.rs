//! Symbolic expressions: AST, prefix/infix notation, grammar and vocabulary.

mod ast;
mod grammar;
mod infix;
mod vocab;

pub use ast::{BinaryOp, Expr, GrammarError, UnaryOp, COEFFICIENT_WORD};
pub use grammar::{ExpressionGrammar, PrefixGrammar, PLACEHOLDER_VARIABLE};
pub use infix::{parse_infix, ParseError};
pub use vocab::{Vocabulary, VocabError, FINISH_WORD, PAD_WORD, START_WORD};
