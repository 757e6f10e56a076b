//! Token sequence → skeleton decoding.

use std::fmt;
use std::sync::Arc;

use crate::expr::{
    Expr, ExpressionGrammar, GrammarError, ParseError, PrefixGrammar, VocabError, Vocabulary,
    PLACEHOLDER_VARIABLE,
};
use crate::model::ScoredSequence;

/// Why a candidate sequence produced no skeleton.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty token sequence")]
    Empty,

    #[error(transparent)]
    Vocabulary(#[from] VocabError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("infix `{infix}` does not parse: {source}")]
    Parse {
        infix: String,
        #[source]
        source: ParseError,
    },
}

/// A decoded skeleton bound to a concrete variable symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub expr: Expr,
    /// Variable symbol substituted for the placeholder.
    pub symbol: String,
    /// Score the model assigned to the source sequence.
    pub score: f64,
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// Outcome of decoding every candidate of one variable.
#[derive(Debug, Default)]
pub struct DecodeReport {
    /// Skeletons that decoded, in candidate order.
    pub skeletons: Vec<Skeleton>,
    /// Candidate index and reason for every failure.
    pub failures: Vec<(usize, DecodeError)>,
}

impl DecodeReport {
    pub fn n_candidates(&self) -> usize {
        self.skeletons.len() + self.failures.len()
    }
}

/// Turns predicted token sequences into skeletons.
///
/// Decoding never fails as a whole: every candidate either yields a
/// [`Skeleton`] or a [`DecodeError`] recorded in the [`DecodeReport`].
#[derive(Debug, Clone)]
pub struct SkeletonDecoder<G = PrefixGrammar> {
    vocab: Arc<Vocabulary>,
    grammar: G,
    placeholder: String,
}

impl SkeletonDecoder<PrefixGrammar> {
    /// Decoder over the default grammar and the `x_1` placeholder.
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self::with_grammar(vocab, PrefixGrammar::default(), PLACEHOLDER_VARIABLE)
    }
}

impl<G: ExpressionGrammar> SkeletonDecoder<G> {
    pub fn with_grammar(vocab: Arc<Vocabulary>, grammar: G, placeholder: impl Into<String>) -> Self {
        Self {
            vocab,
            grammar,
            placeholder: placeholder.into(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Decode one raw model sequence. The first token is the start sentinel
    /// and is dropped unconditionally.
    pub fn decode(&self, tokens: &[u32], symbol: &str, score: f64) -> Result<Skeleton, DecodeError> {
        let body = tokens.get(1..).unwrap_or_default();
        let words = self.vocab.detokenize(body)?;
        if words.is_empty() {
            return Err(DecodeError::Empty);
        }
        let infix = self.grammar.prefix_to_infix(&words)?;
        let expr = self
            .grammar
            .parse_infix(&infix)
            .map_err(|source| DecodeError::Parse { infix, source })?;
        Ok(Skeleton {
            expr: expr.substitute_variable(&self.placeholder, symbol),
            symbol: symbol.to_string(),
            score,
        })
    }

    /// Decode every candidate independently.
    pub fn decode_all(&self, candidates: &[ScoredSequence], symbol: &str) -> DecodeReport {
        let mut report = DecodeReport::default();
        for (i, candidate) in candidates.iter().enumerate() {
            match self.decode(&candidate.tokens, symbol, candidate.score) {
                Ok(skeleton) => report.skeletons.push(skeleton),
                Err(e) => report.failures.push((i, e)),
            }
        }
        report
    }

    /// Token ids for a skeleton, with the symbol mapped back to the placeholder
    /// and start/finish sentinels added.
    pub fn encode(&self, skeleton: &Skeleton) -> Result<Vec<u32>, VocabError> {
        let words = skeleton
            .expr
            .substitute_variable(&skeleton.symbol, &self.placeholder)
            .to_prefix();
        self.vocab.encode(&words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> SkeletonDecoder {
        SkeletonDecoder::new(Arc::new(Vocabulary::skeleton_default()))
    }

    fn ids(d: &SkeletonDecoder, words: &[&str]) -> Vec<u32> {
        d.vocabulary().encode(words).unwrap()
    }

    #[test]
    fn decodes_and_substitutes_symbol() {
        let d = decoder();
        let tokens = ids(&d, &["add", "mul", "c", "sin", "x_1", "c"]);
        let sk = d.decode(&tokens, "temperature", -0.5).unwrap();
        assert_eq!(sk.to_string(), "((c * sin(temperature)) + c)");
        assert_eq!(sk.symbol, "temperature");
        assert_eq!(d.encode(&sk).unwrap(), tokens);
    }

    #[test]
    fn trailing_padding_is_ignored() {
        let d = decoder();
        let mut tokens = ids(&d, &["exp", "x_1"]);
        tokens.extend([0, 0, 0, 0]);
        assert!(d.decode(&tokens, "x", 0.0).is_ok());
    }

    #[test]
    fn failures_are_values() {
        let d = decoder();
        assert!(matches!(d.decode(&[], "x", 0.0), Err(DecodeError::Empty)));
        let start = d.vocabulary().start_id();
        assert!(matches!(
            d.decode(&[start, 9999], "x", 0.0),
            Err(DecodeError::Vocabulary(VocabError::UnknownId(9999)))
        ));
        let truncated = ids(&d, &["add", "x_1"]);
        assert!(matches!(
            d.decode(&truncated, "x", 0.0),
            Err(DecodeError::Grammar(GrammarError::Truncated(_)))
        ));
    }

    #[test]
    fn decode_all_keeps_order() {
        let d = decoder();
        let good = ScoredSequence::new(1.0, ids(&d, &["cos", "x_1"]));
        let bad = ScoredSequence::new(0.5, ids(&d, &["mul", "c"]));
        let report = d.decode_all(&[bad, good.clone(), good], "x");
        assert_eq!(report.skeletons.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, 0);
        assert_eq!(report.n_candidates(), 3);
    }
}
