//! Token sequences to skeletons and back.

use std::sync::Arc;

use proptest::prelude::*;

use mssp::expr::{BinaryOp, Expr, UnaryOp, Vocabulary, PLACEHOLDER_VARIABLE};
use mssp::inference::{DecodeError, SkeletonDecoder};
use mssp::model::ScoredSequence;

fn skeleton_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        Just(Expr::Coefficient),
        Just(Expr::var(PLACEHOLDER_VARIABLE)),
        (-5i64..=5).prop_map(Expr::Integer),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (prop::sample::select(UnaryOp::ALL.to_vec()), inner.clone()).prop_map(|(op, a)| Expr::unary(op, a)),
            (prop::sample::select(BinaryOp::ALL.to_vec()), inner.clone(), inner)
                .prop_map(|(op, a, b)| Expr::binary(op, a, b)),
        ]
    })
}

fn decoder() -> SkeletonDecoder {
    SkeletonDecoder::new(Arc::new(Vocabulary::skeleton_default()))
}

proptest! {
    #[test]
    fn decoding_an_encoded_skeleton_recovers_it(expr in skeleton_strategy()) {
        let decoder = decoder();
        let tokens = decoder.vocabulary().encode(&expr.to_prefix()).unwrap();

        let skeleton = decoder.decode(&tokens, "pressure", 0.5).unwrap();
        prop_assert_eq!(&skeleton.expr, &expr.substitute_variable(PLACEHOLDER_VARIABLE, "pressure"));
        prop_assert_eq!(&skeleton.symbol, "pressure");
        prop_assert_eq!(decoder.encode(&skeleton).unwrap(), tokens);
    }
}

#[test]
fn tokens_after_finish_are_ignored() {
    let decoder = decoder();
    let vocab = decoder.vocabulary();
    let mut tokens = vocab.encode(&["exp", "x_1"]).unwrap();
    tokens.extend([vocab.id("sin").unwrap(), 0, 0]);

    let skeleton = decoder.decode(&tokens, "t", 0.0).unwrap();
    assert_eq!(skeleton.to_string(), "exp(t)");
}

#[test]
fn failures_are_reported_per_candidate() {
    let decoder = decoder();
    let vocab = decoder.vocabulary();
    let candidates = vec![
        ScoredSequence::new(-1.0, vocab.encode(&["mul", "c", "x_1"]).unwrap()),
        ScoredSequence::new(-2.0, vec![vocab.start_id(), 4242, vocab.finish_id()]),
        ScoredSequence::new(-3.0, vocab.encode(&["div", "x_1"]).unwrap()),
        ScoredSequence::new(-4.0, vocab.encode(&["x_1", "c"]).unwrap()),
        ScoredSequence::new(-5.0, Vec::new()),
        ScoredSequence::new(-6.0, vocab.encode(&["cos", "x_1"]).unwrap()),
    ];

    let report = decoder.decode_all(&candidates, "t");
    assert_eq!(report.n_candidates(), 6);
    let decoded: Vec<String> = report.skeletons.iter().map(|s| s.to_string()).collect();
    assert_eq!(decoded, vec!["(c * t)", "cos(t)"]);
    assert_eq!(report.skeletons[1].score, -6.0);

    let failed: Vec<usize> = report.failures.iter().map(|(i, _)| *i).collect();
    assert_eq!(failed, vec![1, 2, 3, 4]);
    assert!(matches!(report.failures[0].1, DecodeError::Vocabulary(_)));
    assert!(matches!(report.failures[1].1, DecodeError::Grammar(_)));
    assert!(matches!(report.failures[2].1, DecodeError::Grammar(_)));
    assert!(matches!(report.failures[3].1, DecodeError::Empty));
}
