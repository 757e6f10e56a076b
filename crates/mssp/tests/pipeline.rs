//! End-to-end inference: sampling, normalization, scripted model, decoding
//! and coefficient-fit selection.

use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::ArrayView1;

use mssp::expr::Vocabulary;
use mssp::inference::{RegressorConfig, RegressorError, SelectorParams};
use mssp::model::ScoredSequence;
use mssp::sampling::{FnSurrogate, SamplerParams};
use mssp::testing::{random_problem, ScriptedModel};
use mssp::training::Verbosity;
use mssp::{SymbolicRegressor, Variable};

fn candidate(vocab: &Vocabulary, words: &[&str], score: f64) -> ScoredSequence {
    ScoredSequence::new(score, vocab.encode(words).unwrap())
}

fn config(n_sets: usize, n_samples: usize) -> RegressorConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    RegressorConfig::builder()
        .sampler(SamplerParams {
            n_sets,
            n_samples,
            ..Default::default()
        })
        .selector(SelectorParams {
            max_iterations: 150,
            ..Default::default()
        })
        .seed(11)
        .verbosity(Verbosity::Debug)
        .build()
        .unwrap()
}

fn target(row: ArrayView1<f64>) -> f64 {
    2.0 * row[0].sin() + row[1] * row[1]
}

#[test]
fn picks_the_skeleton_that_fits_each_variable() {
    let vocab = Arc::new(Vocabulary::skeleton_default());
    let candidates = vec![
        candidate(&vocab, &["add", "c", "mul", "c", "sin", "x_1"], -0.1),
        candidate(&vocab, &["add", "c", "pow", "x_1", "2"], -0.3),
    ];
    let variables = vec![Variable::continuous("x0", 1.0, 5.0), Variable::continuous("x1", 1.0, 5.0)];
    let problem = random_problem("two", variables, 50, 3, target);

    let model = ScriptedModel::new(candidates);
    let surrogate = FnSurrogate::new(2, target);
    let regressor = SymbolicRegressor::new(config(4, 200), model, Some(surrogate), vocab);
    let skeletons = regressor.predict_skeletons(&problem).unwrap();

    assert_eq!(skeletons.len(), 2);
    let first = skeletons.get(0).unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(first.skeleton.to_string(), "(c + (c * sin(x0)))");
    let second = skeletons.get(1).unwrap();
    assert_eq!(second.index, 1);
    assert_eq!(second.skeleton.to_string(), "(c + (x1 ** 2))");
    assert!(second.fit.as_ref().unwrap().error < 0.05);

    for (index, outcome) in skeletons.iter() {
        assert_eq!(outcome.symbol, format!("x{index}"));
        assert_eq!(outcome.n_candidates, 2);
        assert_eq!(outcome.n_decoded, 2);
        let vars = outcome.selected.as_ref().unwrap().skeleton.expr.variables();
        assert_eq!(vars.into_iter().collect::<Vec<_>>(), vec![format!("x{index}")]);
    }

    let shapes = regressor.model().seen_shapes();
    assert_eq!(shapes, vec![vec![1, 200, 2, 4], vec![1, 200, 2, 4]]);
}

#[test]
fn undecodable_candidates_are_dropped_individually() {
    let vocab = Arc::new(Vocabulary::skeleton_default());
    let good = candidate(&vocab, &["mul", "c", "x_1"], 0.0);
    let truncated = candidate(&vocab, &["add", "c"], 0.0);
    let unknown = ScoredSequence::new(0.0, vec![1, 9999, 2]);
    let empty = ScoredSequence::new(0.0, vec![1, 2]);

    let mut candidates = vec![good; 9];
    candidates.insert(2, truncated);
    candidates.insert(5, unknown);
    candidates.push(empty);
    assert_eq!(candidates.len(), 12);

    let variables = vec![Variable::continuous("t", -2.0, 2.0)];
    let problem = random_problem("one", variables, 80, 5, |row| 3.0 * row[0]);
    let regressor = SymbolicRegressor::new(
        config(3, 80),
        ScriptedModel::new(candidates),
        None::<FnSurrogate<fn(ArrayView1<f64>) -> f64>>,
        vocab,
    );

    let skeletons = regressor.predict_skeletons(&problem).unwrap();
    let outcome = skeletons.outcome(0).unwrap();
    assert_eq!(outcome.n_candidates, 12);
    assert_eq!(outcome.n_decoded, 9);
    let selected = outcome.selected.as_ref().unwrap();
    assert_eq!(selected.skeleton.to_string(), "(c * t)");
    let fit = selected.fit.as_ref().unwrap();
    assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 0.1);
}

#[test]
fn no_decodable_candidate_yields_no_skeleton() {
    let vocab = Arc::new(Vocabulary::skeleton_default());
    let candidates = vec![ScoredSequence::new(0.0, vec![1, 5, 2]), ScoredSequence::new(0.0, vec![1])];
    let variables = vec![Variable::continuous("t", 0.0, 1.0)];
    let problem = random_problem("one", variables, 20, 1, |row| row[0].exp());
    let regressor = SymbolicRegressor::new(
        config(2, 20),
        ScriptedModel::new(candidates),
        None::<FnSurrogate<fn(ArrayView1<f64>) -> f64>>,
        vocab,
    );

    let skeletons = regressor.predict_skeletons(&problem).unwrap();
    assert_eq!(skeletons.len(), 1);
    assert!(skeletons.get(0).is_none());
    assert_eq!(skeletons.outcome(0).unwrap().n_decoded, 0);
}

#[test]
fn single_variable_replicates_observed_data() {
    let vocab = Arc::new(Vocabulary::skeleton_default());
    let variables = vec![Variable::continuous("t", -1.0, 1.0)];
    let problem = random_problem("one", variables, 30, 2, |row| row[0] * row[0]);
    let regressor = SymbolicRegressor::new(
        config(5, 100),
        ScriptedModel::new(vec![candidate(&vocab, &["pow", "x_1", "2"], 0.0)]),
        None::<FnSurrogate<fn(ArrayView1<f64>) -> f64>>,
        vocab,
    );

    let skeletons = regressor.predict_skeletons(&problem).unwrap();
    // fewer observations than `n_samples`: every set holds all 30 rows
    assert_eq!(regressor.model().seen_shapes(), vec![vec![1, 30, 2, 5]]);
    let fit = skeletons.get(0).unwrap().fit.as_ref().unwrap();
    assert!(fit.error < 1e-9);
}

#[test]
fn large_single_variable_dataset_is_subsampled_to_n_samples() {
    let vocab = Arc::new(Vocabulary::skeleton_default());
    let variables = vec![Variable::continuous("t", -1.0, 1.0)];
    let problem = random_problem("one", variables, 250, 4, |row| row[0] * row[0]);
    let regressor = SymbolicRegressor::new(
        config(4, 100),
        ScriptedModel::new(vec![candidate(&vocab, &["pow", "x_1", "2"], 0.0)]),
        None::<FnSurrogate<fn(ArrayView1<f64>) -> f64>>,
        vocab,
    );

    let skeletons = regressor.predict_skeletons(&problem).unwrap();
    assert_eq!(regressor.model().seen_shapes(), vec![vec![1, 100, 2, 4]]);
    let fit = skeletons.get(0).unwrap().fit.as_ref().unwrap();
    assert!(fit.error < 1e-9);
}

#[test]
fn several_variables_require_a_surrogate() {
    let vocab = Arc::new(Vocabulary::skeleton_default());
    let variables = vec![Variable::continuous("a", 0.0, 1.0), Variable::continuous("b", 0.0, 1.0)];
    let problem = random_problem("two", variables, 10, 0, |row| row[0] + row[1]);
    let regressor = SymbolicRegressor::new(
        config(2, 20),
        ScriptedModel::new(vec![candidate(&vocab, &["x_1"], 0.0)]),
        None::<FnSurrogate<fn(ArrayView1<f64>) -> f64>>,
        vocab,
    );

    let err = regressor.predict_skeletons(&problem).unwrap_err();
    assert!(matches!(err, RegressorError::MissingSurrogate { n_features: 2 }));
    assert!(regressor.model().seen_shapes().is_empty());
}
