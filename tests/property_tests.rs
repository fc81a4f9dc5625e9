//! Property-based tests for trueno-trainkit
//!
//! - Run logs mirror any valid run config
//! - Missing identifiers are always rejected
//! - Accuracy metrics stay in [0, 1] and top-5 never trails top-1
//! - Run with ProptestConfig::with_cases(64)

use proptest::prelude::*;
use trueno_trainkit::graph::{Graph, Tensor};
use trueno_trainkit::ops::{create_eval_ops, create_placeholders};
use trueno_trainkit::run::{RunConfig, RunLog};
use trueno_trainkit::session::{session_config, Feed, Session};
use trueno_trainkit::Error;

// ============================================================================
// Strategies
// ============================================================================

fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_\\-./ ]{1,24}"
}

prop_compose! {
    fn arb_run_config()(
        run_name in arb_identifier(),
        dataset in arb_identifier(),
        model in arb_identifier(),
        procedure in arb_identifier(),
        commit in "[0-9a-f]{7,40}",
        rng_seed in any::<i64>(),
        epochs in 0u64..10_000,
        train_batch_size in 1u64..4096,
        test_batch_size in 1u64..4096,
        eval_interval in 1u64..100_000,
        checkpoint_interval in 1u64..100_000,
    ) -> RunConfig {
        RunConfig::builder()
            .run_name(run_name)
            .dataset(dataset)
            .model(model)
            .procedure(procedure)
            .commit(commit)
            .rng_seed(rng_seed)
            .epochs(epochs)
            .train_batch_size(train_batch_size)
            .test_batch_size(test_batch_size)
            .eval_interval(eval_interval)
            .checkpoint_interval(checkpoint_interval)
            .build()
    }
}

/// Predictions `[rows, classes]` with matching one-hot labels.
fn arb_predictions() -> impl Strategy<Value = (Tensor, Tensor)> {
    (1usize..16, 1usize..9).prop_flat_map(|(rows, classes)| {
        (
            proptest::collection::vec(-10.0f32..10.0, rows * classes),
            proptest::collection::vec(0..classes, rows),
        )
            .prop_map(move |(values, labels)| {
                (
                    Tensor::new(vec![rows, classes], values).unwrap(),
                    Tensor::one_hot(&labels, classes).unwrap(),
                )
            })
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every run log field mirrors its config field
    #[test]
    fn prop_run_log_mirrors_config(config in arb_run_config()) {
        let log = RunLog::from_config(&config).unwrap();
        prop_assert_eq!(log.run_name(), config.run_name());
        prop_assert_eq!(log.dataset(), config.dataset());
        prop_assert_eq!(log.model(), config.model());
        prop_assert_eq!(log.train_procedure(), config.procedure());
        prop_assert_eq!(log.commit(), config.commit());
        prop_assert_eq!(log.rng_seed(), config.rng_seed());
        prop_assert_eq!(log.epochs(), config.epochs());
        prop_assert_eq!(log.train_batch_size(), config.train_batch_size());
        prop_assert_eq!(log.test_batch_size(), config.test_batch_size());
        prop_assert_eq!(log.eval_interval(), config.eval_interval());
        prop_assert_eq!(log.checkpoint_interval(), config.checkpoint_interval());
        prop_assert!(log.end_time().is_none());
    }

    /// Property: an empty identifier is always rejected and named
    #[test]
    fn prop_missing_identifier_rejected(config in arb_run_config(), field in 0usize..4) {
        let json = serde_json::to_value(&config).unwrap();
        let name = ["run_name", "dataset", "model", "procedure"][field];
        let mut json = json;
        json[name] = serde_json::json!("");
        let broken: RunConfig = serde_json::from_value(json).unwrap();

        match RunLog::from_config(&broken) {
            Err(Error::MissingRequiredField { fields }) => prop_assert_eq!(fields, vec![name]),
            other => prop_assert!(false, "expected MissingRequiredField, got {:?}", other),
        }
    }

    /// Property: accuracy metrics are fractions and top-5 >= top-1
    #[test]
    fn prop_accuracy_bounds((y, y_) in arb_predictions()) {
        let mut graph = Graph::new();
        let classes = y.shape()[1];
        let (predictions, labels) = create_placeholders(&mut graph, classes, classes);
        let eval = create_eval_ops(&mut graph, predictions, labels).unwrap();

        let mut session = Session::new(&graph, session_config(false));
        let out = session
            .run(
                &[eval.accuracy, eval.top5_accuracy],
                &Feed::new().with(predictions, y).with(labels, y_),
            )
            .unwrap();
        let top1 = out[0].as_scalar().unwrap();
        let top5 = out[1].as_scalar().unwrap();

        prop_assert!((0.0..=1.0).contains(&top1));
        prop_assert!((0.0..=1.0).contains(&top5));
        prop_assert!(top5 >= top1);
        if classes <= 5 {
            prop_assert_eq!(top5, 1.0);
        }
    }
}
