//! Graph fragment tests: placeholders, training, evaluation and summaries.

use trueno_trainkit::graph::{Graph, NodeId, Tensor};
use trueno_trainkit::ops::{
    create_eval_ops, create_keep_probs, create_placeholders, create_summary_ops, create_train_ops,
};
use trueno_trainkit::session::{Feed, Session};
use trueno_trainkit::Error;

/// Softmax regression over `inputs`: returns `(inputs, labels, logits)`.
fn linear_model(graph: &mut Graph, input_size: usize, classes: usize) -> (NodeId, NodeId, NodeId) {
    let (inputs, labels) = create_placeholders(graph, input_size, classes);
    let w = graph.variable("weights", Tensor::zeros(&[input_size, classes]));
    let b = graph.variable("biases", Tensor::zeros(&[classes]));
    let xw = graph.matmul(inputs, w).unwrap();
    let logits = graph.add(xw, b).unwrap();
    (inputs, labels, logits)
}

fn separable_batch() -> (Tensor, Tensor) {
    let x = Tensor::from_rows(&[
        [1.0_f32, 0.0, 0.0, 0.2],
        [0.0, 1.0, 0.0, 0.2],
        [0.0, 0.0, 1.0, 0.2],
        [0.9, 0.1, 0.0, 0.0],
        [0.0, 0.9, 0.1, 0.0],
        [0.1, 0.0, 0.9, 0.0],
    ])
    .unwrap();
    let y = Tensor::one_hot(&[0, 1, 2, 0, 1, 2], 3).unwrap();
    (x, y)
}

// =============================================================================
// Training
// =============================================================================

#[test]
fn test_train_ops_scopes() {
    let mut graph = Graph::new();
    let (_, labels, logits) = linear_model(&mut graph, 4, 3);
    let train = create_train_ops(&mut graph, logits, labels).unwrap();

    assert_eq!(graph.by_name("xent/Mean"), Some(train.loss));
    assert!(graph.by_name("xent/sftmax_xent").is_some());
    assert_eq!(graph.by_name("opt/Adam"), Some(train.train_step));
}

#[test]
fn test_training_lowers_loss() {
    let mut graph = Graph::new();
    let (inputs, labels, logits) = linear_model(&mut graph, 4, 3);
    let train = create_train_ops(&mut graph, logits, labels).unwrap();
    let eval = create_eval_ops(&mut graph, logits, labels).unwrap();

    let (x, y) = separable_batch();
    let feed = Feed::new().with(inputs, x).with(labels, y);
    let mut session = Session::new(&graph, None);

    let initial = session.run(&[train.loss], &feed).unwrap()[0].as_scalar().unwrap();
    assert!((initial - 3.0_f32.ln()).abs() < 1e-5, "zero weights give uniform softmax");

    for _ in 0..50 {
        session.run(&[train.train_step], &feed).unwrap();
    }

    let out = session
        .run(&[train.loss, eval.accuracy, eval.top5_accuracy], &feed)
        .unwrap();
    let loss = out[0].as_scalar().unwrap();
    assert!(loss < initial, "loss {loss} did not drop below {initial}");
    assert_eq!(out[1].as_scalar(), Some(1.0));
    // Three classes: every label is always within the top five.
    assert_eq!(out[2].as_scalar(), Some(1.0));
}

#[test]
fn test_fetched_loss_precedes_step() {
    let mut graph = Graph::new();
    let (inputs, labels, logits) = linear_model(&mut graph, 4, 3);
    let train = create_train_ops(&mut graph, logits, labels).unwrap();

    let (x, y) = separable_batch();
    let feed = Feed::new().with(inputs, x).with(labels, y);
    let mut session = Session::new(&graph, None);

    let first = session.run(&[train.train_step, train.loss], &feed).unwrap();
    let before_step = first[1].as_scalar().unwrap();
    assert!((before_step - 3.0_f32.ln()).abs() < 1e-5);
    let second = session.run(&[train.loss], &feed).unwrap();
    assert!(second[0].as_scalar().unwrap() < before_step);
}

#[test]
fn test_sessions_train_independently() {
    let mut graph = Graph::new();
    let (inputs, labels, logits) = linear_model(&mut graph, 4, 3);
    let train = create_train_ops(&mut graph, logits, labels).unwrap();
    let weights = graph.by_name("weights").unwrap();

    let (x, y) = separable_batch();
    let feed = Feed::new().with(inputs, x).with(labels, y);

    let mut trained = Session::new(&graph, None);
    trained.run(&[train.train_step], &feed).unwrap();
    let fresh = Session::new(&graph, None);

    assert_ne!(trained.variable(weights), fresh.variable(weights));
    assert_eq!(fresh.variable(weights), Some(&Tensor::zeros(&[4, 3])));
}

#[test]
fn test_train_ops_reject_mismatched_labels() {
    let mut graph = Graph::new();
    let (_, _, logits) = linear_model(&mut graph, 4, 3);
    let (_, wrong_labels) = create_placeholders(&mut graph, 4, 5);
    assert!(matches!(
        create_train_ops(&mut graph, logits, wrong_labels),
        Err(Error::ShapeMismatch { .. })
    ));
}

// =============================================================================
// Evaluation
// =============================================================================

#[test]
fn test_top5_differs_from_top1() {
    let mut graph = Graph::new();
    let (predictions, labels) = create_placeholders(&mut graph, 6, 6);
    let eval = create_eval_ops(&mut graph, predictions, labels).unwrap();

    let y = Tensor::from_rows(&[
        [0.6_f32, 0.1, 0.1, 0.1, 0.05, 0.05], // label 0: top-1 hit
        [0.5, 0.2, 0.1, 0.1, 0.07, 0.03],     // label 5: ranked last, miss
        [0.3, 0.4, 0.1, 0.1, 0.05, 0.05],     // label 0: second, top-5 only
        [0.1, 0.1, 0.1, 0.1, 0.1, 0.5],       // label 5: top-1 hit
    ])
    .unwrap();
    let y_ = Tensor::one_hot(&[0, 5, 0, 5], 6).unwrap();

    let mut session = Session::new(&graph, None);
    let out = session
        .run(
            &[eval.accuracy, eval.top5_accuracy],
            &Feed::new().with(predictions, y).with(labels, y_),
        )
        .unwrap();

    assert_eq!(out[0].as_scalar(), Some(0.5));
    assert_eq!(out[1].as_scalar(), Some(0.75));
}

#[test]
fn test_eval_ops_scoped() {
    let mut graph = Graph::new();
    let (predictions, labels) = create_placeholders(&mut graph, 6, 6);
    let eval = create_eval_ops(&mut graph, predictions, labels).unwrap();

    let accuracy = graph.node(eval.accuracy).unwrap();
    let top5 = graph.node(eval.top5_accuracy).unwrap();
    assert!(accuracy.name().starts_with("eval/"));
    assert!(top5.name().starts_with("eval/"));
    assert_ne!(accuracy.name(), top5.name());
    assert!(graph.by_name("eval/InTopK").is_some());
}

// =============================================================================
// Summaries
// =============================================================================

#[test]
fn test_summary_ops_merge_all() {
    let mut graph = Graph::new();
    let loss = graph.constant("loss_value", Tensor::scalar(0.25));
    let accuracy = graph.constant("acc_value", Tensor::scalar(0.9));
    let top5 = graph.constant("top5_value", Tensor::scalar(0.99));

    let merged = create_summary_ops(&mut graph, loss, accuracy, top5).unwrap();
    assert_eq!(graph.summaries().len(), 3);

    let mut session = Session::new(&graph, None);
    let out = session.run(&[merged], &Feed::new()).unwrap();
    let summary = out[0].as_summary().unwrap();

    let tags: Vec<&str> = summary.values().iter().map(|v| v.tag.as_str()).collect();
    assert_eq!(tags, vec!["loss", "accuracy", "top5 accuracy"]);
    assert_eq!(summary.get("top5 accuracy"), Some(0.99));
}

#[test]
fn test_summary_merge_includes_earlier_summaries() {
    let mut graph = Graph::new();
    let lr = graph.constant("lr", Tensor::scalar(0.001));
    graph.scalar_summary("learning_rate", lr).unwrap();

    let v = graph.constant("v", Tensor::scalar(1.0));
    let merged = create_summary_ops(&mut graph, v, v, v).unwrap();

    let mut session = Session::new(&graph, None);
    let out = session.run(&[merged], &Feed::new()).unwrap();
    let summary = out[0].as_summary().unwrap();
    assert_eq!(summary.values().len(), 4);
    assert_eq!(summary.get("learning_rate"), Some(0.001));
}

#[test]
fn test_summaries_are_per_graph() {
    let mut first = Graph::new();
    let v = first.constant("v", Tensor::scalar(1.0));
    create_summary_ops(&mut first, v, v, v).unwrap();

    let mut second = Graph::new();
    assert!(second.merge_all_summaries().is_none());
    assert!(second.summaries().is_empty());
}

#[test]
fn test_summary_rejects_non_scalar() {
    let mut graph = Graph::new();
    let (inputs, _) = create_placeholders(&mut graph, 2, 2);
    let v = graph.constant("v", Tensor::scalar(1.0));
    assert!(create_summary_ops(&mut graph, inputs, v, v).is_err());
}

// =============================================================================
// Placeholders
// =============================================================================

#[test]
fn test_keep_probs_fed_as_scalars() {
    let mut graph = Graph::new();
    let (keep_input, keep) = create_keep_probs(&mut graph);
    let mut session = Session::new(&graph, None);

    let out = session
        .run(
            &[keep_input, keep],
            &Feed::new()
                .with(keep_input, Tensor::scalar(0.8))
                .with(keep, Tensor::scalar(0.5)),
        )
        .unwrap();
    assert_eq!(out[0].as_scalar(), Some(0.8));
    assert_eq!(out[1].as_scalar(), Some(0.5));
}

#[test]
fn test_placeholders_accept_any_batch() {
    let mut graph = Graph::new();
    let (inputs, _) = create_placeholders(&mut graph, 3, 2);
    let mut session = Session::new(&graph, None);

    for batch in [1, 7, 64] {
        let out = session
            .run(&[inputs], &Feed::new().with(inputs, Tensor::zeros(&[batch, 3])))
            .unwrap();
        assert_eq!(out[0].as_tensor().unwrap().shape(), &[batch, 3]);
    }
}
