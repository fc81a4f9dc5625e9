//! Accuracy metrics

use crate::graph::{DType, Graph, NodeId};
use crate::Result;

/// `k` used for the top-k accuracy metric.
pub const TOP_K: usize = 5;

/// Handles returned by [`create_eval_ops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOps {
    /// Fraction of rows whose argmax prediction matches the label
    pub accuracy: NodeId,
    /// Fraction of rows whose label is among the [`TOP_K`] largest predictions
    pub top5_accuracy: NodeId,
}

/// Top-1 and top-5 accuracy of predictions `y` against one-hot labels `y_`.
///
/// Both metrics live under the `eval/` scope. The top-5 metric is the mean
/// of the in-top-k test itself, not of the top-1 correctness mask.
///
/// # Errors
///
/// Returns an error unless `y` and `y_` are compatible `[batch, classes]`
/// `f32` tensors.
pub fn create_eval_ops(graph: &mut Graph, y: NodeId, y_: NodeId) -> Result<EvalOps> {
    graph.with_scope("eval", |g| -> Result<EvalOps> {
        let predicted = g.argmax(y)?;
        let expected = g.argmax(y_)?;
        let correct_prediction = g.equal(predicted, expected)?;
        let correct = g.cast(correct_prediction, DType::F32)?;
        let accuracy = g.reduce_mean(correct)?;

        // One-hot labels: the class index is the position of the 1.
        let correct_top5 = g.in_top_k(y, expected, TOP_K)?;
        let correct_top5 = g.cast(correct_top5, DType::F32)?;
        let top5_accuracy = g.reduce_mean(correct_top5)?;

        Ok(EvalOps {
            accuracy,
            top5_accuracy,
        })
    })
}
