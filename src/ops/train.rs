//! Loss and optimizer

use crate::graph::{AdamConfig, Graph, NodeId};
use crate::Result;

/// Handles returned by [`create_train_ops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainOps {
    /// Mean softmax cross-entropy over the batch
    pub loss: NodeId,
    /// One Adam step on every variable the loss depends on
    pub train_step: NodeId,
}

/// Mean softmax cross-entropy of `logits` against one-hot `labels`, and an
/// Adam step (default hyperparameters) minimizing it.
///
/// The loss lives under the `xent/` scope and the optimizer under `opt/`.
///
/// # Errors
///
/// Returns an error if `logits` and `labels` are not compatible `[batch,
/// classes]` tensors, or if the logits do not depend on any variable.
pub fn create_train_ops(graph: &mut Graph, logits: NodeId, labels: NodeId) -> Result<TrainOps> {
    let loss = graph.with_scope("xent", |g| -> Result<NodeId> {
        let xent = g.softmax_cross_entropy("sftmax_xent", labels, logits)?;
        g.reduce_mean(xent)
    })?;

    let train_step = graph.with_scope("opt", |g| g.minimize(loss, AdamConfig::default()))?;

    Ok(TrainOps { loss, train_step })
}
