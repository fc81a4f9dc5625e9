//! Training summaries

use crate::graph::{Graph, NodeId};
use crate::{Error, Result};

/// Scalar summaries tagged `loss`, `accuracy` and `top5 accuracy`.
///
/// Returns a merged handle over every summary registered in `graph`, which
/// includes any created before this call.
///
/// # Errors
///
/// Returns an error unless all three inputs are scalar `f32` nodes.
pub fn create_summary_ops(
    graph: &mut Graph,
    loss: NodeId,
    accuracy: NodeId,
    top5: NodeId,
) -> Result<NodeId> {
    graph.scalar_summary("loss", loss)?;
    graph.scalar_summary("accuracy", accuracy)?;
    graph.scalar_summary("top5 accuracy", top5)?;
    graph
        .merge_all_summaries()
        .ok_or_else(|| Error::Graph("no summaries registered".into()))
}
