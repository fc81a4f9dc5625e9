//! Reverse-mode gradients for the differentiable operations

use std::collections::HashMap;

use super::{kernels, Fetched};
use crate::graph::{Graph, NodeId, OpKind, Tensor};
use crate::{Error, Result};

fn value<'a>(
    graph: &Graph,
    values: &'a HashMap<NodeId, Fetched>,
    id: NodeId,
) -> Result<&'a Tensor> {
    values
        .get(&id)
        .and_then(Fetched::as_tensor)
        .ok_or_else(|| match graph.node(id) {
            Ok(node) => Error::Graph(format!(
                "`{}` was not evaluated before its gradient",
                node.name()
            )),
            Err(e) => e,
        })
}

fn accumulate(grads: &mut HashMap<NodeId, Tensor>, id: NodeId, grad: Tensor) -> Result<()> {
    match grads.remove(&id) {
        Some(existing) => {
            grads.insert(id, kernels::add(&existing, &grad)?);
        }
        None => {
            grads.insert(id, grad);
        }
    }
    Ok(())
}

/// Gradients of the scalar `loss` with respect to each of `variables`.
///
/// `values` must hold the forward value of every node between `loss` and the
/// variables. Variables the loss does not reach get a zero gradient.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn gradients(
    graph: &Graph,
    loss: NodeId,
    variables: &[NodeId],
    values: &HashMap<NodeId, Fetched>,
) -> Result<Vec<(NodeId, Tensor)>> {
    let mut grads: HashMap<NodeId, Tensor> = HashMap::new();
    grads.insert(loss, Tensor::scalar(1.0));

    // Ids are a topological order, so walking down from the loss visits every
    // consumer before its inputs.
    for index in (0..=loss.index()).rev() {
        let id = NodeId::new(index);
        let Some(grad) = grads.get(&id).cloned() else {
            continue;
        };
        let node = graph.node(id)?;
        let inputs = node.inputs();

        match node.op() {
            OpKind::ReduceMean => {
                let x = value(graph, values, inputs[0])?;
                let g = grad.as_scalar().unwrap_or(0.0) / x.len() as f32;
                accumulate(&mut grads, inputs[0], Tensor::full(x.shape(), g))?;
            }
            OpKind::SoftmaxCrossEntropy => {
                let labels = value(graph, values, inputs[0])?;
                let logits = value(graph, values, inputs[1])?;
                let d_logits = kernels::softmax_cross_entropy_grad(labels, logits, &grad)?;
                accumulate(&mut grads, inputs[1], d_logits)?;
            }
            OpKind::Add => {
                let b = value(graph, values, inputs[1])?;
                let d_b = if b.shape() == grad.shape() {
                    grad.clone()
                } else {
                    kernels::sum_rows(&grad)?
                };
                accumulate(&mut grads, inputs[0], grad)?;
                accumulate(&mut grads, inputs[1], d_b)?;
            }
            OpKind::MatMul => {
                let a = value(graph, values, inputs[0])?;
                let b = value(graph, values, inputs[1])?;
                let d_a = kernels::matmul_transpose_rhs(&grad, b)?;
                let d_b = kernels::matmul_transpose_lhs(a, &grad)?;
                accumulate(&mut grads, inputs[0], d_a)?;
                accumulate(&mut grads, inputs[1], d_b)?;
            }
            _ => {}
        }
    }

    variables
        .iter()
        .map(|&var| {
            let grad = match grads.remove(&var) {
                Some(g) => g,
                None => Tensor::zeros(value(graph, values, var)?.shape()),
            };
            Ok((var, grad))
        })
        .collect()
}
