//! Input placeholders

use crate::graph::{DType, Graph, NodeId, Shape};

/// Scalar keep probabilities for input-layer and hidden-layer dropout.
///
/// Returns `(keep_prob_input, keep_prob)`.
pub fn create_keep_probs(graph: &mut Graph) -> (NodeId, NodeId) {
    let keep_prob_input = graph.placeholder("keep_prob_input", DType::F32, Shape::scalar());
    let keep_prob = graph.placeholder("keep_prob", DType::F32, Shape::scalar());
    (keep_prob_input, keep_prob)
}

/// Batched input and label placeholders.
///
/// Returns `(inputs, outputs)` shaped `[?, input_size]` and `[?, output_size]`.
pub fn create_placeholders(
    graph: &mut Graph,
    input_size: usize,
    output_size: usize,
) -> (NodeId, NodeId) {
    let inputs = graph.placeholder("inputs", DType::F32, Shape::batch_of(input_size));
    let outputs = graph.placeholder("outputs", DType::F32, Shape::batch_of(output_size));
    (inputs, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_names_and_shapes() {
        let mut graph = Graph::new();
        let (inp, out) = create_placeholders(&mut graph, 784, 10);
        let inp = graph.node(inp).unwrap();
        let out = graph.node(out).unwrap();
        assert_eq!(inp.name(), "inputs");
        assert_eq!(inp.shape(), &Shape::new(vec![None, Some(784)]));
        assert_eq!(out.name(), "outputs");
        assert_eq!(out.shape(), &Shape::new(vec![None, Some(10)]));
    }

    #[test]
    fn test_keep_probs_are_scalars() {
        let mut graph = Graph::new();
        let (input_keep, keep) = create_keep_probs(&mut graph);
        assert_eq!(graph.node(input_keep).unwrap().name(), "keep_prob_input");
        assert_eq!(graph.node(keep).unwrap().name(), "keep_prob");
        assert_eq!(graph.node(keep).unwrap().shape(), &Shape::scalar());
    }
}
