//! Computation graph construction
//!
//! A [`Graph`] is an explicit, append-only context: every constructor takes
//! `&mut Graph` and returns a [`NodeId`] handle. Nothing is registered in
//! process-wide state, so two graphs never see each other's nodes or
//! summaries.
//!
//! ## Node Ordering
//!
//! Inputs must exist before a node that consumes them is added, so node ids
//! are always a topological order. Evaluation and gradient passes rely on
//! this.
//!
//! ## Naming
//!
//! Node names are unique within a graph. A clashing name gets a `_1`, `_2`,
//! ... suffix, and [`Graph::with_scope`] prefixes names with `scope/`.

mod optimizer;
mod shape;
mod tensor;

pub use optimizer::AdamConfig;
pub use shape::Shape;
pub use tensor::Tensor;

use std::collections::{HashMap, HashSet};

use crate::{Error, Result};

/// Element type of a node's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit float
    F32,
    /// Integer index (class ids)
    I64,
    /// Boolean mask
    Bool,
    /// Serialized summary
    String,
}

/// Handle to a node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the node in its graph.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Operation performed by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// Input bound at run time
    Placeholder,
    /// Fixed value
    Constant(Tensor),
    /// Trainable value with its initial contents
    Variable(Tensor),
    /// `[m, k] x [k, n] -> [m, n]`
    MatMul,
    /// Elementwise add; a rank-1 right operand is broadcast over rows
    Add,
    /// Per-row softmax cross-entropy of `(labels, logits)`
    SoftmaxCrossEntropy,
    /// Mean over all elements
    ReduceMean,
    /// Index of the largest value in each row
    ArgMax,
    /// Elementwise equality
    Equal,
    /// Type conversion
    Cast,
    /// Whether each row's target class is among its `k` largest predictions
    InTopK {
        /// Number of top predictions that count as a hit
        k: usize,
    },
    /// Scalar summary value
    ScalarSummary {
        /// Tag shown by monitoring tools
        tag: String,
    },
    /// Concatenation of summaries
    MergeSummary,
    /// One Adam step on `variables` towards a lower value of the input loss
    Minimize {
        /// Optimizer hyperparameters
        optimizer: AdamConfig,
        /// Variables updated by the step
        variables: Vec<NodeId>,
    },
}

impl OpKind {
    /// Short operation name, also used as the default node name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Placeholder => "Placeholder",
            Self::Constant(_) => "Const",
            Self::Variable(_) => "Variable",
            Self::MatMul => "MatMul",
            Self::Add => "Add",
            Self::SoftmaxCrossEntropy => "SoftmaxCrossEntropyWithLogits",
            Self::ReduceMean => "Mean",
            Self::ArgMax => "ArgMax",
            Self::Equal => "Equal",
            Self::Cast => "Cast",
            Self::InTopK { .. } => "InTopK",
            Self::ScalarSummary { .. } => "ScalarSummary",
            Self::MergeSummary => "MergeSummary",
            Self::Minimize { .. } => "Adam",
        }
    }
}

/// A node: operation, inputs, and static output type.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    op: OpKind,
    inputs: Vec<NodeId>,
    dtype: DType,
    shape: Shape,
}

impl Node {
    /// Unique name within the graph.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation.
    #[must_use]
    pub const fn op(&self) -> &OpKind {
        &self.op
    }

    /// Input handles, in operand order.
    #[must_use]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Output element type.
    #[must_use]
    pub const fn dtype(&self) -> DType {
        self.dtype
    }

    /// Static output shape.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Explicit computation-graph context.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
    scopes: Vec<String>,
    summaries: Vec<NodeId>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if `id` does not belong to this graph.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::Graph(format!("node #{} is not in this graph", id.0)))
    }

    /// Find a node by its full (scoped) name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Summaries registered so far, in creation order.
    #[must_use]
    pub fn summaries(&self) -> &[NodeId] {
        &self.summaries
    }

    /// Run `build` with `scope` pushed onto the name scope stack.
    pub fn with_scope<T>(&mut self, scope: &str, build: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(scope.to_string());
        let out = build(self);
        self.scopes.pop();
        out
    }

    fn unique_name(&self, base: &str) -> String {
        let mut full = String::new();
        for scope in &self.scopes {
            full.push_str(scope);
            full.push('/');
        }
        full.push_str(base);

        let mut candidate = full.clone();
        let mut suffix = 0;
        while self.by_name.contains_key(&candidate) {
            suffix += 1;
            candidate = format!("{full}_{suffix}");
        }
        candidate
    }

    fn push(
        &mut self,
        name: Option<&str>,
        op: OpKind,
        inputs: Vec<NodeId>,
        dtype: DType,
        shape: Shape,
    ) -> NodeId {
        let name = self.unique_name(name.unwrap_or_else(|| op.name()));
        let id = NodeId(self.nodes.len());
        tracing::trace!(node = %name, op = op.name(), shape = %shape, "add node");
        self.by_name.insert(name.clone(), id);
        self.nodes.push(Node {
            name,
            op,
            inputs,
            dtype,
            shape,
        });
        id
    }

    fn expect_dtype(&self, op: &str, id: NodeId, dtype: DType) -> Result<&Node> {
        let node = self.node(id)?;
        if node.dtype == dtype {
            Ok(node)
        } else {
            Err(Error::Graph(format!(
                "{op} expects {dtype:?} input, `{}` is {:?}",
                node.name, node.dtype
            )))
        }
    }

    fn expect_rank(op: &str, node: &Node, rank: usize) -> Result<()> {
        if node.shape.rank() == rank {
            Ok(())
        } else {
            Err(Error::shape_mismatch(
                op,
                format!("rank {rank}"),
                format!("`{}` {}", node.name, node.shape),
            ))
        }
    }

    fn merge_shapes(op: &str, a: &Node, b: &Node) -> Result<Shape> {
        a.shape
            .merge(&b.shape)
            .ok_or_else(|| Error::shape_mismatch(op, &a.shape, &b.shape))
    }

    /// Add an input slot bound at run time.
    pub fn placeholder(&mut self, name: &str, dtype: DType, shape: Shape) -> NodeId {
        self.push(Some(name), OpKind::Placeholder, Vec::new(), dtype, shape)
    }

    /// Add a fixed `f32` value.
    pub fn constant(&mut self, name: &str, value: Tensor) -> NodeId {
        let shape = Shape::known(value.shape());
        self.push(Some(name), OpKind::Constant(value), Vec::new(), DType::F32, shape)
    }

    /// Add a trainable `f32` value starting at `init`.
    pub fn variable(&mut self, name: &str, init: Tensor) -> NodeId {
        let shape = Shape::known(init.shape());
        self.push(Some(name), OpKind::Variable(init), Vec::new(), DType::F32, shape)
    }

    /// Matrix product `a x b`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] unless `a` is `[m, k]` and `b` is `[k, n]`.
    pub fn matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let lhs = self.expect_dtype("MatMul", a, DType::F32)?;
        let rhs = self.expect_dtype("MatMul", b, DType::F32)?;
        Self::expect_rank("MatMul", lhs, 2)?;
        Self::expect_rank("MatMul", rhs, 2)?;
        if let (Some(k1), Some(k2)) = (lhs.shape.dim(1), rhs.shape.dim(0)) {
            if k1 != k2 {
                return Err(Error::shape_mismatch("MatMul", &lhs.shape, &rhs.shape));
            }
        }
        let shape = Shape::new(vec![lhs.shape.dims()[0], rhs.shape.dims()[1]]);
        Ok(self.push(None, OpKind::MatMul, vec![a, b], DType::F32, shape))
    }

    /// Elementwise `a + b`; a rank-1 `b` is added to every row of a rank-2 `a`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes are not compatible.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let lhs = self.expect_dtype("Add", a, DType::F32)?;
        let rhs = self.expect_dtype("Add", b, DType::F32)?;
        let shape = if lhs.shape.rank() == 2 && rhs.shape.rank() == 1 {
            match (lhs.shape.dim(1), rhs.shape.dim(0)) {
                (Some(x), Some(y)) if x != y => {
                    return Err(Error::shape_mismatch("Add", &lhs.shape, &rhs.shape));
                }
                (cols, bias) => Shape::new(vec![lhs.shape.dims()[0], cols.or(bias)]),
            }
        } else {
            Self::merge_shapes("Add", lhs, rhs)?
        };
        Ok(self.push(None, OpKind::Add, vec![a, b], DType::F32, shape))
    }

    /// Per-row softmax cross-entropy between one-hot `labels` and `logits`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] unless both are rank 2 and compatible.
    pub fn softmax_cross_entropy(
        &mut self,
        name: &str,
        labels: NodeId,
        logits: NodeId,
    ) -> Result<NodeId> {
        let op = "SoftmaxCrossEntropyWithLogits";
        let lab = self.expect_dtype(op, labels, DType::F32)?;
        let log = self.expect_dtype(op, logits, DType::F32)?;
        Self::expect_rank(op, lab, 2)?;
        let merged = Self::merge_shapes(op, lab, log)?;
        let shape = Shape::new(vec![merged.dims()[0]]);
        Ok(self.push(
            Some(name),
            OpKind::SoftmaxCrossEntropy,
            vec![labels, logits],
            DType::F32,
            shape,
        ))
    }

    /// Mean of every element of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if `x` is not `f32`.
    pub fn reduce_mean(&mut self, x: NodeId) -> Result<NodeId> {
        self.expect_dtype("Mean", x, DType::F32)?;
        Ok(self.push(None, OpKind::ReduceMean, vec![x], DType::F32, Shape::scalar()))
    }

    /// Index of the largest value in each row of a rank-2 `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] unless `x` is rank 2.
    pub fn argmax(&mut self, x: NodeId) -> Result<NodeId> {
        let node = self.expect_dtype("ArgMax", x, DType::F32)?;
        Self::expect_rank("ArgMax", node, 2)?;
        let shape = Shape::new(vec![node.shape.dims()[0]]);
        Ok(self.push(None, OpKind::ArgMax, vec![x], DType::I64, shape))
    }

    /// Elementwise equality of two same-typed nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the types differ or the shapes are incompatible.
    pub fn equal(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let lhs = self.node(a)?;
        let rhs = self.expect_dtype("Equal", b, lhs.dtype)?;
        let shape = Self::merge_shapes("Equal", lhs, rhs)?;
        Ok(self.push(None, OpKind::Equal, vec![a, b], DType::Bool, shape))
    }

    /// Convert `x` to `dtype`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if `x` is a summary.
    pub fn cast(&mut self, x: NodeId, dtype: DType) -> Result<NodeId> {
        let node = self.node(x)?;
        if node.dtype == DType::String || dtype == DType::String {
            return Err(Error::Graph("Cast does not convert summaries".into()));
        }
        let shape = node.shape.clone();
        Ok(self.push(None, OpKind::Cast, vec![x], dtype, shape))
    }

    /// Whether each row's `targets` class is among the `k` largest `predictions`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `predictions` is `[m, n]` `f32` and `targets`
    /// is `[m]` `I64`, or if `k` is zero.
    pub fn in_top_k(&mut self, predictions: NodeId, targets: NodeId, k: usize) -> Result<NodeId> {
        if k == 0 {
            return Err(Error::InvalidInput("in_top_k needs k >= 1".into()));
        }
        let pred = self.expect_dtype("InTopK", predictions, DType::F32)?;
        let tgt = self.expect_dtype("InTopK", targets, DType::I64)?;
        Self::expect_rank("InTopK", pred, 2)?;
        Self::expect_rank("InTopK", tgt, 1)?;
        let batch = Shape::new(vec![pred.shape.dims()[0]])
            .merge(&tgt.shape)
            .ok_or_else(|| Error::shape_mismatch("InTopK", &pred.shape, &tgt.shape))?;
        Ok(self.push(
            None,
            OpKind::InTopK { k },
            vec![predictions, targets],
            DType::Bool,
            batch,
        ))
    }

    /// Register a scalar summary of `value` under `tag`.
    ///
    /// The node name is the tag with characters outside `[A-Za-z0-9_./-]`
    /// replaced by `_`; the tag itself is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error unless `value` is a scalar `f32`.
    pub fn scalar_summary(&mut self, tag: &str, value: NodeId) -> Result<NodeId> {
        let node = self.expect_dtype("ScalarSummary", value, DType::F32)?;
        Self::expect_rank("ScalarSummary", node, 0)?;
        let name: String = tag
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let id = self.push(
            Some(name.as_str()),
            OpKind::ScalarSummary {
                tag: tag.to_string(),
            },
            vec![value],
            DType::String,
            Shape::scalar(),
        );
        self.summaries.push(id);
        Ok(id)
    }

    /// Merge every summary registered in this graph so far.
    ///
    /// Returns `None` when the graph has no summaries.
    pub fn merge_all_summaries(&mut self) -> Option<NodeId> {
        if self.summaries.is_empty() {
            return None;
        }
        let inputs = self.summaries.clone();
        Some(self.push(
            None,
            OpKind::MergeSummary,
            inputs,
            DType::String,
            Shape::scalar(),
        ))
    }

    /// Add an Adam step that lowers the scalar `loss`.
    ///
    /// The step updates every variable `loss` depends on through
    /// differentiable operations.
    ///
    /// # Errors
    ///
    /// Returns an error unless `loss` is a scalar `f32` that depends on at
    /// least one variable.
    pub fn minimize(&mut self, loss: NodeId, optimizer: AdamConfig) -> Result<NodeId> {
        let node = self.expect_dtype("Adam", loss, DType::F32)?;
        Self::expect_rank("Adam", node, 0)?;
        let variables = self.trainable_dependencies(loss);
        if variables.is_empty() {
            return Err(Error::Graph(format!(
                "No gradients provided for any variable: `{}` does not depend on a variable",
                node.name
            )));
        }
        Ok(self.push(
            None,
            OpKind::Minimize {
                optimizer,
                variables,
            },
            vec![loss],
            DType::String,
            Shape::scalar(),
        ))
    }

    /// Variables reachable from `root` through differentiable edges, ascending.
    fn trainable_dependencies(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        let mut found = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = &self.nodes[id.0];
            match node.op {
                OpKind::Variable(_) => found.push(id),
                OpKind::MatMul | OpKind::Add | OpKind::ReduceMean => {
                    stack.extend(node.inputs.iter().copied());
                }
                // Labels do not receive a gradient.
                OpKind::SoftmaxCrossEntropy => stack.push(node.inputs[1]),
                _ => {}
            }
        }
        found.sort_unstable();
        found
    }
}
