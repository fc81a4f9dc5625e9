//! Graph execution
//!
//! A [`Session`] binds placeholders to concrete tensors and evaluates fetched
//! nodes on the CPU. Variables live in the session, so several sessions over
//! the same [`Graph`] train independently.
//!
//! ```rust
//! use trueno_trainkit::graph::{DType, Graph, Shape, Tensor};
//! use trueno_trainkit::session::{session_config, Feed, Session};
//!
//! # fn main() -> trueno_trainkit::Result<()> {
//! let mut graph = Graph::new();
//! let x = graph.placeholder("x", DType::F32, Shape::batch_of(2));
//! let mean = graph.reduce_mean(x)?;
//!
//! let mut session = Session::new(&graph, session_config(false));
//! let feed = Feed::new().with(x, Tensor::from_rows(&[[1.0_f32, 3.0]])?);
//! let out = session.run(&[mean], &feed)?;
//! assert_eq!(out[0].as_scalar(), Some(2.0));
//! # Ok(())
//! # }
//! ```

mod config;
mod gradient;
mod kernels;
mod optimizer;
mod summary;

pub use config::{session_config, SessionConfig, GPU_DEVICE};
pub use summary::{Summary, SummaryValue};

use std::collections::HashMap;

use crate::graph::{AdamConfig, DType, Graph, Node, NodeId, OpKind, Tensor};
use crate::{Error, Result};
use optimizer::AdamState;

/// Values bound to placeholders (or any other node) for one run.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    values: HashMap<NodeId, Tensor>,
}

impl Feed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `node` to `value`, replacing any earlier binding.
    #[must_use]
    pub fn with(mut self, node: NodeId, value: Tensor) -> Self {
        self.insert(node, value);
        self
    }

    /// Bind `node` to `value`, replacing any earlier binding.
    pub fn insert(&mut self, node: NodeId, value: Tensor) {
        self.values.insert(node, value);
    }

    /// Value bound to `node`, if any.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&Tensor> {
        self.values.get(&node)
    }
}

/// Value of one fetched node.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Numeric output
    Tensor(Tensor),
    /// Summary or merged summary
    Summary(Summary),
    /// Operations run for their effect, such as an optimizer step
    Unit,
}

impl Fetched {
    /// The tensor, if this is a numeric output.
    #[must_use]
    pub const fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// The single value of a one-element numeric output.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f32> {
        self.as_tensor().and_then(Tensor::as_scalar)
    }

    /// The summary, if this is a summary output.
    #[must_use]
    pub const fn as_summary(&self) -> Option<&Summary> {
        match self {
            Self::Summary(s) => Some(s),
            _ => None,
        }
    }
}

/// CPU executor for a [`Graph`].
#[derive(Debug)]
pub struct Session<'g> {
    graph: &'g Graph,
    config: Option<SessionConfig>,
    variables: HashMap<NodeId, Tensor>,
    optimizers: HashMap<NodeId, AdamState>,
}

impl<'g> Session<'g> {
    /// Create a session with every variable at its initial value.
    ///
    /// `config` is usually the output of [`session_config`]; `None` keeps the
    /// defaults. Kernels always run on the CPU.
    #[must_use]
    pub fn new(graph: &'g Graph, config: Option<SessionConfig>) -> Self {
        let variables: HashMap<NodeId, Tensor> = graph
            .nodes()
            .filter_map(|(id, node)| match node.op() {
                OpKind::Variable(init) => Some((id, init.clone())),
                _ => None,
            })
            .collect();
        tracing::debug!(
            nodes = graph.len(),
            variables = variables.len(),
            gpu_allowed = config.as_ref().map_or(true, SessionConfig::gpu_allowed),
            "session created"
        );
        Self {
            graph,
            config,
            variables,
            optimizers: HashMap::new(),
        }
    }

    /// Configuration the session was created with.
    #[must_use]
    pub const fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// Current value of a variable.
    #[must_use]
    pub fn variable(&self, id: NodeId) -> Option<&Tensor> {
        self.variables.get(&id)
    }

    /// Evaluate `fetches` with `feed` bound, returning one value per fetch.
    ///
    /// Each node is evaluated at most once per call. Optimizer steps are
    /// applied after every fetch has been computed, so fetched values reflect
    /// the variables as they were when the call started.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingFeed`] if a required placeholder is unbound.
    /// - [`Error::ShapeMismatch`] if a fed tensor does not fit its node.
    /// - [`Error::Graph`] if a fetch does not belong to the session's graph.
    pub fn run(&mut self, fetches: &[NodeId], feed: &Feed) -> Result<Vec<Fetched>> {
        let mut values: HashMap<NodeId, Fetched> = HashMap::new();
        let mut steps = Vec::new();

        for &fetch in fetches {
            self.evaluate(fetch, feed, &mut values, &mut steps)?;
        }

        for (_, _, grads) in &steps {
            AdamState::validate(&self.variables, grads)?;
        }
        for (step, config, grads) in steps {
            self.optimizers
                .entry(step)
                .or_default()
                .apply(&config, &mut self.variables, grads)?;
        }

        fetches
            .iter()
            .map(|id| {
                values
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Error::Graph(format!("fetch #{} produced no value", id.index())))
            })
            .collect()
    }

    fn evaluate(
        &self,
        id: NodeId,
        feed: &Feed,
        values: &mut HashMap<NodeId, Fetched>,
        steps: &mut Vec<(NodeId, AdamConfig, Vec<(NodeId, Tensor)>)>,
    ) -> Result<()> {
        if values.contains_key(&id) {
            return Ok(());
        }
        let node = self.graph.node(id)?;

        if let Some(fed) = feed.get(id) {
            if !node.shape().accepts(fed.shape()) {
                return Err(Error::shape_mismatch(
                    node.name(),
                    node.shape(),
                    format!("{:?}", fed.shape()),
                ));
            }
            values.insert(id, Fetched::Tensor(fed.clone()));
            return Ok(());
        }

        for &input in node.inputs() {
            self.evaluate(input, feed, values, steps)?;
        }
        let values_ref: &HashMap<NodeId, Fetched> = values;
        let tensor = |i: usize| input_tensor(node, values_ref, i);

        let out = match node.op() {
            OpKind::Placeholder => return Err(Error::MissingFeed(node.name().to_string())),
            OpKind::Constant(value) => Fetched::Tensor(value.clone()),
            OpKind::Variable(_) => Fetched::Tensor(
                self.variables
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| Error::Graph(format!("variable `{}` is missing", node.name())))?,
            ),
            OpKind::MatMul => Fetched::Tensor(kernels::matmul(tensor(0)?, tensor(1)?)?),
            OpKind::Add => Fetched::Tensor(kernels::add(tensor(0)?, tensor(1)?)?),
            OpKind::SoftmaxCrossEntropy => {
                Fetched::Tensor(kernels::softmax_cross_entropy(tensor(0)?, tensor(1)?)?)
            }
            OpKind::ReduceMean => Fetched::Tensor(kernels::reduce_mean(tensor(0)?)),
            OpKind::ArgMax => Fetched::Tensor(kernels::argmax_rows(tensor(0)?)?),
            OpKind::Equal => Fetched::Tensor(kernels::equal(tensor(0)?, tensor(1)?)?),
            OpKind::Cast => {
                let x = tensor(0)?;
                Fetched::Tensor(match node.dtype() {
                    DType::Bool => {
                        Tensor::from_array(x.array().mapv(|v| if v == 0.0 { 0.0 } else { 1.0 }))
                    }
                    DType::I64 => Tensor::from_array(x.array().mapv(f32::trunc)),
                    _ => x.clone(),
                })
            }
            OpKind::InTopK { k } => {
                Fetched::Tensor(kernels::in_top_k(tensor(0)?, tensor(1)?, *k)?)
            }
            OpKind::ScalarSummary { tag } => {
                let x = tensor(0)?;
                let value = x.as_scalar().ok_or_else(|| {
                    Error::shape_mismatch(node.name(), "scalar", format!("{:?}", x.shape()))
                })?;
                Fetched::Summary(Summary::scalar(tag, value))
            }
            OpKind::MergeSummary => {
                let mut merged = Summary::default();
                for input in node.inputs() {
                    if let Some(summary) = values_ref.get(input).and_then(Fetched::as_summary) {
                        merged.extend(summary);
                    }
                }
                Fetched::Summary(merged)
            }
            OpKind::Minimize {
                optimizer,
                variables,
            } => {
                let grads =
                    gradient::gradients(self.graph, node.inputs()[0], variables, values_ref)?;
                steps.push((id, *optimizer, grads));
                Fetched::Unit
            }
        };

        values.insert(id, out);
        Ok(())
    }
}

fn input_tensor<'v>(
    node: &Node,
    values: &'v HashMap<NodeId, Fetched>,
    i: usize,
) -> Result<&'v Tensor> {
    values
        .get(&node.inputs()[i])
        .and_then(Fetched::as_tensor)
        .ok_or_else(|| Error::Graph(format!("`{}` expects a numeric input", node.name())))
}
