//! Adam update rule

use std::collections::HashMap;

use ndarray::{ArrayD, Zip};

use crate::graph::{AdamConfig, NodeId, Tensor};
use crate::{Error, Result};

/// Moment estimates kept by one minimize node across steps.
#[derive(Debug, Default)]
pub(crate) struct AdamState {
    step: i32,
    moments: HashMap<NodeId, (ArrayD<f32>, ArrayD<f32>)>,
}

impl AdamState {
    /// Check that every gradient matches an existing variable's shape.
    pub(crate) fn validate(
        variables: &HashMap<NodeId, Tensor>,
        grads: &[(NodeId, Tensor)],
    ) -> Result<()> {
        for (id, grad) in grads {
            let var = variables
                .get(id)
                .ok_or_else(|| Error::Graph(format!("node #{} is not a variable", id.index())))?;
            if var.shape() != grad.shape() {
                return Err(Error::shape_mismatch(
                    "Adam",
                    format!("{:?}", var.shape()),
                    format!("{:?}", grad.shape()),
                ));
            }
        }
        Ok(())
    }

    /// Apply one step of `config` to `variables` using `grads`.
    ///
    /// Every gradient is checked against its variable first; on error
    /// neither the variables nor the optimizer state change.
    pub(crate) fn apply(
        &mut self,
        config: &AdamConfig,
        variables: &mut HashMap<NodeId, Tensor>,
        grads: Vec<(NodeId, Tensor)>,
    ) -> Result<()> {
        Self::validate(variables, &grads)?;

        self.step = self.step.saturating_add(1);
        let bias1 = 1.0 - config.beta1.powi(self.step);
        let bias2 = 1.0 - config.beta2.powi(self.step);
        let lr_t = config.learning_rate * bias2.sqrt() / bias1;

        for (id, grad) in grads {
            let Some(var) = variables.get_mut(&id) else {
                continue;
            };
            let (m, v) = self.moments.entry(id).or_insert_with(|| {
                let dim = grad.array().raw_dim();
                (ArrayD::zeros(dim.clone()), ArrayD::zeros(dim))
            });
            Zip::from(var.array_mut())
                .and(grad.array())
                .and(m)
                .and(v)
                .for_each(|w, &g, m, v| {
                    *m = config.beta1 * *m + (1.0 - config.beta1) * g;
                    *v = config.beta2 * *v + (1.0 - config.beta2) * g * g;
                    *w -= lr_t * *m / (v.sqrt() + config.epsilon);
                });
        }
        Ok(())
    }
}
