//! Optimizer hyperparameters

/// Adam hyperparameters.
///
/// Defaults: learning rate 0.001, beta1 0.9, beta2 0.999, epsilon 1e-8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    /// Step size
    pub learning_rate: f32,
    /// Decay rate of the first-moment estimate
    pub beta1: f32,
    /// Decay rate of the second-moment estimate
    pub beta2: f32,
    /// Numerical stability term
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}
