//! Run Config - caller-supplied identifiers and hyperparameters

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Configuration for one training run.
///
/// Usually produced from CLI flags or a JSON file. `commit` may be left empty,
/// in which case the run log resolves it from the working tree's HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    run_name: String,
    dataset: String,
    model: String,
    procedure: String,
    commit: String,
    rng_seed: i64,
    epochs: u64,
    train_batch_size: u64,
    test_batch_size: u64,
    eval_interval: u64,
    checkpoint_interval: u64,
}

impl RunConfig {
    /// Create a builder with every field empty or zero.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Parse a run configuration from a JSON document.
    ///
    /// Missing keys take their default value and unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the text is not a JSON object of the
    /// expected field types.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a run configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, or
    /// [`crate::Error::Json`] if it does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Human-readable run name; also the output sub-directory.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Dataset identifier.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Training procedure identifier.
    #[must_use]
    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    /// Source revision, empty when it should be resolved from HEAD.
    #[must_use]
    pub fn commit(&self) -> &str {
        &self.commit
    }

    /// Random seed.
    #[must_use]
    pub const fn rng_seed(&self) -> i64 {
        self.rng_seed
    }

    /// Number of training epochs.
    #[must_use]
    pub const fn epochs(&self) -> u64 {
        self.epochs
    }

    /// Training batch size.
    #[must_use]
    pub const fn train_batch_size(&self) -> u64 {
        self.train_batch_size
    }

    /// Evaluation batch size.
    #[must_use]
    pub const fn test_batch_size(&self) -> u64 {
        self.test_batch_size
    }

    /// Steps between evaluations.
    #[must_use]
    pub const fn eval_interval(&self) -> u64 {
        self.eval_interval
    }

    /// Steps between checkpoints.
    #[must_use]
    pub const fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }

    /// Names of required identifiers that are empty, in declaration order.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("run_name", &self.run_name),
            ("dataset", &self.dataset),
            ("model", &self.model),
            ("procedure", &self.procedure),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Builder for `RunConfig`.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Set the run name.
    #[must_use]
    pub fn run_name(mut self, run_name: impl Into<String>) -> Self {
        self.config.run_name = run_name.into();
        self
    }

    /// Set the dataset identifier.
    #[must_use]
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.config.dataset = dataset.into();
        self
    }

    /// Set the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the training procedure identifier.
    #[must_use]
    pub fn procedure(mut self, procedure: impl Into<String>) -> Self {
        self.config.procedure = procedure.into();
        self
    }

    /// Pin the source revision instead of resolving HEAD.
    #[must_use]
    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.config.commit = commit.into();
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn rng_seed(mut self, rng_seed: i64) -> Self {
        self.config.rng_seed = rng_seed;
        self
    }

    /// Set the number of epochs.
    #[must_use]
    pub const fn epochs(mut self, epochs: u64) -> Self {
        self.config.epochs = epochs;
        self
    }

    /// Set the training batch size.
    #[must_use]
    pub const fn train_batch_size(mut self, size: u64) -> Self {
        self.config.train_batch_size = size;
        self
    }

    /// Set the evaluation batch size.
    #[must_use]
    pub const fn test_batch_size(mut self, size: u64) -> Self {
        self.config.test_batch_size = size;
        self
    }

    /// Set the evaluation interval.
    #[must_use]
    pub const fn eval_interval(mut self, interval: u64) -> Self {
        self.config.eval_interval = interval;
        self
    }

    /// Set the checkpoint interval.
    #[must_use]
    pub const fn checkpoint_interval(mut self, interval: u64) -> Self {
        self.config.checkpoint_interval = interval;
        self
    }

    /// Build the `RunConfig`.
    #[must_use]
    pub fn build(self) -> RunConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_fields_order() {
        let config = RunConfig::builder().dataset("mnist").build();
        assert_eq!(
            config.missing_required_fields(),
            vec!["run_name", "model", "procedure"]
        );
    }

    #[test]
    fn test_from_json_str_defaults_and_unknown_keys() {
        let config =
            RunConfig::from_json_str(r#"{"run_name": "r", "epochs": 3, "learning_rate": 0.1}"#)
                .unwrap();
        assert_eq!(config.run_name(), "r");
        assert_eq!(config.epochs(), 3);
        assert_eq!(config.commit(), "");
        assert_eq!(config.train_batch_size(), 0);
    }

    #[test]
    fn test_from_json_str_rejects_wrong_types() {
        let result = RunConfig::from_json_str(r#"{"epochs": "ten"}"#);
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }
}
