//! Run Log - identity, hyperparameters and timing of one training run

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{GitRevision, RevisionSource, RunConfig};
use crate::{Error, Result};

/// Identifier of the training entry point recorded in every run log.
pub const RUN_FILE: &str = "train.py";

/// Current wall-clock time as seconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Run Log records one training run.
///
/// Every field except `end_time` is fixed at construction. `end_time` stays
/// `None` (JSON `null`) until [`RunLog::finish`] is called, normally by
/// [`super::save_log`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    run_file: String,
    start_time: f64,
    end_time: Option<f64>,
    run_name: String,
    commit: String,
    dataset: String,
    model: String,
    rng_seed: i64,
    train_procedure: String,
    epochs: u64,
    train_batch_size: u64,
    test_batch_size: u64,
    eval_interval: u64,
    checkpoint_interval: u64,
}

impl RunLog {
    /// Build a run log from `config`, resolving an empty commit with git.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingRequiredField`] if run name, dataset, model or
    ///   procedure is empty.
    /// - [`Error::ExternalToolFailure`] if the commit is empty and
    ///   `git rev-parse HEAD` fails.
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::from_config_with(config, &GitRevision::new())
    }

    /// Build a run log from `config`, resolving an empty commit with `revisions`.
    ///
    /// Required fields are checked before any revision query is made.
    ///
    /// # Errors
    ///
    /// Same as [`RunLog::from_config`]; revision failures come from `revisions`.
    pub fn from_config_with(config: &RunConfig, revisions: &impl RevisionSource) -> Result<Self> {
        let missing = config.missing_required_fields();
        if !missing.is_empty() {
            return Err(Error::MissingRequiredField { fields: missing });
        }

        let commit = if config.commit().is_empty() {
            tracing::info!("No commit hash provided, using most recent on HEAD");
            let raw = revisions.head_revision()?;
            String::from_utf8(raw).map_err(|e| Error::ExternalToolFailure {
                tool: "git".into(),
                message: format!("revision is not valid UTF-8: {e}"),
            })?
        } else {
            config.commit().to_string()
        };

        Ok(Self {
            run_file: RUN_FILE.to_string(),
            start_time: now_timestamp(),
            end_time: None,
            run_name: config.run_name().to_string(),
            commit,
            dataset: config.dataset().to_string(),
            model: config.model().to_string(),
            rng_seed: config.rng_seed(),
            train_procedure: config.procedure().to_string(),
            epochs: config.epochs(),
            train_batch_size: config.train_batch_size(),
            test_batch_size: config.test_batch_size(),
            eval_interval: config.eval_interval(),
            checkpoint_interval: config.checkpoint_interval(),
        })
    }

    /// Build a run log for interactive use, exiting the process on bad config.
    ///
    /// Missing required fields print a diagnostic to stdout and terminate with
    /// status -1. Other failures are returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalToolFailure`] if the commit cannot be resolved.
    pub fn from_config_or_exit(config: &RunConfig) -> Result<Self> {
        Self::from_config_with_or_exit(config, &GitRevision::new())
    }

    /// [`RunLog::from_config_or_exit`] with an explicit revision source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalToolFailure`] if `revisions` fails.
    pub fn from_config_with_or_exit(
        config: &RunConfig,
        revisions: &impl RevisionSource,
    ) -> Result<Self> {
        match Self::from_config_with(config, revisions) {
            Err(err @ Error::MissingRequiredField { .. }) => {
                println!("{err}");
                std::process::exit(err.exit_code());
            }
            other => other,
        }
    }

    /// Stamp the end time with the current wall-clock time.
    ///
    /// Calling it again overwrites the previous end time.
    pub fn finish(&mut self) {
        self.end_time = Some(now_timestamp());
    }

    /// Entry point identifier (always [`RUN_FILE`]).
    #[must_use]
    pub fn run_file(&self) -> &str {
        &self.run_file
    }

    /// Seconds since epoch at construction.
    #[must_use]
    pub const fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Seconds since epoch when the log was finished, if it has been.
    #[must_use]
    pub const fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    /// Run name.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Resolved source revision.
    #[must_use]
    pub fn commit(&self) -> &str {
        &self.commit
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

    /// Random seed.
    #[must_use]
    pub const fn rng_seed(&self) -> i64 {
        self.rng_seed
    }

    /// Training procedure identifier.
    #[must_use]
    pub fn train_procedure(&self) -> &str {
        &self.train_procedure
    }

    /// Number of epochs.
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
}
