//! Run metadata: configuration, run log, and persistence
//!
//! A training run is described by a [`RunConfig`] supplied by the caller. The
//! [`RunLog`] derived from it records the run's identity, hyperparameters and
//! wall-clock timing, and is written once at the end of the run.
//!
//! ## Lifecycle
//!
//! ```text
//! RunConfig ──from_config──> RunLog { end_time: null } ──save_log──> <summary_folder>/<run_name>/<log_file>
//!                 │
//!                 └── git rev-parse HEAD (only when commit is empty)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trueno_trainkit::run::{save_log, RunConfig, RunLog};
//!
//! # fn main() -> trueno_trainkit::Result<()> {
//! let config = RunConfig::builder()
//!     .run_name("baseline")
//!     .dataset("mnist")
//!     .model("mlp")
//!     .procedure("adam")
//!     .build();
//!
//! let mut log = RunLog::from_config(&config)?;
//! // ... train ...
//! save_log(&mut log, "summaries", config.run_name(), "log.json")?;
//! # Ok(())
//! # }
//! ```

mod config;
mod persist;
mod revision;
mod run_log;

pub use config::{RunConfig, RunConfigBuilder};
pub use persist::{ensure_dir_exists, save_log};
pub use revision::{GitRevision, RevisionSource};
pub use run_log::{now_timestamp, RunLog, RUN_FILE};
