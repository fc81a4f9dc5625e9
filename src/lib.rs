//! # Trueno-Trainkit: Run Logging and Graph Helpers for Training Runs
//!
//! **Version**: 0.1.0
//!
//! Trueno-Trainkit covers the bookkeeping around a neural-network training
//! run: a JSON run log with identifiers, hyperparameters and timing, small
//! graph fragments for inputs, loss, optimizer, accuracy and summaries, and a
//! session configuration selector.
//!
//! ## Design Principles
//!
//! - **Explicit context**: graph helpers take a [`graph::Graph`] by
//!   `&mut`; there is no process-wide default graph
//! - **Errors, not exits**: missing run identifiers are an
//!   [`Error::MissingRequiredField`]; only
//!   [`run::RunLog::from_config_or_exit`] terminates the process
//! - **Stateless helpers**: every helper is a plain function over its inputs
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trueno_trainkit::graph::{Graph, Tensor};
//! use trueno_trainkit::ops::{create_eval_ops, create_placeholders, create_train_ops};
//! use trueno_trainkit::run::{save_log, RunConfig, RunLog};
//! use trueno_trainkit::session::{session_config, Feed, Session};
//!
//! let config = RunConfig::from_path("run.json")?;
//! let mut log = RunLog::from_config(&config)?;
//!
//! let mut graph = Graph::new();
//! let (inputs, labels) = create_placeholders(&mut graph, 4, 3);
//! let w = graph.variable("w", Tensor::zeros(&[4, 3]));
//! let logits = graph.matmul(inputs, w)?;
//! let train = create_train_ops(&mut graph, logits, labels)?;
//! let eval = create_eval_ops(&mut graph, logits, labels)?;
//!
//! let mut session = Session::new(&graph, session_config(false));
//! let feed = Feed::new()
//!     .with(inputs, Tensor::from_rows(&[[1.0_f32, 0.0, 0.0, 0.0]])?)
//!     .with(labels, Tensor::one_hot(&[2], 3)?);
//! session.run(&[train.train_step], &feed)?;
//! let out = session.run(&[train.loss, eval.accuracy], &feed)?;
//! println!("loss {:?}", out[0].as_scalar());
//!
//! save_log(&mut log, "summaries", config.run_name(), "log.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod graph;
pub mod logging;
pub mod ops;
pub mod run;
pub mod session;

pub use error::{Error, Result};
