//! Graph fragments for a classification training run
//!
//! Each helper adds a small, named group of nodes to an explicit [`Graph`]
//! and returns handles to the nodes a training loop fetches:
//!
//! ```text
//! create_placeholders ──> inputs [?, in], outputs [?, out]
//! create_keep_probs   ──> keep_prob_input [], keep_prob []
//! create_train_ops    ──> xent/ loss, opt/ Adam step
//! create_eval_ops     ──> eval/ accuracy, top-5 accuracy
//! create_summary_ops  ──> loss, accuracy, top5 accuracy summaries, merged
//! ```
//!
//! [`Graph`]: crate::graph::Graph

mod eval;
mod placeholders;
mod summary;
mod train;

pub use eval::{create_eval_ops, EvalOps, TOP_K};
pub use placeholders::{create_keep_probs, create_placeholders};
pub use summary::create_summary_ops;
pub use train::{create_train_ops, TrainOps};
