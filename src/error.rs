//! Error types for Trueno-Trainkit
//!
//! Clear error messages with actionable guidance: every variant says what went
//! wrong and, where possible, what to change.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status used when a run is started without its required identifiers.
pub const MISSING_FIELD_EXIT_CODE: i32 = -1;

/// Trueno-Trainkit error types
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required run identifiers were empty
    #[error("No {} provided!\nSet every required run field before starting a run", .fields.join(", "))]
    MissingRequiredField {
        /// Names of the empty fields, in declaration order
        fields: Vec<&'static str>,
    },

    /// An external tool (e.g. `git`) could not be run or exited unsuccessfully
    #[error("External tool `{tool}` failed: {message}")]
    ExternalToolFailure {
        /// Executable name
        tool: String,
        /// Diagnostic captured from the tool
        message: String,
    },

    /// Tensor or placeholder shapes do not line up
    #[error("Shape mismatch in {op}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Operation (or node name) that rejected the shape
        op: String,
        /// Shape the operation required
        expected: String,
        /// Shape it was given
        found: String,
    },

    /// A placeholder needed by a fetch was not fed
    #[error("Placeholder `{0}` must be fed a value")]
    MissingFeed(String),

    /// Caller supplied an invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Graph construction or evaluation error
    #[error("Graph error: {0}")]
    Graph(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit status a CLI should use when terminating on this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingRequiredField { .. } => MISSING_FIELD_EXIT_CODE,
            _ => 1,
        }
    }

    pub(crate) fn shape_mismatch(
        op: impl Into<String>,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        Self::ShapeMismatch {
            op: op.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
