//! Crate-wide error taxonomy.
//!
//! One enum covers every failure path named in the component design: graph
//! assembly (`NoStartNode`, `NodeNotFound`), the type validator
//! (`TypeMismatch`), the node executor's per-step wrapping (`PrepFailed`,
//! `ExecFailed`, `PostFailed`, `FallbackFailed`), and the concurrency model
//! (`Timeout`, `Cancelled`, `Panicked`).

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PocketError {
    #[error("no start node configured for graph '{graph}'")]
    NoStartNode { graph: String },

    #[error("node '{0}' referenced by builder was never added")]
    NodeNotFound(String),

    #[error("invalid input for node '{node}': expected {expected}, got {actual}")]
    InvalidInput {
        node: String,
        expected: String,
        actual: String,
    },

    #[error(
        "type mismatch on edge {from} --{label}--> {to}: {from_type} is not compatible with {to_type}"
    )]
    TypeMismatch {
        from: String,
        to: String,
        label: String,
        from_type: String,
        to_type: String,
    },

    #[error("node '{node}' prep failed: {source}")]
    PrepFailed {
        node: String,
        #[source]
        source: Box<PocketError>,
    },

    #[error("node '{node}' exec failed: {source}")]
    ExecFailed {
        node: String,
        #[source]
        source: Box<PocketError>,
    },

    #[error("node '{node}' post failed: {source}")]
    PostFailed {
        node: String,
        #[source]
        source: Box<PocketError>,
    },

    #[error("node '{node}' exec and its fallback both failed: exec={exec_error}, fallback={fallback_error}")]
    FallbackFailed {
        node: String,
        exec_error: Box<PocketError>,
        fallback_error: Box<PocketError>,
    },

    #[error("node '{node}' timed out after {elapsed:?}")]
    Timeout { node: String, elapsed: Duration },

    #[error("cancelled while running node '{node}'")]
    Cancelled { node: String },

    #[error("node '{node}' panicked: {message}")]
    Panicked { node: String, message: String },

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl PocketError {
    pub fn custom(msg: impl Into<String>) -> Self {
        PocketError::Custom(msg.into())
    }

    /// Whether this error reflects a condition that might succeed on retry,
    /// as opposed to a structural error (bad graph wiring, type mismatch)
    /// that will never succeed no matter how many times it's attempted.
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            PocketError::NoStartNode { .. }
                | PocketError::NodeNotFound(_)
                | PocketError::TypeMismatch { .. }
                | PocketError::InvalidInput { .. }
        )
    }
}
