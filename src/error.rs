//! Error types for cpnet.

use thiserror::Error;

/// Error type for trade-network analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// A node lacks an attribute required for matrix construction.
    #[error("node `{node}` is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// Node identifier.
        node: String,
        /// Attribute name.
        attribute: String,
    },

    /// A node attribute holds a value the computation cannot use (e.g. zero income).
    #[error("node `{node}` has invalid `{attribute}` value {value}")]
    InvalidAttribute {
        /// Node identifier.
        node: String,
        /// Attribute name.
        attribute: String,
        /// Offending value.
        value: f64,
    },

    /// `(I - P·M)` is numerically singular.
    #[error("elasticity system is singular (condition number {condition_number:e})")]
    SingularElasticityMatrix {
        /// Estimated condition number (may be infinite).
        condition_number: f64,
    },

    /// A participation group is empty or has zero total income.
    #[error("group is empty or has zero total income")]
    EmptyGroup,

    /// The homogeneous feedback baseline is zero or not finite.
    #[error("homogeneous feedback baseline is degenerate ({baseline})")]
    DegenerateBaseline {
        /// Computed baseline.
        baseline: f64,
    },

    /// A ranking or power-balance score is NaN or infinite.
    #[error("non-finite {quantity} for {group:?}: {value}")]
    NonFiniteScore {
        /// Which score (`influence` or `power balance`).
        quantity: &'static str,
        /// Node group the score was computed for.
        group: Vec<String>,
        /// Offending value.
        value: f64,
    },

    /// Vectors or matrices built over different node orders.
    #[error("dimension mismatch: expected {expected} nodes in matching order, found {found}")]
    DimensionMismatch {
        /// Size of the reference order.
        expected: usize,
        /// Size of the offending operand.
        found: usize,
    },

    /// Node not present in the current universe.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Node id appears twice in an interchange document.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// Operation requires at least one node.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for trade-network analysis.
pub type Result<T> = std::result::Result<T, Error>;
