//! Error types for graph construction and spectral clustering

use thiserror::Error;

/// Errors returned by the graph store, the eigensolver and the clustering driver.
#[derive(Debug, Error)]
pub enum Error {
    /// An edge weight was negative or not finite.
    #[error("invalid weight {weight} on edge ({u}, {v})")]
    InvalidEdgeWeight {
        /// Source vertex.
        u: u32,
        /// Target vertex.
        v: u32,
        /// Offending weight.
        weight: f64,
    },

    /// A vertex id is not part of the graph it was looked up in.
    #[error("vertex {0} is not present in the graph")]
    UnknownVertex(u32),

    /// A vector did not match the size of the operator it was applied to.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Operator size.
        expected: usize,
        /// Vector length.
        found: usize,
    },

    /// The normalized Laplacian is undefined for vertices without weight.
    #[error("vertex {0} has zero weight")]
    ZeroWeightVertex(u32),

    /// Power iteration hit its iteration cap before the criterion was satisfied.
    #[error("power iteration did not converge within {max_iterations} iterations")]
    MaxIterationsExceeded {
        /// The cap that was hit.
        max_iterations: usize,
    },

    /// An iterate collapsed to the zero vector.
    #[error("power iteration produced a zero vector")]
    DegenerateIterate,

    /// Unstable coordinates could not be assigned to a side.
    #[error("partial convergence could not be resolved: {0}")]
    PartialConvergence(String),

    /// The worker pool could not be created.
    #[error("traversal pool: {0}")]
    Traversal(String),
}

impl Error {
    /// Whether this error means "the eigensolver gave up" rather than malformed input.
    ///
    /// The clustering driver turns these into leaf clusters instead of aborting.
    pub fn is_non_convergence(&self) -> bool {
        matches!(
            self,
            Error::MaxIterationsExceeded { .. } | Error::DegenerateIterate | Error::PartialConvergence(_)
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
