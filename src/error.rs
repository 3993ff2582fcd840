//! Boundary checks for combining tangents with the primal they belong to.
//!
//! Everything else in this crate treats a precondition violation as a
//! programmer error and panics. These are the few shape checks callers can
//! run up front instead.

use thiserror::Error;

/// Result type alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Shape mismatches between a tangent and the primal it is applied to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A dense tangent whose length differs from its primal.
    #[error("count mismatch: {primal} ('self') and {tangent} ('direction')")]
    CountMismatch {
        /// Primal element count.
        primal: usize,
        /// Tangent element count.
        tangent: usize,
    },

    /// A sparse tangent that is longer than the primal it was built for.
    #[error("tangent of length {tangent} exceeds primal length {primal}")]
    TangentTooLong {
        /// Primal element count.
        primal: usize,
        /// Stored tangent element count.
        tangent: usize,
    },

    /// Two sequences traversed pairwise do not have the same length.
    #[error("paired sequences must have equal length: {lhs} and {rhs}")]
    LengthMismatch {
        /// Length of the first sequence.
        lhs: usize,
        /// Length of the second sequence.
        rhs: usize,
    },

    /// A keyed tangent names a key the primal map does not hold.
    #[error("missing component {key} in moved map")]
    MissingKey {
        /// Debug rendering of the offending key.
        key: String,
    },
}
