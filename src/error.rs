//! Error types.

use thiserror::Error;

/// Errors reported by [`RadixTree`](crate::RadixTree) construction and the
/// fallible insert operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// `Config::first_slab` is zero or not a power of two.
    #[error("first slab length {0} must be a non-zero power of two")]
    InvalidSlabLen(usize),
    /// `Config::node_limit` is `Some(0)`.
    #[error("node limit must leave room for the root node")]
    ZeroNodeLimit,
    /// Inserting would take the live node count past the configured limit.
    #[error("node limit {limit} reached: insert needs {needed} more nodes")]
    NodeLimit {
        /// Configured limit.
        limit: usize,
        /// Nodes the rejected insert would have acquired.
        needed: usize,
    },
}

/// Result alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
