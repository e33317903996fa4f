//! Runtime configuration of a tree's node pool.
//!
//! Key width and the cache floor are type-level settings of
//! [`RadixTree`](crate::RadixTree); only allocation behavior is configured at
//! runtime.

use crate::error::{Result, TreeError};

/// Default length of the first slab requested by the node pool.
pub const DEFAULT_FIRST_SLAB: usize = 8;

/// Configuration for a [`RadixTree`](crate::RadixTree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nodes in the first slab; later slabs double. Must be a power of two.
    pub first_slab: usize,
    /// Upper bound on live nodes, root included. `None` means unbounded.
    pub node_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_slab: DEFAULT_FIRST_SLAB,
            node_limit: None,
        }
    }
}

impl Config {
    /// Set the length of the first slab.
    pub fn with_first_slab(mut self, first_slab: usize) -> Self {
        self.first_slab = first_slab;
        self
    }

    /// Cap the number of live nodes.
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Check the configuration for values the pool cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !self.first_slab.is_power_of_two() {
            return Err(TreeError::InvalidSlabLen(self.first_slab));
        }
        if self.node_limit == Some(0) {
            return Err(TreeError::ZeroNodeLimit);
        }
        Ok(())
    }
}
