//! # radix-trace
//!
//! A 256-way radix tree over fixed-width unsigned integer keys, with a
//! traversal path cache for workloads whose consecutive keys share their
//! high-order bytes.
//!
//! Each key byte selects one of 256 slots in a node, most significant byte
//! first, so a `W`-byte key is always `W` slot lookups from the root. The
//! tree remembers the nodes visited for the previous key and restarts the
//! next walk from the deepest one still on the new key's path. Nodes come
//! from a per-tree slab pool with an intrusive free list.
//!
//! Only point operations are provided: search, insert, remove, clear.
//!
//! ## Example
//!
//! ```rust
//! use radix_trace::RadixTree;
//!
//! let mut tree: RadixTree<u64, &str> = RadixTree::new();
//! tree.insert(0x1000, "a");
//! tree.insert(0x1001, "b");
//!
//! assert_eq!(tree.search(0x1000), Some(&"a"));
//! // Shares every byte but the last with the previous key: one slot lookup.
//! assert_eq!(tree.search(0x1001), Some(&"b"));
//! assert_eq!(tree.last_hops(), 1);
//!
//! // Keep the stored value when the key is present.
//! assert_eq!(tree.insert_if_absent(0x1000, "c"), Some(&"a"));
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod key;
mod node;
mod pool;
mod tree;

pub use config::Config;
pub use error::{Result, TreeError};
pub use key::RadixKey;
pub use pool::PoolStats;
pub use tree::{RadixTree, UncachedRadixTree};
