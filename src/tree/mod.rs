//! The radix tree and its traversal path cache.
//!
//! A key of `W` bytes is resolved by `W` slot lookups: one per node from the
//! root (level `W`) down to the value slot in the level-1 node. The tree
//! remembers the node it visited at every level for the previous key. When
//! the next key agrees with it on every byte above some level, the walk
//! restarts from the cached node at that level instead of from the root, so
//! the cost of an operation is bounded by the position of the highest byte
//! that differs from the previous key rather than by `W`.
//!
//! Cache invariant: every cached entry is either empty or the live node at
//! its level on the previous key's path. A walk that stops at a vacant slot
//! empties every entry below that point, and pruning empties the entry of
//! every node it releases.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::config::Config;
use crate::error::{Result, TreeError};
use crate::key::RadixKey;
use crate::node::Slot;
use crate::pool::{NodeId, NodePool, PoolStats};

/// Inline capacity of the path cache; covers 128-bit keys without spilling.
const TRACE_INLINE: usize = 17;

/// Outcome of the shared insert path.
enum Inserted<V> {
    Vacant,
    Replaced(V),
    Kept,
}

/// A 256-way radix tree mapping fixed-width integer keys to values.
///
/// `CACHE_FLOOR` is the lowest level whose cached node may be reused by the
/// next operation. The default of 1 reuses everything down to the level-1
/// node, which suits keys that arrive in runs sharing their high-order bytes.
/// Raising it forces the lowest levels to be re-walked every time; 0 (or any
/// value `>= K::BYTES`) turns the cache off, see [`UncachedRadixTree`].
///
/// Lookups take `&mut self` because they update the path cache. [`get`]
/// walks from the root and works through a shared borrow.
///
/// [`get`]: RadixTree::get
///
/// # Example
///
/// ```rust
/// use radix_trace::RadixTree;
///
/// let mut tree: RadixTree<u32, &str> = RadixTree::new();
/// assert_eq!(tree.insert(0x0000_0001, "a"), None);
/// assert_eq!(tree.insert(0x0000_0002, "b"), None);
/// assert_eq!(tree.search(0x0000_0001), Some(&"a"));
///
/// assert_eq!(tree.remove(0x0000_0001), Some("a"));
/// assert_eq!(tree.search(0x0000_0001), None);
/// assert_eq!(tree.len(), 1);
/// ```
#[derive(Clone)]
pub struct RadixTree<K, V, const CACHE_FLOOR: usize = 1> {
    pool: NodePool<V>,
    root: NodeId,
    len: usize,
    /// `trace[level]` is the node at `level` on `last_key`'s path, if known.
    /// `trace[0]` stands for the value slot and stays empty; `trace[W]` is
    /// always the root.
    trace: SmallVec<[Option<NodeId>; TRACE_INLINE]>,
    last_key: K,
    last_hops: usize,
    node_limit: Option<usize>,
}

/// A [`RadixTree`] that walks from the root on every operation.
pub type UncachedRadixTree<K, V> = RadixTree<K, V, 0>;

impl<K: RadixKey, V, const CACHE_FLOOR: usize> RadixTree<K, V, CACHE_FLOOR> {
    /// Create an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Create an empty tree with the given configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            key_bytes = K::BYTES,
            cache_floor = CACHE_FLOOR,
            first_slab = config.first_slab,
            node_limit = ?config.node_limit,
            "creating radix tree"
        );
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let mut pool = NodePool::new(config.first_slab);
        let root = Self::new_root(&mut pool);
        let mut trace: SmallVec<[Option<NodeId>; TRACE_INLINE]> = smallvec![None; K::BYTES + 1];
        trace[K::BYTES] = Some(root);
        Self {
            pool,
            root,
            len: 0,
            trace,
            last_key: K::ZERO,
            last_hops: 0,
            node_limit: config.node_limit,
        }
    }

    /// The root is never pruned, so unlike other nodes it starts out empty.
    fn new_root(pool: &mut NodePool<V>) -> NodeId {
        let root = pool.acquire();
        pool.node_mut(root).size = 0;
        root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot lookups performed by the most recent cached operation.
    ///
    /// Repeating the previous key costs 1; a key sharing `P` high-order bytes
    /// with the previous (successfully resolved) key costs at most
    /// `max(W - P, CACHE_FLOOR)`.
    #[inline]
    pub fn last_hops(&self) -> usize {
        self.last_hops
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Approximate heap and inline bytes held by the tree.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.pool.memory_usage()
    }

    #[inline]
    fn caching() -> bool {
        CACHE_FLOOR > 0 && CACHE_FLOOR < K::BYTES
    }

    /// Deepest cached node from which `key` can be resolved.
    ///
    /// Levels at or above the divergence with the previous key resolve to the
    /// same nodes for both keys. If the entry at that level was invalidated,
    /// the nearest valid ancestor is used; the root always is.
    #[inline]
    fn resume(&self, key: K) -> (usize, NodeId) {
        let top = K::BYTES;
        if Self::caching() {
            let mut level = CACHE_FLOOR.max(key.divergence(self.last_key));
            while level < top {
                if let Some(id) = self.trace[level] {
                    return (level, id);
                }
                level += 1;
            }
        }
        (top, self.root)
    }

    /// Walk towards `key`'s level-1 node, recording the path.
    ///
    /// Returns the lowest level reached and its node. A level above 1 means
    /// the slot for `key` at that level is vacant.
    fn descend(&mut self, key: K) -> (usize, NodeId) {
        let (mut level, mut node) = self.resume(key);
        self.last_key = key;
        self.last_hops = 0;

        while level > 1 {
            self.last_hops += 1;
            match self.pool.node(node).slot(key.byte_at(level)).child() {
                Some(child) => {
                    level -= 1;
                    node = child;
                    self.trace[level] = Some(child);
                }
                None => {
                    for entry in &mut self.trace[1..level] {
                        *entry = None;
                    }
                    break;
                }
            }
        }
        (level, node)
    }

    /// Level-1 node holding `key`'s value slot, if the path exists.
    #[inline]
    fn leaf(&mut self, key: K) -> Option<NodeId> {
        let (level, node) = self.descend(key);
        if level > 1 {
            return None;
        }
        self.last_hops += 1;
        Some(node)
    }

    /// Value for `key`, resolved through the path cache.
    pub fn search(&mut self, key: K) -> Option<&V> {
        let leaf = self.leaf(key)?;
        self.pool.node(leaf).slot(key.byte_at(1)).value()
    }

    /// Mutable value for `key`, resolved through the path cache.
    pub fn search_mut(&mut self, key: K) -> Option<&mut V> {
        let leaf = self.leaf(key)?;
        self.pool.node_mut(leaf).slot_mut(key.byte_at(1)).value_mut()
    }

    pub fn contains_key(&mut self, key: K) -> bool {
        self.search(key).is_some()
    }

    /// Value for `key`, walking from the root. Leaves the path cache alone.
    pub fn get(&self, key: K) -> Option<&V> {
        let mut node = self.root;
        for level in (2..=K::BYTES).rev() {
            node = self.pool.node(node).slot(key.byte_at(level)).child()?;
        }
        self.pool.node(node).slot(key.byte_at(1)).value()
    }

    /// Insert `value` under `key`, replacing any stored value.
    ///
    /// Returns the previous value.
    ///
    /// # Panics
    ///
    /// Panics if a node limit is configured and the insert would exceed it.
    /// Use [`try_insert`](Self::try_insert) to handle that case.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.try_insert(key, value).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Insert `value` under `key` unless the key is present.
    ///
    /// Returns the stored value and drops `value` if the key is present;
    /// returns `None` after inserting otherwise.
    ///
    /// # Panics
    ///
    /// Panics if a node limit is configured and the insert would exceed it.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        self.try_insert_if_absent(key, value).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible [`insert`](Self::insert). On error the tree is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        Ok(match self.insert_with(key, value, true)? {
            Inserted::Replaced(prev) => Some(prev),
            Inserted::Vacant | Inserted::Kept => None,
        })
    }

    /// Fallible [`insert_if_absent`](Self::insert_if_absent). On error the
    /// tree is unchanged.
    pub fn try_insert_if_absent(&mut self, key: K, value: V) -> Result<Option<&V>> {
        match self.insert_with(key, value, false)? {
            Inserted::Kept => Ok(self.cached_value(key)),
            Inserted::Vacant | Inserted::Replaced(_) => Ok(None),
        }
    }

    /// Value slot of `key` read straight from the cached level-1 node. Only
    /// meaningful right after an operation on `key` reached that node.
    #[inline]
    fn cached_value(&self, key: K) -> Option<&V> {
        let leaf = self.trace[1]?;
        self.pool.node(leaf).slot(key.byte_at(1)).value()
    }

    fn insert_with(&mut self, key: K, value: V, overwrite: bool) -> Result<Inserted<V>> {
        let (level, node) = self.descend(key);

        if level == 1 {
            self.last_hops += 1;
            if let Slot::Value(current) = self.pool.node_mut(node).slot_mut(key.byte_at(1)) {
                return Ok(if overwrite {
                    Inserted::Replaced(std::mem::replace(current, value))
                } else {
                    Inserted::Kept
                });
            }
        }

        // Every level below `level` is missing a node.
        let needed = level - 1;
        if let Some(limit) = self.node_limit {
            if self.pool.live() + needed > limit {
                tracing::warn!(limit, needed, "node limit reached, insert rejected");
                return Err(TreeError::NodeLimit { limit, needed });
            }
        }

        self.pool.node_mut(node).size += 1;
        let mut parent = node;
        for level in (1..level).rev() {
            let child = self.pool.acquire();
            *self.pool.node_mut(parent).slot_mut(key.byte_at(level + 1)) = Slot::Child(child);
            self.trace[level] = Some(child);
            parent = child;
        }
        *self.pool.node_mut(parent).slot_mut(key.byte_at(1)) = Slot::Value(value);
        self.len += 1;
        Ok(Inserted::Vacant)
    }

    /// Remove `key`, returning its value.
    ///
    /// Nodes left without children are released bottom-up; the root stays.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let leaf = self.leaf(key)?;
        let slot = std::mem::replace(
            self.pool.node_mut(leaf).slot_mut(key.byte_at(1)),
            Slot::Vacant,
        );
        let Slot::Value(value) = slot else {
            return None;
        };
        self.len -= 1;

        let top = K::BYTES;
        let mut level = 1;
        let mut node = leaf;
        loop {
            let n = self.pool.node_mut(node);
            n.size -= 1;
            if n.size > 0 || level == top {
                break;
            }

            self.pool.release(node);
            self.trace[level] = None;
            level += 1;
            node = self.trace[level].expect("a hit caches every ancestor");
            *self.pool.node_mut(node).slot_mut(key.byte_at(level)) = Slot::Vacant;
        }

        Some(value)
    }

    /// Remove every entry and return all nodes to the pool.
    pub fn clear(&mut self) {
        let mut released = 0usize;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            for slot in self.pool.node_mut(id).slots.iter_mut() {
                if let Slot::Child(child) = std::mem::replace(slot, Slot::Vacant) {
                    stack.push(child);
                }
            }
            self.pool.release(id);
            released += 1;
        }

        self.root = Self::new_root(&mut self.pool);
        for entry in self.trace.iter_mut() {
            *entry = None;
        }
        self.trace[K::BYTES] = Some(self.root);
        self.last_key = K::ZERO;
        self.last_hops = 0;

        tracing::trace!(entries = self.len, released, "radix tree cleared");
        self.len = 0;
    }
}

impl<K: RadixKey, V, const CACHE_FLOOR: usize> Default for RadixTree<K, V, CACHE_FLOOR> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RadixKey, V, const CACHE_FLOOR: usize> Extend<(K, V)> for RadixTree<K, V, CACHE_FLOOR> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: RadixKey, V, const CACHE_FLOOR: usize> FromIterator<(K, V)>
    for RadixTree<K, V, CACHE_FLOOR>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: RadixKey, V, const CACHE_FLOOR: usize> fmt::Debug for RadixTree<K, V, CACHE_FLOOR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadixTree")
            .field("len", &self.len)
            .field("key_bytes", &K::BYTES)
            .field("cache_floor", &CACHE_FLOOR)
            .field("last_key", &self.last_key)
            .field("pool", &self.pool.stats())
            .finish()
    }
}


#[cfg(test)]
mod proptests;
