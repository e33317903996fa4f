//! Slab pool for tree nodes.
//!
//! Nodes are small, fixed-size and churn heavily as inserts and removes
//! change the shape of the tree, so each tree owns a pool that recycles them
//! instead of going back to the global allocator:
//!
//! - Memory is requested in slabs whose lengths double (`s, 2s, 4s, ...`).
//! - Released nodes are kept on an intrusive free list threaded through
//!   slot 0 of each free node.
//! - Slabs are never returned or moved while the pool lives, so a
//!   [`NodeId`] stays valid until the node is released.

use crate::node::{Node, Slot};

/// A 32-bit index of a node in a [`NodePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeId(idx as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Occupancy of a tree's node pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slabs requested from the global allocator so far.
    pub slabs: usize,
    /// Nodes across all slabs.
    pub capacity: usize,
    /// Nodes currently in use by the tree, root included.
    pub live: usize,
    /// Nodes parked on the free list.
    pub free: usize,
}

#[derive(Clone)]
pub(crate) struct NodePool<V> {
    slabs: Vec<Box<[Node<V>]>>,
    /// Length of slab 0; a power of two.
    first_slab: usize,
    next_slab: usize,
    free_head: Option<NodeId>,
    capacity: usize,
    live: usize,
}

impl<V> NodePool<V> {
    pub(crate) fn new(first_slab: usize) -> Self {
        debug_assert!(first_slab.is_power_of_two());
        Self {
            slabs: Vec::new(),
            first_slab,
            next_slab: first_slab,
            free_head: None,
            capacity: 0,
            live: 0,
        }
    }

    /// Slab and offset holding `id`.
    ///
    /// Slab `k` has length `first_slab << k` and starts at global index
    /// `first_slab * (2^k - 1)`.
    #[inline]
    fn locate(&self, id: NodeId) -> (usize, usize) {
        let n = id.index() + self.first_slab;
        let slab = (n.ilog2() - self.first_slab.ilog2()) as usize;
        (slab, n - (self.first_slab << slab))
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<V> {
        let (slab, offset) = self.locate(id);
        &self.slabs[slab][offset]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        let (slab, offset) = self.locate(id);
        &mut self.slabs[slab][offset]
    }

    /// Hand out a node with every slot vacant and `size == 1`.
    pub(crate) fn acquire(&mut self) -> NodeId {
        let id = match self.free_head {
            Some(id) => {
                let link = std::mem::replace(&mut self.node_mut(id).slots[0], Slot::Vacant);
                self.free_head = link.child();
                id
            }
            None => self.grow(),
        };

        let node = self.node_mut(id);
        debug_assert_eq!(node.occupied(), 0, "free node still holds slots");
        node.size = 1;
        self.live += 1;
        id
    }

    /// Return a node to the free list. Every slot must already be vacant.
    pub(crate) fn release(&mut self, id: NodeId) {
        debug_assert_eq!(self.node(id).occupied(), 0, "released node still holds slots");
        debug_assert!(self.live > 0);
        self.push_free(id);
        self.live -= 1;
    }

    fn push_free(&mut self, id: NodeId) {
        let link = match self.free_head {
            Some(next) => Slot::Child(next),
            None => Slot::Vacant,
        };
        let node = self.node_mut(id);
        node.slots[0] = link;
        node.size = 0;
        self.free_head = Some(id);
    }

    /// Request the next slab, park all but its first node on the free list
    /// and return that first node.
    fn grow(&mut self) -> NodeId {
        let len = self.next_slab;
        let base = self.capacity;
        let slab: Box<[Node<V>]> = (0..len).map(|_| Node::new()).collect();
        self.slabs.push(slab);
        self.capacity += len;
        self.next_slab = len * 2;

        tracing::debug!(
            slab = self.slabs.len() - 1,
            len,
            capacity = self.capacity,
            "node pool grew"
        );

        // Pushed highest first so the free list hands out ascending ids.
        for idx in (base + 1..base + len).rev() {
            self.push_free(NodeId::new(idx));
        }
        NodeId::new(base)
    }

    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            slabs: self.slabs.len(),
            capacity: self.capacity,
            live: self.live,
            free: self.capacity - self.live,
        }
    }

    /// Bytes held by slabs and the slab table.
    pub(crate) fn memory_usage(&self) -> usize {
        self.capacity * std::mem::size_of::<Node<V>>()
            + self.slabs.capacity() * std::mem::size_of::<Box<[Node<V>]>>()
    }
}
