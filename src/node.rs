//! 256-way branch node.

use crate::pool::NodeId;

/// Fan-out of every node: one slot per byte value.
pub(crate) const FANOUT: usize = 256;

/// One slot of a [`Node`].
///
/// Nodes above level 1 only ever hold `Child`; nodes at level 1 only ever
/// hold `Value`. A node parked on the pool's free list keeps the link to the
/// next free node in slot 0 as `Child`.
#[derive(Clone, Debug)]
pub(crate) enum Slot<V> {
    Vacant,
    Child(NodeId),
    Value(V),
}

impl<V> Slot<V> {
    #[inline]
    pub(crate) fn is_vacant(&self) -> bool {
        matches!(self, Slot::Vacant)
    }

    #[inline]
    pub(crate) fn child(&self) -> Option<NodeId> {
        match self {
            Slot::Child(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        match self {
            Slot::Value(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> Option<&mut V> {
        match self {
            Slot::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// A branch node: 256 slots and a live-slot counter.
///
/// `size` starts at 1 because a node is only ever created to hold the slot
/// that triggered its creation. The tree keeps it equal to the number of
/// non-vacant slots afterwards.
#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    pub(crate) slots: [Slot<V>; FANOUT],
    pub(crate) size: u32,
}

impl<V> Node<V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::Vacant),
            size: 1,
        }
    }

    #[inline]
    pub(crate) fn slot(&self, byte: u8) -> &Slot<V> {
        &self.slots[byte as usize]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, byte: u8) -> &mut Slot<V> {
        &mut self.slots[byte as usize]
    }

    /// Number of non-vacant slots, counted the slow way.
    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_vacant()).count()
    }
}
