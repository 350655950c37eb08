//! Arena - fixed-capacity pool of order book nodes.
//!
//! The arena pre-allocates a contiguous block of nodes at startup, so the
//! matching hot path never touches the heap allocator. Allocation is a
//! cursor bump; there is no per-node free. Slots are reclaimed only by
//! resetting the whole arena, which keeps intrusive list links stable for
//! the lifetime of a run.
//!
//! The slot index handed out by [`Arena::allocate`] is the engine sequence
//! number: sequencing and allocation are the same monotone counter, which
//! is what makes cancellation a single indexed write.

use crate::error::EngineError;
use crate::order::{OrderId, SeqId, Size, Tag};
use std::fmt;

/// Index of a node within the arena. 1-based; slot 0 is never handed out.
pub type ArenaIndex = SeqId;

/// Sentinel terminating an intrusive list.
pub const NIL: ArenaIndex = ArenaIndex::MAX;

/// A resting limit order.
///
/// Born when part of an incoming order fails to cross and rests; dies
/// logically when `remaining` reaches zero (matched away or cancelled).
/// After the slot is first written, only `remaining` ever changes, and
/// only downward.
#[derive(Clone, Copy, Debug)]
pub struct OrderNode {
    /// Unfilled units. Zero marks a dead node that scans step over.
    pub remaining: Size,
    /// Next node at the same price point, or [`NIL`].
    pub next: ArenaIndex,
    /// Owning trader.
    pub trader: Tag,
    /// Durable id assigned by the order source.
    pub external_id: OrderId,
}

impl OrderNode {
    fn empty() -> Self {
        Self {
            remaining: 0,
            next: NIL,
            trader: Tag::new(),
            external_id: 0,
        }
    }
}

/// Pre-allocated node pool with bump allocation.
pub struct Arena {
    nodes: Vec<OrderNode>,
    /// Last sequence handed out; 0 before the first allocation. Also the
    /// high-water mark for reset.
    cursor: ArenaIndex,
}

impl Arena {
    /// Create an arena with room for `capacity` nodes.
    ///
    /// # Panics
    /// Panics if `capacity` would collide with the [`NIL`] sentinel.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NIL, "capacity must be below the NIL sentinel");
        Self {
            nodes: vec![OrderNode::empty(); capacity as usize],
            cursor: 0,
        }
    }

    /// Claim the next slot and return its index, which is also the engine
    /// sequence of the order being processed.
    ///
    /// # Errors
    /// [`EngineError::ArenaFull`] once the cursor reaches capacity. The
    /// run cannot continue; the caller must reset.
    #[inline]
    pub fn allocate(&mut self) -> Result<ArenaIndex, EngineError> {
        let seq = self.cursor + 1;
        if seq as usize >= self.nodes.len() {
            return Err(EngineError::ArenaFull(self.nodes.len() as u32));
        }
        self.cursor = seq;
        Ok(seq)
    }

    /// Immutable access to a node.
    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderNode {
        debug_assert!(index != NIL && (index as usize) < self.nodes.len());
        &self.nodes[index as usize]
    }

    /// Mutable access to a node.
    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> &mut OrderNode {
        debug_assert!(index != NIL && (index as usize) < self.nodes.len());
        &mut self.nodes[index as usize]
    }

    /// Last sequence handed out in this run.
    #[inline]
    pub fn last_seq(&self) -> SeqId {
        self.cursor
    }

    /// Total slot capacity.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Reinitialize for a new run.
    ///
    /// Only the slots actually written this run are zeroed; the untouched
    /// suffix past the high-water mark is already in its initial state.
    pub fn reset(&mut self) {
        let high_water = self.cursor as usize;
        for node in self.nodes.iter_mut().take(high_water + 1) {
            *node = OrderNode::empty();
        }
        self.cursor = 0;
    }

    /// Touch every slot to fault pages in before a timed run.
    pub fn warm_up(&self) {
        for node in &self.nodes {
            let _ = unsafe { std::ptr::read_volatile(&node.remaining) };
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.nodes.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
