//! Price-point table and scan state.
//!
//! The book is a flat array indexed by the integer price. Each slot holds
//! a FIFO of resting nodes linked through their arena indices. Dense
//! indexing fits a bounded price ordinal better than a map: best-price
//! lookup is a pointer walk, and appending is two stores.
//!
//! The FIFO is singly linked. Cancellation never unlinks a node (it only
//! zeroes its size), so there is no remove-from-middle operation to pay a
//! back pointer for.

use crate::arena::{Arena, ArenaIndex, NIL};
use crate::order::{Price, MIN_PRICE};

/// The queue of resting orders at one price. Empty iff `head == NIL`.
///
/// `tail` is only meaningful while the queue is non-empty; clearing the
/// head is enough to empty a level because append keys off `head`.
#[derive(Clone, Copy, Debug)]
pub struct PricePoint {
    head: ArenaIndex,
    tail: ArenaIndex,
}

impl PricePoint {
    const fn new() -> Self {
        Self { head: NIL, tail: NIL }
    }
}

/// Flat array of price points, indexed by `Price` in `[0, max_price]`.
pub struct PricePointTable {
    points: Vec<PricePoint>,
}

impl PricePointTable {
    pub fn new(max_price: Price) -> Self {
        Self {
            points: vec![PricePoint::new(); max_price as usize + 1],
        }
    }

    /// First (oldest) resting node at `price`, or [`NIL`].
    #[inline]
    pub fn head(&self, price: Price) -> ArenaIndex {
        self.points[price as usize].head
    }

    /// Point the level's head at `index`, dropping everything before it.
    /// Used when a scan stops partway through a level.
    #[inline]
    pub fn set_head(&mut self, price: Price, index: ArenaIndex) {
        self.points[price as usize].head = index;
    }

    /// Empty the level. The stale tail is harmless: append re-seeds both
    /// ends when the head is [`NIL`].
    #[inline]
    pub fn clear(&mut self, price: Price) {
        self.points[price as usize].head = NIL;
    }

    /// Append a node at the tail of the level's FIFO. O(1).
    #[inline]
    pub fn append(&mut self, arena: &mut Arena, price: Price, index: ArenaIndex) {
        let pp = &mut self.points[price as usize];
        if pp.head == NIL {
            pp.head = index;
        } else {
            arena.get_mut(pp.tail).next = index;
        }
        pp.tail = index;
    }

    /// Zero every level.
    pub fn reset(&mut self) {
        for pp in &mut self.points {
            *pp = PricePoint::new();
        }
    }
}

/// Scan pointers bounding where matching starts.
///
/// `ask_min` never exceeds the cheapest live ask and `bid_max` never
/// undercuts the dearest live bid, but neither is exact: levels whose
/// orders were all cancelled are discovered and skipped lazily by the
/// next scan. Between matching operations `ask_min > bid_max` always
/// holds, i.e. the book is never crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookState {
    /// Lower bound on the cheapest resting ask. Starts past the top of
    /// the table and only ever moves up during a buy-side scan or down
    /// when a cheaper ask rests.
    pub ask_min: Price,
    /// Upper bound on the dearest resting bid, mirrored.
    pub bid_max: Price,
}

impl BookState {
    pub fn new(max_price: Price) -> Self {
        Self {
            ask_min: max_price + 1,
            bid_max: MIN_PRICE - 1,
        }
    }

    pub fn reset(&mut self, max_price: Price) {
        *self = Self::new(max_price);
    }
}
