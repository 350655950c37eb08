//! Matching engine - price-time priority crossing over the flat book.
//!
//! One order at a time, strictly serial. An incoming bid scans ask levels
//! upward from `ask_min`; an incoming ask scans bid levels downward from
//! `bid_max`. Each level is consumed in FIFO order. Whatever does not
//! cross rests in the book at its limit price.
//!
//! The hot path allocates nothing, takes no locks, and performs no I/O.
//! Cancelled orders are never unlinked; they sit in their FIFO with zero
//! size and the scan steps over them without emitting a deal.

use crate::arena::{Arena, ArenaIndex, NIL};
use crate::book::{BookState, PricePointTable};
use crate::config::EngineConfig;
use crate::deal_log::DealLog;
use crate::error::EngineError;
use crate::order::{Deal, Order, OrderId, Price, SeqId, Side, Size, Tag, MIN_PRICE};

/// Copy of the node fields a scan needs, so the arena borrow ends before
/// the log and table are touched.
#[derive(Clone, Copy)]
struct NodeView {
    remaining: Size,
    next: ArenaIndex,
    external_id: OrderId,
    trader: Tag,
}

/// Single-symbol continuous limit order matching engine.
pub struct MatchingEngine {
    arena: Arena,
    points: PricePointTable,
    state: BookState,
    log: DealLog,
    max_price: Price,
}

impl MatchingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            arena: Arena::new(config.max_orders),
            points: PricePointTable::new(config.max_price),
            state: BookState::new(config.max_price),
            log: DealLog::new(config.max_deals),
            max_price: config.max_price,
        }
    }

    /// Match or rest one limit order.
    ///
    /// Returns the engine-assigned sequence, which is the key for a later
    /// [`cancel`](Self::cancel). Every accepted order consumes one
    /// sequence whether or not any part of it rests.
    ///
    /// # Errors
    /// * [`EngineError::InvalidPrice`] / [`EngineError::InvalidSize`] are
    ///   rejected before any state changes.
    /// * [`EngineError::ArenaFull`] / [`EngineError::DealLogFull`] are
    ///   fatal to the run; the caller must [`reset`](Self::reset).
    pub fn submit(&mut self, order: Order) -> Result<SeqId, EngineError> {
        if order.price < MIN_PRICE || order.price > self.max_price {
            return Err(EngineError::InvalidPrice(order.price));
        }
        if order.size == 0 {
            return Err(EngineError::InvalidSize);
        }
        match order.side {
            Side::Bid => self.submit_bid(order),
            Side::Ask => self.submit_ask(order),
        }
    }

    /// Cancel the resting order with engine sequence `seq`.
    ///
    /// A single write: the node's remaining size goes to zero and later
    /// scans skip it. The node stays linked in its FIFO. Idempotent, and
    /// harmless for sequences whose order never rested.
    ///
    /// # Errors
    /// [`EngineError::UnknownSeq`] if `seq` was never assigned by this
    /// engine in the current run.
    pub fn cancel(&mut self, seq: SeqId) -> Result<(), EngineError> {
        if seq == 0 || seq > self.arena.last_seq() {
            return Err(EngineError::UnknownSeq(seq));
        }
        self.arena.get_mut(seq).remaining = 0;
        Ok(())
    }

    /// Zero all state: arena, price points, scan pointers, deal log.
    pub fn reset(&mut self) {
        self.arena.reset();
        self.points.reset();
        self.state.reset(self.max_price);
        self.log.clear();
    }

    /// Deals emitted since the last reset, in match order.
    #[inline]
    pub fn deals(&self) -> &[Deal] {
        self.log.as_slice()
    }

    /// Lower bound on the cheapest resting ask (a hint, not an exact
    /// minimum: drained levels are discovered lazily).
    #[inline]
    pub fn ask_min(&self) -> Price {
        self.state.ask_min
    }

    /// Upper bound on the dearest resting bid, mirrored.
    #[inline]
    pub fn bid_max(&self) -> Price {
        self.state.bid_max
    }

    /// Last sequence assigned in this run.
    #[inline]
    pub fn last_seq(&self) -> SeqId {
        self.arena.last_seq()
    }

    /// Remaining size of the node at `seq`, if assigned.
    ///
    /// Meaningful for live nodes. Nodes swept wholesale during a match
    /// are bypassed without a write-back, so their stored size is stale.
    pub fn remaining_size(&self, seq: SeqId) -> Option<Size> {
        if seq == 0 || seq > self.arena.last_seq() {
            return None;
        }
        Some(self.arena.get(seq).remaining)
    }

    /// Total live size resting at `price`. Walks the level; not for the
    /// hot path.
    pub fn level_size(&self, price: Price) -> Size {
        let mut total = 0;
        let mut idx = self.points.head(price);
        while idx != NIL {
            let node = self.arena.get(idx);
            total += node.remaining;
            idx = node.next;
        }
        total
    }

    /// Pre-fault arena pages before a timed run.
    pub fn warm_up(&self) {
        self.arena.warm_up();
    }

    #[inline]
    fn view(&self, idx: ArenaIndex) -> NodeView {
        let node = self.arena.get(idx);
        NodeView {
            remaining: node.remaining,
            next: node.next,
            external_id: node.external_id,
            trader: node.trader,
        }
    }

    /// Write the residual of `order` into slot `seq` and queue it.
    fn rest(&mut self, order: &Order, seq: SeqId, remaining: Size) {
        let node = self.arena.get_mut(seq);
        node.remaining = remaining;
        node.trader = order.trader;
        node.external_id = order.id;
        node.next = NIL;
        self.points.append(&mut self.arena, order.price, seq);
    }

    fn submit_bid(&mut self, order: Order) -> Result<SeqId, EngineError> {
        let seq = self.arena.allocate()?;
        let mut remaining = order.size;

        // Walk ask levels upward while they still cross the limit. The
        // bound is re-checked before indexing so a fully drained ask side
        // can never step the pointer past the table.
        while order.price >= self.state.ask_min {
            let level = self.state.ask_min;
            let mut idx = self.points.head(level);
            while idx != NIL {
                let node = self.view(idx);
                if node.remaining < remaining {
                    // Maker consumed whole (or dead, size zero: skip).
                    if node.remaining > 0 {
                        self.log.push(Deal {
                            bid_order_id: order.id,
                            ask_order_id: node.external_id,
                            bid_trader: order.trader,
                            ask_trader: node.trader,
                            symbol: order.symbol,
                            price: level,
                            size: node.remaining,
                        })?;
                        remaining -= node.remaining;
                    }
                    idx = node.next;
                } else {
                    // Incoming fully filled at this node.
                    self.log.push(Deal {
                        bid_order_id: order.id,
                        ask_order_id: node.external_id,
                        bid_trader: order.trader,
                        ask_trader: node.trader,
                        symbol: order.symbol,
                        price: level,
                        size: remaining,
                    })?;
                    if node.remaining > remaining {
                        self.arena.get_mut(idx).remaining = node.remaining - remaining;
                        self.points.set_head(level, idx);
                    } else if node.next != NIL {
                        self.points.set_head(level, node.next);
                    } else {
                        self.points.clear(level);
                        self.state.ask_min = level + 1;
                    }
                    return Ok(seq);
                }
            }
            self.points.clear(level);
            self.state.ask_min = level + 1;
        }

        self.rest(&order, seq, remaining);
        if self.state.bid_max < order.price {
            self.state.bid_max = order.price;
        }
        Ok(seq)
    }

    fn submit_ask(&mut self, order: Order) -> Result<SeqId, EngineError> {
        let seq = self.arena.allocate()?;
        let mut remaining = order.size;

        while order.price <= self.state.bid_max {
            let level = self.state.bid_max;
            let mut idx = self.points.head(level);
            while idx != NIL {
                let node = self.view(idx);
                if node.remaining < remaining {
                    if node.remaining > 0 {
                        self.log.push(Deal {
                            bid_order_id: node.external_id,
                            ask_order_id: order.id,
                            bid_trader: node.trader,
                            ask_trader: order.trader,
                            symbol: order.symbol,
                            price: level,
                            size: node.remaining,
                        })?;
                        remaining -= node.remaining;
                    }
                    idx = node.next;
                } else {
                    self.log.push(Deal {
                        bid_order_id: node.external_id,
                        ask_order_id: order.id,
                        bid_trader: node.trader,
                        ask_trader: order.trader,
                        symbol: order.symbol,
                        price: level,
                        size: remaining,
                    })?;
                    if node.remaining > remaining {
                        self.arena.get_mut(idx).remaining = node.remaining - remaining;
                        self.points.set_head(level, idx);
                    } else if node.next != NIL {
                        self.points.set_head(level, node.next);
                    } else {
                        self.points.clear(level);
                        self.state.bid_max = level - 1;
                    }
                    return Ok(seq);
                }
            }
            self.points.clear(level);
            self.state.bid_max = level - 1;
        }

        self.rest(&order, seq, remaining);
        if self.state.ask_min > order.price {
            self.state.ask_min = order.price;
        }
        Ok(seq)
    }
}
