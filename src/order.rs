//! Domain types shared by the engine, the synthetic feed, and the store.
//!
//! Orders flow in from an external source, deals flow out to the durable
//! store. Everything here is plain-old-data: `Copy`, fixed width, no heap.

use arrayvec::ArrayString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer price ordinal. Valid book prices live in `[MIN_PRICE, MAX_PRICE]`.
///
/// The price encodes a fixed-point decimal with two fractional digits
/// (12345 means 123.45) but the engine only ever compares and indexes it.
/// `u32` rather than `u16` so that `MAX_PRICE + 1`, the initial ask scan
/// pointer, stays representable without casts.
pub type Price = u32;

/// Units requested or remaining. Zero means fully consumed or cancelled.
pub type Size = u64;

/// Durable order id assigned by the order source. Monotonic within a run.
pub type OrderId = u64;

/// Engine-assigned sequence number. Doubles as the arena slot index, so a
/// cancel is a single indexed write.
pub type SeqId = u32;

/// Lowest valid book price.
pub const MIN_PRICE: Price = 1;

/// Highest valid book price.
pub const MAX_PRICE: Price = 65_535;

/// Input rows carrying this price encode a cancellation; their `size`
/// field then holds the engine sequence to cancel.
pub const CANCEL_PRICE: Price = 0;

/// Fixed-width identifier for symbols and traders (at most 8 bytes).
/// Stack-only so order nodes and deals stay `Copy`.
pub type Tag = ArrayString<8>;

/// Build a [`Tag`] from a short string, truncating past the fixed width.
pub fn tag(s: &str) -> Tag {
    let mut t = Tag::new();
    for c in s.chars() {
        if t.try_push(c).is_err() {
            break;
        }
    }
    t
}

/// Convert a book price to its two-fractional-digit decimal form.
pub fn price_to_decimal(price: Price) -> Decimal {
    Decimal::new(price as i64, 2)
}

/// Order side (bid = buy, ask = sell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// An order as produced by the generator, before the order source has
/// assigned it a durable id. Transient; never stored by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputOrder {
    pub symbol: Tag,
    pub trader: Tag,
    pub side: Side,
    pub price: Price,
    pub size: Size,
}

/// An [`InputOrder`] augmented with the durable id assigned by the order
/// source. Ids arrive in ascending order and are unique within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Tag,
    pub trader: Tag,
    pub side: Side,
    pub price: Price,
    pub size: Size,
}

impl Order {
    /// True if this row encodes a cancellation rather than a limit order.
    #[inline]
    pub fn is_cancel(&self) -> bool {
        self.price == CANCEL_PRICE
    }

    /// The engine sequence a cancellation row targets.
    ///
    /// Only meaningful when [`is_cancel`](Self::is_cancel) is true.
    #[inline]
    pub fn cancel_target(&self) -> SeqId {
        self.size as SeqId
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{symbol: {}, trader: {}, side: {}, price: {}, size: {}}}",
            self.symbol,
            self.trader,
            self.side,
            price_to_decimal(self.price),
            self.size
        )
    }
}

/// A single fill between one bid and one ask.
///
/// The price is always the resting (passive) order's price; the incoming
/// aggressive order takes the book price, never its own limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,
    pub bid_trader: Tag,
    pub ask_trader: Tag,
    pub symbol: Tag,
    pub price: Price,
    pub size: Size,
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{symbol: {}, bid: {}, ask: {}, price: {}, size: {}}}",
            self.symbol,
            self.bid_order_id,
            self.ask_order_id,
            price_to_decimal(self.price),
            self.size
        )
    }
}
