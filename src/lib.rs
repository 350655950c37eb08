//! # Crossbook
//!
//! A single-symbol, price-time priority limit order matching engine with
//! batched deal persistence.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one thread owns the book; correctness of
//!   price-time priority hinges on a single arbitration point. Scale out
//!   by sharding on symbol, not by parallelizing within one.
//! - **Flat Book**: price levels live in a plain array indexed by the
//!   integer price; the matching scan walks it from cached hint pointers.
//! - **Arena Allocation**: order nodes come from a pre-allocated pool and
//!   the hot path never calls the allocator. The slot index doubles as
//!   the engine sequence number.
//! - **Lazy Cancellation**: a cancel is one store of zero; dead nodes stay
//!   linked and the scan steps over them.
//! - **Batched Persistence**: fills accumulate in a bounded log that is
//!   flushed in parallel chunks inside one store transaction.
//!
//! ## Architecture
//!
//! ```text
//! [Order Source] --> [MatchingEngine] --> [DealLog]
//!    (claimed rows)       |                  |
//!                    [Arena + PricePointTable]
//!                                            |
//!                                       [Persister] --> [Durable Store]
//!                                     (chunked, joined before commit)
//! ```

pub mod arena;
pub mod book;
pub mod config;
pub mod deal_log;
pub mod error;
pub mod feed;
pub mod matching;
pub mod order;
pub mod persist;
pub mod store;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NIL};
pub use book::{BookState, PricePointTable};
pub use config::{EngineConfig, PersistConfig, ReplayConfig};
pub use deal_log::DealLog;
pub use error::{EngineError, StoreError};
pub use feed::OrderGen;
pub use matching::MatchingEngine;
pub use order::{
    price_to_decimal, tag, Deal, InputOrder, Order, OrderId, Price, SeqId, Side, Size, Tag,
    CANCEL_PRICE, MAX_PRICE, MIN_PRICE,
};
pub use persist::{FlushReport, Persister};
pub use store::{DealRow, MemoryStore, MemoryTxn, OrderRow, StoreTxn};
