//! Typed errors for the engine core and the durable store.
//!
//! The engine recovers from nothing locally: capacity errors are fatal to
//! the run (callers must reset), input errors are rejected before any
//! state mutation, and store errors abort the enclosing flush.

use crate::order::{Price, SeqId, MAX_PRICE, MIN_PRICE};
use thiserror::Error;

/// Errors surfaced by [`MatchingEngine`](crate::matching::MatchingEngine).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The order arena has no free slots. Fatal to the run.
    #[error("order arena capacity exceeded ({0} slots)")]
    ArenaFull(u32),

    /// The deal log has no free entries. Fatal to the run.
    #[error("deal log capacity exceeded ({0} entries)")]
    DealLogFull(usize),

    /// Submitted price outside the valid book range.
    #[error("price {0} outside [{MIN_PRICE}, {MAX_PRICE}]")]
    InvalidPrice(Price),

    /// Submitted size was zero.
    #[error("order size must be non-zero")]
    InvalidSize,

    /// Cancellation referenced a sequence this engine never assigned.
    #[error("unknown engine sequence {0}")]
    UnknownSeq(SeqId),
}

/// Errors surfaced by the durable store and the persister.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The order rows are already claimed by another session. Fail-fast
    /// equivalent of a row lock with NOWAIT: the caller is expected to
    /// give up, not to retry in a loop.
    #[error("order rows locked by another session")]
    RowsLocked,

    /// A store lock was poisoned by a panicking holder.
    #[error("store lock poisoned")]
    Poisoned,

    /// A persist worker terminated abnormally.
    #[error("persist worker failed")]
    WorkerFailed,
}
