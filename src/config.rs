//! Configuration for the engine, the persister, and the replay driver.

use crate::order::{Price, MAX_PRICE};

/// Sizing of the in-memory book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Highest representable book price; the price-point table holds
    /// `max_price + 1` slots.
    pub max_price: Price,
    /// Arena capacity in order nodes. One slot is consumed per submitted
    /// order whether or not a residual rests.
    pub max_orders: u32,
    /// Deal log capacity.
    pub max_deals: usize,
}

impl EngineConfig {
    /// Small-capacity configuration for tests and benchmarks.
    pub fn with_capacity(max_orders: u32) -> Self {
        Self {
            max_orders,
            max_deals: (max_orders / 2).max(1) as usize,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_price: MAX_PRICE,
            max_orders: 1_010_000,
            max_deals: 505_000,
        }
    }
}

/// Sizing of persistence batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersistConfig {
    /// Deals per bulk-append chunk; one worker is spawned per chunk.
    pub batch: usize,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self { batch: 20_000 }
    }
}

/// Parameters of the demo replay driver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayConfig {
    /// Rows generated into the store per round.
    pub orders: usize,
    /// Number of replay rounds.
    pub rounds: usize,
    /// Orders per latency sample; one histogram entry is recorded per
    /// batch of this many feed rows.
    pub batch_size: usize,
    /// Generator seed. Fixed so rounds replay the same stream.
    pub seed: u64,
    /// Probability that a generated row is a cancellation.
    pub cancel_chance: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            orders: 100_000,
            rounds: 10,
            batch_size: 10,
            seed: 42,
            cancel_chance: 0.05,
        }
    }
}
