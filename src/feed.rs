//! Synthetic order feed.
//!
//! Generates the kind of stream the engine is pointed at in production:
//! limit orders over a narrow trader pool with an occasional cancel row
//! mixed in. Seeded, so every round of a replay sees the same stream.

use crate::config::ReplayConfig;
use crate::error::StoreError;
use crate::order::{tag, InputOrder, Price, SeqId, Side, Size, Tag, CANCEL_PRICE, MIN_PRICE};
use crate::store::MemoryStore;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

const SYMBOL: &str = "SYM";
const TRADERS: [&str; 9] = ["ID0", "ID1", "ID2", "ID3", "ID4", "ID5", "ID6", "ID7", "ID8"];
const MAX_ORDER_SIZE: Size = 1000;

/// Deterministic random order generator.
pub struct OrderGen {
    rng: ChaCha8Rng,
    symbol: Tag,
    cancel_chance: f64,
    max_price: Price,
    /// Limit orders emitted so far; cancel rows may only target the
    /// engine sequences those orders will receive.
    emitted: SeqId,
}

impl OrderGen {
    pub fn new(seed: u64, cancel_chance: f64, max_price: Price) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            symbol: tag(SYMBOL),
            cancel_chance,
            max_price,
            emitted: 0,
        }
    }

    /// Next row of the stream: a limit order, or with `cancel_chance` a
    /// cancellation of a previously generated order.
    pub fn next_row(&mut self) -> InputOrder {
        let trader = tag(TRADERS[self.rng.gen_range(0..TRADERS.len())]);

        if self.emitted > 0 && self.rng.gen_bool(self.cancel_chance) {
            let target = self.rng.gen_range(1..=self.emitted);
            return InputOrder {
                symbol: self.symbol,
                trader,
                side: Side::Bid,
                price: CANCEL_PRICE,
                size: target as Size,
            };
        }

        self.emitted += 1;
        InputOrder {
            symbol: self.symbol,
            trader,
            side: if self.rng.gen_bool(0.5) { Side::Bid } else { Side::Ask },
            price: self.rng.gen_range(MIN_PRICE..self.max_price),
            size: self.rng.gen_range(1..MAX_ORDER_SIZE),
        }
    }

    /// Generate `count` rows.
    pub fn generate(&mut self, count: usize) -> Vec<InputOrder> {
        (0..count).map(|_| self.next_row()).collect()
    }
}

/// Reset the store schema and fill it with a fresh generated stream.
pub fn seed_store(
    store: &MemoryStore,
    config: &ReplayConfig,
    max_price: Price,
) -> Result<(), StoreError> {
    store.reset_schema()?;
    let mut source = OrderGen::new(config.seed, config.cancel_chance, max_price);
    let rows = source.generate(config.orders);
    store.insert_orders(&rows)?;
    info!(rows = rows.len(), seed = config.seed, "store seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::MAX_PRICE;

    #[test]
    fn rows_are_well_formed() {
        let mut source = OrderGen::new(42, 0.05, MAX_PRICE);
        let mut limit_count: SeqId = 0;
        for _ in 0..5000 {
            let row = source.next_row();
            assert_eq!(row.symbol.as_str(), "SYM");
            assert!(row.trader.as_str().starts_with("ID"));
            if row.price == CANCEL_PRICE {
                // Cancel rows target a sequence already handed out.
                assert!(row.size >= 1);
                assert!(row.size <= limit_count as Size);
            } else {
                assert!(row.price >= MIN_PRICE && row.price < MAX_PRICE);
                assert!(row.size >= 1 && row.size < MAX_ORDER_SIZE);
                limit_count += 1;
            }
        }
        assert!(limit_count > 4000);
    }

    #[test]
    fn same_seed_same_stream() {
        let a = OrderGen::new(7, 0.05, MAX_PRICE).generate(1000);
        let b = OrderGen::new(7, 0.05, MAX_PRICE).generate(1000);
        assert_eq!(a, b);

        let c = OrderGen::new(8, 0.05, MAX_PRICE).generate(1000);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_cancel_chance_yields_no_cancel_rows() {
        let rows = OrderGen::new(1, 0.0, MAX_PRICE).generate(2000);
        assert!(rows.iter().all(|r| r.price != CANCEL_PRICE));
    }

    #[test]
    fn seed_store_populates_orders() {
        let store = MemoryStore::new();
        let config = ReplayConfig {
            orders: 500,
            ..ReplayConfig::default()
        };
        seed_store(&store, &config, MAX_PRICE).unwrap();
        assert_eq!(store.order_rows().unwrap().len(), 500);
    }
}
