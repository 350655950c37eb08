//! Replaying the same seeded stream must produce identical results.

use crossbook::{Deal, EngineConfig, MatchingEngine, Order, OrderGen, SeqId, MAX_PRICE};

fn replay(seed: u64, rows: usize) -> (Vec<Deal>, SeqId) {
    let mut config = EngineConfig::with_capacity(rows as u32 + 2);
    config.max_deals = 2 * rows + 2;
    let mut engine = MatchingEngine::new(config);

    let mut source = OrderGen::new(seed, 0.05, MAX_PRICE);
    for (i, input) in source.generate(rows).into_iter().enumerate() {
        let order = Order {
            id: i as u64 + 1,
            symbol: input.symbol,
            trader: input.trader,
            side: input.side,
            price: input.price,
            size: input.size,
        };
        if order.is_cancel() {
            engine.cancel(order.cancel_target()).unwrap();
        } else {
            engine.submit(order).unwrap();
        }
    }
    (engine.deals().to_vec(), engine.last_seq())
}

#[test]
fn same_seed_same_deal_stream() {
    let (deals_a, seq_a) = replay(42, 10_000);
    let (deals_b, seq_b) = replay(42, 10_000);

    assert_eq!(seq_a, seq_b);
    assert_eq!(deals_a, deals_b);
    assert!(!deals_a.is_empty(), "stream should produce fills");
}

#[test]
fn different_seeds_diverge() {
    let (deals_a, _) = replay(1, 5_000);
    let (deals_b, _) = replay(2, 5_000);
    assert_ne!(deals_a, deals_b);
}

#[test]
fn reset_then_replay_matches_fresh_engine() {
    let rows = 3_000;
    let mut config = EngineConfig::with_capacity(rows as u32 + 2);
    config.max_deals = 2 * rows as usize + 2;
    let mut engine = MatchingEngine::new(config);

    let feed = |engine: &mut MatchingEngine| {
        let mut source = OrderGen::new(7, 0.05, MAX_PRICE);
        for (i, input) in source.generate(rows as usize).into_iter().enumerate() {
            let order = Order {
                id: i as u64 + 1,
                symbol: input.symbol,
                trader: input.trader,
                side: input.side,
                price: input.price,
                size: input.size,
            };
            if order.is_cancel() {
                engine.cancel(order.cancel_target()).unwrap();
            } else {
                engine.submit(order).unwrap();
            }
        }
    };

    feed(&mut engine);
    let first = engine.deals().to_vec();

    engine.reset();
    feed(&mut engine);
    assert_eq!(engine.deals(), first.as_slice());
}
