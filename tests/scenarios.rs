//! Concrete matching scenarios with exact expected deal streams.

use crossbook::{tag, EngineConfig, MatchingEngine, Order, OrderId, Price, Side, Size, MAX_PRICE};

fn engine() -> MatchingEngine {
    MatchingEngine::new(EngineConfig::with_capacity(1024))
}

fn order(id: OrderId, side: Side, price: Price, size: Size) -> Order {
    Order {
        id,
        symbol: tag("SYM"),
        trader: tag("ID0"),
        side,
        price,
        size,
    }
}

fn deal_summary(e: &MatchingEngine) -> Vec<(OrderId, OrderId, Price, Size)> {
    e.deals()
        .iter()
        .map(|d| (d.bid_order_id, d.ask_order_id, d.price, d.size))
        .collect()
}

#[test]
fn exact_fill_single_pair() {
    let mut e = engine();
    e.submit(order(1, Side::Bid, 100, 5)).unwrap();
    e.submit(order(2, Side::Ask, 100, 5)).unwrap();

    assert_eq!(deal_summary(&e), vec![(1, 2, 100, 5)]);

    // Book is empty again. The scan pointers are hints: the ask pointer
    // never moved, the bid pointer sits at or below the drained level.
    assert_eq!(e.level_size(100), 0);
    assert_eq!(e.ask_min(), MAX_PRICE + 1);
    assert!(e.bid_max() < 100);
    assert!(e.ask_min() > e.bid_max());
}

#[test]
fn aggressive_bid_walks_two_levels() {
    let mut e = engine();
    e.submit(order(1, Side::Ask, 100, 3)).unwrap();
    let second = e.submit(order(2, Side::Ask, 101, 2)).unwrap();
    e.submit(order(3, Side::Bid, 101, 4)).unwrap();

    // Cheapest level first, then a partial bite of the next.
    assert_eq!(deal_summary(&e), vec![(3, 1, 100, 3), (3, 2, 101, 1)]);

    // One resting ask remains at 101 with a single unit.
    assert_eq!(e.remaining_size(second), Some(1));
    assert_eq!(e.level_size(101), 1);

    // The bid fully filled, so the bid pointer never widened.
    assert_eq!(e.bid_max(), 0);
}

#[test]
fn partial_fill_rests_the_maker() {
    let mut e = engine();
    let ask = e.submit(order(1, Side::Ask, 100, 10)).unwrap();
    e.submit(order(2, Side::Bid, 100, 3)).unwrap();

    assert_eq!(deal_summary(&e), vec![(2, 1, 100, 3)]);
    assert_eq!(e.remaining_size(ask), Some(7));
    assert_eq!(e.level_size(100), 7);
    assert_eq!(e.ask_min(), 100);
}

#[test]
fn time_priority_within_a_price() {
    let mut e = engine();
    e.submit(order(1, Side::Bid, 50, 5)).unwrap(); // A
    let b = e.submit(order(2, Side::Bid, 50, 5)).unwrap(); // B
    e.submit(order(3, Side::Ask, 50, 7)).unwrap();

    // A is consumed in full before B gives anything up.
    assert_eq!(deal_summary(&e), vec![(1, 3, 50, 5), (2, 3, 50, 2)]);
    assert_eq!(e.remaining_size(b), Some(3));
    assert_eq!(e.level_size(50), 3);
}

#[test]
fn cancelled_order_is_skipped_by_the_scan() {
    let mut e = engine();
    let seq = e.submit(order(1, Side::Ask, 100, 5)).unwrap();
    e.cancel(seq).unwrap();
    e.submit(order(2, Side::Bid, 100, 5)).unwrap();

    // No fills; the incoming bid found only a dead node and rests.
    assert!(e.deals().is_empty());
    assert_eq!(e.level_size(100), 5);
    assert_eq!(e.bid_max(), 100);
    assert!(e.ask_min() > e.bid_max());
}

#[test]
fn scan_pointer_advances_past_drained_levels() {
    let mut e = engine();
    e.submit(order(1, Side::Ask, 100, 1)).unwrap();
    e.submit(order(2, Side::Ask, 102, 1)).unwrap();
    e.submit(order(3, Side::Bid, 102, 2)).unwrap();

    assert_eq!(deal_summary(&e), vec![(3, 1, 100, 1), (3, 2, 102, 1)]);

    // Both ask levels drained; the pointer moved past the last one.
    assert!(e.ask_min() > 102);
    assert_eq!(e.level_size(100), 0);
    assert_eq!(e.level_size(102), 0);
}

#[test]
fn deal_price_is_always_the_passive_price() {
    let mut e = engine();
    // Resting ask at 95, aggressive bid limit 105: trades at 95.
    e.submit(order(1, Side::Ask, 95, 4)).unwrap();
    e.submit(order(2, Side::Bid, 105, 4)).unwrap();
    assert_eq!(deal_summary(&e), vec![(2, 1, 95, 4)]);

    // Resting bid at 105, aggressive ask limit 95: trades at 105.
    e.submit(order(3, Side::Bid, 105, 4)).unwrap();
    e.submit(order(4, Side::Ask, 95, 4)).unwrap();
    assert_eq!(
        deal_summary(&e),
        vec![(2, 1, 95, 4), (3, 4, 105, 4)]
    );
}
