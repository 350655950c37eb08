//! Replay driver - seeds the store, replays the stream through the
//! engine round after round, and reports batch latency percentiles.

use crossbook::{
    feed, EngineConfig, MatchingEngine, MemoryStore, PersistConfig, Persister, ReplayConfig,
    StoreTxn,
};
use hdrhistogram::Histogram;
use std::time::{Duration, Instant};
use tracing::info;

fn mean_secs(samples: &[Duration]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(Duration::as_secs_f64).sum::<f64>() / samples.len() as f64
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let engine_cfg = EngineConfig::default();
    let persist_cfg = PersistConfig::default();
    let replay = ReplayConfig::default();

    let store = MemoryStore::new();
    let mut engine = MatchingEngine::new(engine_cfg);
    let persister = Persister::new(persist_cfg);

    info!(
        orders = replay.orders,
        rounds = replay.rounds,
        batch = persist_cfg.batch,
        "warming up"
    );
    engine.warm_up();

    // One sample per feed batch, in nanoseconds.
    let mut batch_hist = Histogram::<u64>::new_with_bounds(1, 10_000_000_000, 3)?;
    let mut fetch_times = Vec::with_capacity(replay.rounds);
    let mut persist_times = Vec::with_capacity(replay.rounds);
    let mut round_times = Vec::with_capacity(replay.rounds);
    let mut total_deals = 0usize;

    for round in 1..=replay.rounds {
        info!(round, "=== round started");
        feed::seed_store(&store, &replay, engine_cfg.max_price)?;
        engine.reset();

        let round_start = Instant::now();
        let txn = store.begin()?;

        let fetch_start = Instant::now();
        let orders = txn.fetch_orders()?;
        fetch_times.push(fetch_start.elapsed());

        for batch in orders.chunks(replay.batch_size) {
            let start = Instant::now();
            for order in batch {
                if order.is_cancel() {
                    engine.cancel(order.cancel_target())?;
                } else {
                    engine.submit(*order)?;
                }
            }
            let _ = batch_hist.record(start.elapsed().as_nanos() as u64);
        }

        let persist_start = Instant::now();
        let report = persister.flush(&txn, engine.deals())?;
        txn.commit()?;
        persist_times.push(persist_start.elapsed());
        round_times.push(round_start.elapsed());
        total_deals += report.deals;

        info!(round, deals = report.deals, chunks = report.chunks, "round complete");
    }

    if let Some(deal) = engine.deals().first() {
        println!("sample deal: {deal}");
    }

    println!("\n=== Engine Batch Latency ({} orders/batch, ns) ===", replay.batch_size);
    println!("Batches: {}", batch_hist.len());
    println!("Min:    {:8} ns", batch_hist.min());
    println!("P50:    {:8} ns", batch_hist.value_at_quantile(0.50));
    println!("P90:    {:8} ns", batch_hist.value_at_quantile(0.90));
    println!("P99:    {:8} ns", batch_hist.value_at_quantile(0.99));
    println!("P99.9:  {:8} ns", batch_hist.value_at_quantile(0.999));
    println!("Max:    {:8} ns", batch_hist.max());
    println!("-----------------------------------------------");
    println!("[fetch]   mean = {:.6} s", mean_secs(&fetch_times));
    println!("[persist] mean = {:.6} s", mean_secs(&persist_times));
    println!("[total]   mean = {:.6} s per round", mean_secs(&round_times));

    let total_secs: f64 = round_times.iter().map(Duration::as_secs_f64).sum();
    let processed = replay.orders * replay.rounds;
    println!(
        "[total]   {:.1} orders/sec, {} deals over {} rounds",
        processed as f64 / total_secs,
        total_deals,
        replay.rounds
    );

    Ok(())
}
