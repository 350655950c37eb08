//! Persister - batched write-back of the deal log.
//!
//! The deal log is split into contiguous chunks and each chunk gets its
//! own worker on the shared transaction: a bulk append followed by one
//! aggregating consumed-size update over the chunk's order-id range.
//! Aggregating from the deals relation costs one update per chunk instead
//! of two per deal.
//!
//! All workers join before `flush` returns; commit stays with the caller,
//! so a failed flush simply leaves the transaction to be dropped.

use crate::config::PersistConfig;
use crate::error::StoreError;
use crate::order::Deal;
use crate::store::StoreTxn;
use serde::Serialize;
use std::thread;
use tracing::{debug, info};

/// Summary of a completed flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub deals: usize,
    pub chunks: usize,
}

/// Writes deal batches to a store transaction.
pub struct Persister {
    batch: usize,
}

impl Persister {
    pub fn new(config: PersistConfig) -> Self {
        Self {
            batch: config.batch.max(1),
        }
    }

    /// Persist every deal in `deals` within the given transaction.
    ///
    /// On error the transaction is left uncommitted; the in-memory deal
    /// log is untouched either way, so the caller may retry with a fresh
    /// transaction or give up.
    pub fn flush<T: StoreTxn>(&self, txn: &T, deals: &[Deal]) -> Result<FlushReport, StoreError> {
        if deals.is_empty() {
            return Ok(FlushReport { deals: 0, chunks: 0 });
        }

        let report = FlushReport {
            deals: deals.len(),
            chunks: deals.len().div_ceil(self.batch),
        };

        thread::scope(|scope| -> Result<(), StoreError> {
            let mut workers = Vec::with_capacity(report.chunks);
            for chunk in deals.chunks(self.batch) {
                workers.push(scope.spawn(move || persist_chunk(txn, chunk)));
            }
            for worker in workers {
                worker.join().map_err(|_| StoreError::WorkerFailed)??;
            }
            Ok(())
        })?;

        info!(deals = report.deals, chunks = report.chunks, "deal log flushed");
        Ok(report)
    }
}

impl Default for Persister {
    fn default() -> Self {
        Self::new(PersistConfig::default())
    }
}

fn persist_chunk<T: StoreTxn>(txn: &T, chunk: &[Deal]) -> Result<(), StoreError> {
    txn.append_deals(chunk)?;

    let mut min_id = u64::MAX;
    let mut max_id = 0;
    for deal in chunk {
        min_id = min_id.min(deal.bid_order_id).min(deal.ask_order_id);
        max_id = max_id.max(deal.bid_order_id).max(deal.ask_order_id);
    }
    txn.reconcile_consumed(min_id, max_id)?;

    debug!(len = chunk.len(), min_id, max_id, "deal chunk persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{tag, InputOrder, OrderId, Side, Size};
    use crate::store::MemoryStore;

    fn deal(bid: OrderId, ask: OrderId, size: Size) -> Deal {
        Deal {
            bid_order_id: bid,
            ask_order_id: ask,
            bid_trader: tag("ID0"),
            ask_trader: tag("ID1"),
            symbol: tag("SYM"),
            price: 250,
            size,
        }
    }

    fn seed(store: &MemoryStore, sizes: &[Size]) {
        let inputs: Vec<InputOrder> = sizes
            .iter()
            .map(|&size| InputOrder {
                symbol: tag("SYM"),
                trader: tag("ID0"),
                side: Side::Bid,
                price: 250,
                size,
            })
            .collect();
        store.insert_orders(&inputs).unwrap();
    }

    #[test]
    fn empty_flush_is_a_no_op() {
        let store = MemoryStore::new();
        let txn = store.begin().unwrap();
        let report = Persister::default().flush(&txn, &[]).unwrap();
        assert_eq!(report, FlushReport { deals: 0, chunks: 0 });
    }

    #[test]
    fn flush_chunks_and_reconciles() {
        let store = MemoryStore::new();
        seed(&store, &[10, 10, 10, 10]);

        // Order 1 buys from orders 2 and 3; order 4 buys from order 3.
        let deals = [deal(1, 2, 4), deal(1, 3, 6), deal(4, 3, 2)];
        let persister = Persister::new(PersistConfig { batch: 2 });

        let txn = store.begin().unwrap();
        let report = persister.flush(&txn, &deals).unwrap();
        assert_eq!(report, FlushReport { deals: 3, chunks: 2 });
        txn.commit().unwrap();

        let rows = store.deal_rows().unwrap();
        assert_eq!(rows.len(), 3);
        let mut sizes: Vec<Size> = rows.iter().map(|r| r.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 4, 6]);

        let orders = store.order_rows().unwrap();
        assert_eq!(orders[0].consumed_size, Some(10)); // 4 + 6
        assert_eq!(orders[1].consumed_size, Some(4));
        assert_eq!(orders[2].consumed_size, Some(8)); // 6 + 2
        assert_eq!(orders[3].consumed_size, Some(2));
    }

    #[test]
    fn single_chunk_when_batch_is_large() {
        let store = MemoryStore::new();
        seed(&store, &[5, 5]);

        let txn = store.begin().unwrap();
        let report = Persister::default().flush(&txn, &[deal(1, 2, 5)]).unwrap();
        assert_eq!(report.chunks, 1);
        txn.commit().unwrap();
        assert_eq!(store.order_rows().unwrap()[0].consumed_size, Some(5));
    }

    #[test]
    fn unflushed_transaction_leaves_store_clean() {
        let store = MemoryStore::new();
        seed(&store, &[5, 5]);

        {
            let txn = store.begin().unwrap();
            Persister::default().flush(&txn, &[deal(1, 2, 5)]).unwrap();
            // Dropped without commit.
        }

        assert!(store.deal_rows().unwrap().is_empty());
        assert_eq!(store.order_rows().unwrap()[0].consumed_size, None);
    }
}
