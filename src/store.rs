//! Durable store interface and in-memory reference implementation.
//!
//! The engine treats the store as an opaque sink with two relations:
//! `orders` (read with a claim, updated with consumed sizes) and `deals`
//! (append-only). [`StoreTxn`] is the seam a SQL-backed implementation
//! would fill in; [`MemoryStore`] implements the full transactional
//! contract in memory and backs the replay driver and the tests.
//!
//! Transaction semantics:
//! * writes are staged and invisible to other transactions until commit;
//! * dropping a transaction without committing discards its writes;
//! * fetching orders claims the rows for this transaction, and a second
//!   concurrent claim fails immediately instead of blocking (the NOWAIT
//!   flavor of a row lock).

use crate::error::StoreError;
use crate::order::{Deal, InputOrder, Order, OrderId, Price, Side, Size, Tag, CANCEL_PRICE};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// One row of the `orders` relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub symbol: Tag,
    pub trader: Tag,
    pub side: Side,
    pub price: Price,
    pub size: Size,
    /// Units already matched away in committed runs. `None` until the
    /// first flush touches this order.
    pub consumed_size: Option<Size>,
}

impl OrderRow {
    /// Units still available to the engine: `size - consumed_size`.
    pub fn effective_size(&self) -> Size {
        self.size.saturating_sub(self.consumed_size.unwrap_or(0))
    }
}

/// One row of the `deals` relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealRow {
    /// Serial primary key assigned at commit.
    pub id: u64,
    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,
    pub price: Price,
    pub size: Size,
    pub symbol: Tag,
}

/// Transactional handle on the durable store.
///
/// Append and reconcile take `&self` so persist workers can share one
/// transaction across threads, each issuing its own calls.
pub trait StoreTxn: Sync {
    /// Read all order rows in id order and claim them for this
    /// transaction.
    ///
    /// Sizes come back consumption-adjusted; non-cancel rows with nothing
    /// left are skipped, which is what lets a resumed run pick up a
    /// partially processed book.
    ///
    /// # Errors
    /// [`StoreError::RowsLocked`] if another live transaction holds the
    /// claim.
    fn fetch_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Bulk-append deals. May be called concurrently by several workers.
    fn append_deals(&self, deals: &[Deal]) -> Result<(), StoreError>;

    /// For every order id in `[min_id, max_id]` that appears in the deals
    /// relation (committed rows plus this transaction's staged rows), set
    /// its `consumed_size` to the sum of those deal sizes.
    ///
    /// Assignment, not accumulation: a run flushes once, so the deals
    /// visible here are all the deals for the range. Flushing one order
    /// range across several transactions would need a cumulative update
    /// instead.
    fn reconcile_consumed(&self, min_id: OrderId, max_id: OrderId) -> Result<(), StoreError>;

    /// Publish all staged writes atomically and release the claim.
    fn commit(self) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Tables {
    orders: Vec<OrderRow>,
    deals: Vec<DealRow>,
    /// Set while a live transaction has claimed the order rows.
    claimed: bool,
}

#[derive(Default)]
struct Staged {
    deals: Vec<Deal>,
    consumed: FxHashMap<OrderId, Size>,
}

/// In-memory durable store.
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Drop and recreate both relations.
    pub fn reset_schema(&self) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        *tables = Tables::default();
        info!("store schema reset");
        Ok(())
    }

    /// Append input rows to the `orders` relation, assigning serial ids.
    pub fn insert_orders(&self, inputs: &[InputOrder]) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let next_id = tables.orders.len() as OrderId + 1;
        tables.orders.extend(inputs.iter().enumerate().map(|(i, input)| OrderRow {
            id: next_id + i as OrderId,
            symbol: input.symbol,
            trader: input.trader,
            side: input.side,
            price: input.price,
            size: input.size,
            consumed_size: None,
        }));
        info!(count = inputs.len(), "order rows inserted");
        Ok(())
    }

    /// Open a transaction.
    pub fn begin(&self) -> Result<MemoryTxn<'_>, StoreError> {
        Ok(MemoryTxn {
            store: self,
            staged: Mutex::new(Staged::default()),
            claimed: AtomicBool::new(false),
            committed: false,
        })
    }

    /// Committed deal rows, for verification and reporting.
    pub fn deal_rows(&self) -> Result<Vec<DealRow>, StoreError> {
        Ok(self.lock()?.deals.clone())
    }

    /// Committed order rows, for verification and reporting.
    pub fn order_rows(&self) -> Result<Vec<OrderRow>, StoreError> {
        Ok(self.lock()?.orders.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A live transaction on a [`MemoryStore`].
pub struct MemoryTxn<'a> {
    store: &'a MemoryStore,
    staged: Mutex<Staged>,
    claimed: AtomicBool,
    committed: bool,
}

impl MemoryTxn<'_> {
    fn lock_staged(&self) -> Result<MutexGuard<'_, Staged>, StoreError> {
        self.staged.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl StoreTxn for MemoryTxn<'_> {
    fn fetch_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut tables = self.store.lock()?;
        if tables.claimed {
            return Err(StoreError::RowsLocked);
        }
        tables.claimed = true;
        self.claimed.store(true, Ordering::Relaxed);

        let mut out = Vec::with_capacity(tables.orders.len());
        for row in &tables.orders {
            if row.price == CANCEL_PRICE {
                // Cancellation rows pass through untouched; their size
                // field carries the target sequence, not units.
                out.push(Order {
                    id: row.id,
                    symbol: row.symbol,
                    trader: row.trader,
                    side: row.side,
                    price: row.price,
                    size: row.size,
                });
                continue;
            }
            let effective = row.effective_size();
            if effective == 0 {
                continue;
            }
            out.push(Order {
                id: row.id,
                symbol: row.symbol,
                trader: row.trader,
                side: row.side,
                price: row.price,
                size: effective,
            });
        }
        debug!(rows = out.len(), "order rows fetched and claimed");
        Ok(out)
    }

    fn append_deals(&self, deals: &[Deal]) -> Result<(), StoreError> {
        let mut staged = self.lock_staged()?;
        staged.deals.extend_from_slice(deals);
        Ok(())
    }

    fn reconcile_consumed(&self, min_id: OrderId, max_id: OrderId) -> Result<(), StoreError> {
        // Consistent lock order with commit: tables before staged.
        let tables = self.store.lock()?;
        let mut staged = self.lock_staged()?;

        let mut sums: FxHashMap<OrderId, Size> = FxHashMap::default();
        let committed = tables
            .deals
            .iter()
            .map(|row| (row.bid_order_id, row.ask_order_id, row.size));
        let pending = staged
            .deals
            .iter()
            .map(|deal| (deal.bid_order_id, deal.ask_order_id, deal.size));
        for (bid_id, ask_id, size) in committed.chain(pending) {
            for id in [bid_id, ask_id] {
                if id >= min_id && id <= max_id {
                    *sums.entry(id).or_default() += size;
                }
            }
        }

        debug!(min_id, max_id, orders = sums.len(), "consumed sizes reconciled");
        staged.consumed.extend(sums);
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let mut tables = self.store.lock()?;
        let staged = std::mem::take(&mut *self.lock_staged()?);

        let next_id = tables.deals.len() as u64 + 1;
        tables
            .deals
            .extend(staged.deals.into_iter().enumerate().map(|(i, deal)| DealRow {
                id: next_id + i as u64,
                bid_order_id: deal.bid_order_id,
                ask_order_id: deal.ask_order_id,
                price: deal.price,
                size: deal.size,
                symbol: deal.symbol,
            }));

        for (id, consumed) in staged.consumed {
            let Some(index) = (id as usize).checked_sub(1) else {
                continue;
            };
            if let Some(row) = tables.orders.get_mut(index) {
                debug_assert_eq!(row.id, id);
                row.consumed_size = Some(consumed);
            }
        }

        if self.claimed.load(Ordering::Relaxed) {
            tables.claimed = false;
        }
        self.committed = true;
        info!(deals = tables.deals.len(), "transaction committed");
        Ok(())
    }
}

impl Drop for MemoryTxn<'_> {
    fn drop(&mut self) {
        // An uncommitted transaction releases its claim; staged writes
        // die with it.
        if !self.committed && self.claimed.load(Ordering::Relaxed) {
            if let Ok(mut tables) = self.store.tables.lock() {
                tables.claimed = false;
            }
        }
    }
}
