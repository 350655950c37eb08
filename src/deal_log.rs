//! Deal log - bounded append-only buffer of emitted fills.
//!
//! The matching loop appends here and nothing else reads until the batch
//! is over; the persister then drains the whole slice in one flush. Order
//! of entries is exactly the order the matches occurred.

use crate::error::EngineError;
use crate::order::Deal;

/// Append-only fill buffer with a fixed capacity.
pub struct DealLog {
    deals: Vec<Deal>,
    capacity: usize,
}

impl DealLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            deals: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one deal.
    ///
    /// # Errors
    /// [`EngineError::DealLogFull`] when the buffer is at capacity. Fatal
    /// to the run: fills emitted past this point could not be recorded.
    #[inline]
    pub fn push(&mut self, deal: Deal) -> Result<(), EngineError> {
        if self.deals.len() == self.capacity {
            return Err(EngineError::DealLogFull(self.capacity));
        }
        self.deals.push(deal);
        Ok(())
    }

    /// All deals emitted so far, in emission order.
    #[inline]
    pub fn as_slice(&self) -> &[Deal] {
        &self.deals
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Drop all entries. Capacity is retained.
    pub fn clear(&mut self) {
        self.deals.clear();
    }
}
