//! Time-bounded cache of in-flight exchanges.

use core::time::Duration;
use std::time::SystemTime;

use tracing::debug;

use super::PendingExchange;

/// Exchanges in insertion order, evicted lazily once stale.
///
/// Every lookup starts with an eviction pass, so stale entries and their
/// buffered bodies are released before anything can match them.
#[derive(Debug)]
pub(crate) struct ExchangeCache {
    entries: Vec<PendingExchange>,
    timeout: Duration,
}

impl ExchangeCache {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            entries: Vec::new(),
            timeout,
        }
    }

    pub(crate) fn evict_stale(&mut self, now: SystemTime) {
        let before = self.entries.len();
        let timeout = self.timeout;
        self.entries.retain(|exchange| !exchange.is_stale(now, timeout));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "Evicted stale exchanges");
        }
    }

    pub(crate) fn insert(&mut self, exchange: PendingExchange) {
        self.entries.push(exchange);
    }

    /// Index of the first exchange whose request carries `ack_num`.
    pub(crate) fn find_request(&self, ack_num: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|exchange| exchange.request.ack_num == ack_num)
    }

    /// Index of the first exchange with a response in progress on `ack_num`.
    pub(crate) fn find_response(&self, ack_num: u32) -> Option<usize> {
        self.entries.iter().position(|exchange| {
            exchange
                .response
                .as_ref()
                .is_some_and(|response| response.ack_num == ack_num)
        })
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut PendingExchange> {
        self.entries.get_mut(index)
    }

    pub(crate) fn remove(&mut self, index: usize) -> PendingExchange {
        self.entries.remove(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
