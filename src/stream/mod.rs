//! Tracking of in-flight HTTP exchanges.
//!
//! Requests and responses seen on the wire are correlated through TCP
//! sequence and acknowledgment numbers. This module keeps the exchanges that
//! are still waiting for bytes, and drops them once they go stale.

mod cache;
mod exchange;

pub(crate) use cache::ExchangeCache;
pub(crate) use exchange::PendingExchange;
