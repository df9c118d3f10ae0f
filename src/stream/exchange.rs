//! In-flight request/response pair.
//!
//! A `PendingExchange` is created when a request is first framed and lives
//! until its response completes or it goes stale.

use core::time::Duration;
use std::time::SystemTime;

use crate::http::{Request, Response};

#[derive(Debug)]
pub(crate) struct PendingExchange {
    created: SystemTime,
    pub(crate) request: Request,
    pub(crate) response: Option<Response>,
}

impl PendingExchange {
    pub(crate) fn new(request: Request, now: SystemTime) -> Self {
        Self {
            created: now,
            request,
            response: None,
        }
    }

    /// Stale once `timeout` has passed since the request was first framed,
    /// however recently it saw traffic. A clock that runs backwards never
    /// makes an exchange stale.
    pub(crate) fn is_stale(&self, now: SystemTime, timeout: Duration) -> bool {
        now.duration_since(self.created)
            .is_ok_and(|elapsed| elapsed >= timeout)
    }
}
