//! Reassembly of HTTP messages from TCP segments.
//!
//! The decoder is fed one segment at a time. A segment either continues a
//! request or response already being assembled, or starts a new message.
//! Requests and responses are tied together through TCP numbers: a response's
//! first segment carries a sequence number equal to the acknowledgment number
//! of its request, and every later segment of one message repeats that
//! message's acknowledgment number.
//!
//! The decoder holds mutable state and is not synchronised; give each capture
//! thread its own instance.

use core::time::Duration;
use std::time::SystemTime;

use tracing::{debug, trace, warn};

use crate::error::DecodeError;
use crate::http::{ExchangeId, Frame, Message, Request, Response, frame_message};
use crate::packet::Segment;
use crate::stream::{ExchangeCache, PendingExchange};

/// How long an exchange may wait for its next segment.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub timeout: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }
}

/// Result of offering a segment to the exchanges already in flight.
enum Continuation {
    Unmatched,
    Absorbed,
    Completed(Box<Message>),
}

#[derive(Debug)]
pub struct Decoder {
    cache: ExchangeCache,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            cache: ExchangeCache::new(config.timeout),
        }
    }

    /// Number of exchanges currently held.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cache.len()
    }

    /// Feed one segment to the decoder.
    ///
    /// Returns a message once it is complete. Each message is returned at
    /// most once. The segment's capture timestamp is the clock used to age
    /// cached exchanges.
    pub fn decode(&mut self, segment: &Segment<'_>) -> Result<Option<Message>, DecodeError> {
        if segment.payload.is_empty() {
            return Ok(None);
        }
        let now = segment.timestamp;
        self.cache.evict_stale(now);

        match self.continue_exchange(segment)? {
            Continuation::Completed(message) => return Ok(Some(*message)),
            Continuation::Absorbed => return Ok(None),
            Continuation::Unmatched => {}
        }

        let (mut message, rest) = match frame_message(segment.payload)? {
            Frame::Message { message, rest } => (*message, rest),
            Frame::Incomplete => {
                trace!(ack = segment.ack_num, "Waiting for header boundary");
                return Ok(None);
            }
            Frame::NotHttp => {
                trace!(ack = segment.ack_num, "Discarding non-HTTP segment");
                return Ok(None);
            }
        };

        match &mut message {
            Message::Request(request) => {
                request.captured_at = now;
                request.src_host = segment.src_addr;
                request.dst_host = segment.dst_addr;
                request.dst_port = segment.dst_port;
                request.ack_num = segment.ack_num;
            }
            Message::Response(response) => {
                response.captured_at = now;
                response.seq_num = segment.seq_num;
                response.ack_num = segment.ack_num;
            }
        }
        message.entity_mut().append_body(rest)?;

        Ok(match message {
            Message::Request(request) => self.start_request(request, now),
            Message::Response(response) => self.start_response(response),
        })
    }

    fn continue_exchange(&mut self, segment: &Segment<'_>) -> Result<Continuation, DecodeError> {
        if let Some(index) = self.cache.find_request(segment.ack_num) {
            let Some(exchange) = self.cache.get_mut(index) else {
                return Ok(Continuation::Unmatched);
            };
            let request = &mut exchange.request;
            if request.is_complete() {
                trace!(ack = segment.ack_num, "Ignoring segment for completed request");
                return Ok(Continuation::Absorbed);
            }
            if let Err(e) = request.entity.append_body(segment.payload) {
                warn!(ack = segment.ack_num, "Dropping request with malformed body: {e}");
                self.cache.remove(index);
                return Err(e);
            }
            if request.is_complete() {
                debug!(ack = segment.ack_num, path = %request.path, "Request complete");
                return Ok(Continuation::Completed(Box::new(Message::Request(
                    request.clone(),
                ))));
            }
            return Ok(Continuation::Absorbed);
        }

        if let Some(index) = self.cache.find_response(segment.ack_num) {
            let Some(exchange) = self.cache.get_mut(index) else {
                return Ok(Continuation::Unmatched);
            };
            let Some(response) = exchange.response.as_mut() else {
                return Ok(Continuation::Unmatched);
            };
            if let Err(e) = response.entity.append_body(segment.payload) {
                warn!(ack = segment.ack_num, "Dropping response with malformed body: {e}");
                self.cache.remove(index);
                return Err(e);
            }
            if !response.is_complete() {
                return Ok(Continuation::Absorbed);
            }
            let exchange = self.cache.remove(index);
            if let Some(response) = exchange.response {
                debug!(ack = segment.ack_num, status = response.status, "Response complete");
                return Ok(Continuation::Completed(Box::new(Message::Response(response))));
            }
        }

        Ok(Continuation::Unmatched)
    }

    fn start_request(&mut self, mut request: Request, now: SystemTime) -> Option<Message> {
        request.exchange_id = ExchangeId::from_time(request.captured_at);
        debug!(
            ack = request.ack_num,
            method = %request.method,
            path = %request.path,
            complete = request.is_complete(),
            "New request"
        );
        let emitted = request
            .is_complete()
            .then(|| Message::Request(request.clone()));
        self.cache.insert(PendingExchange::new(request, now));
        emitted
    }

    fn start_response(&mut self, mut response: Response) -> Option<Message> {
        let Some(index) = self.cache.find_request(response.seq_num) else {
            debug!(seq = response.seq_num, status = response.status, "Dropping unmatched response");
            return None;
        };

        if response.is_complete() {
            let exchange = self.cache.remove(index);
            response.exchange_id = exchange.request.exchange_id;
            debug!(seq = response.seq_num, status = response.status, "Response complete");
            return Some(Message::Response(response));
        }

        let exchange = self.cache.get_mut(index)?;
        response.exchange_id = exchange.request.exchange_id;
        trace!(seq = response.seq_num, ack = response.ack_num, "Response in progress");
        exchange.response = Some(response);
        None
    }
}
