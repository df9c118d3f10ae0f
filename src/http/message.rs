//! HTTP message entities produced by the decoder.

use core::net::IpAddr;
use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::FieldMap;

/// Correlation value shared by a request and its matched response.
///
/// Derived from the request's capture time, in milliseconds since the Unix
/// epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExchangeId(pub u64);

impl ExchangeId {
    #[must_use]
    pub fn from_time(time: SystemTime) -> Self {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

/// Intermediate buffers kept while a body is still arriving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyScratch {
    Chunked { unresolved: Vec<u8>, data: Vec<u8> },
    Sized { data: Vec<u8> },
}

/// Headers and body shared by requests and responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub headers: FieldMap,
    pub body: String,
    pub complete: bool,
    #[serde(skip)]
    pub(crate) scratch: Option<BodyScratch>,
}

impl Entity {
    pub(crate) fn with_headers(headers: FieldMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub parameters: FieldMap,
    #[serde(flatten)]
    pub entity: Entity,
    pub captured_at: SystemTime,
    pub exchange_id: ExchangeId,
    /// Acknowledgment number shared by every segment of this request.
    pub ack_num: u32,
    pub src_host: Option<IpAddr>,
    pub dst_host: Option<IpAddr>,
    pub dst_port: u16,
}

impl Request {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entity.complete
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: u16,
    #[serde(flatten)]
    pub entity: Entity,
    pub captured_at: SystemTime,
    pub exchange_id: ExchangeId,
    /// Sequence number of the first segment; equals the request's `ack_num`.
    pub seq_num: u32,
    /// Acknowledgment number shared by every segment of this response.
    pub ack_num: u32,
}

impl Response {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entity.complete
    }
}

/// A complete request or response handed back by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    #[must_use]
    pub fn entity(&self) -> &Entity {
        match self {
            Self::Request(request) => &request.entity,
            Self::Response(response) => &response.entity,
        }
    }

    pub(crate) fn entity_mut(&mut self) -> &mut Entity {
        match self {
            Self::Request(request) => &mut request.entity,
            Self::Response(response) => &mut response.entity,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entity().complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_id_from_time() {
        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(ExchangeId::from_time(time), ExchangeId(1_700_000_000_123));
        assert_eq!(ExchangeId::from_time(UNIX_EPOCH), ExchangeId(0));
    }

    #[test]
    fn test_scratch_is_not_serialized() {
        let mut headers = FieldMap::new();
        headers.insert("Content-Length", "10");
        let mut entity = Entity::with_headers(headers);
        entity.scratch = Some(BodyScratch::Sized {
            data: b"half".to_vec(),
        });
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "headers": { "Content-Length": "10" },
                "body": "",
                "complete": false,
            })
        );
    }
}
