//! Error types for the HTTP decoder.

use thiserror::Error;

/// Fatal parse errors raised while decoding a segment.
///
/// Bytes that are merely incomplete or not HTTP at all are not errors; the
/// decoder reports those as "no output".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid response status code: {0:?}")]
    InvalidStatusCode(String),

    #[error("invalid chunk size: {0:?}")]
    InvalidChunkSize(String),
}
