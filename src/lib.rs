#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

//! Passive HTTP/1.1 decoding from captured TCP segments.
//!
//! Feed every captured [`Segment`] to a [`Decoder`]; it hands back each
//! [`Request`] and [`Response`] once its body has fully arrived.

mod bytes;
mod decoder;
mod error;
mod http;
mod packet;
mod stream;

pub use decoder::{DEFAULT_EXCHANGE_TIMEOUT, Decoder, DecoderConfig};
pub use error::DecodeError;
pub use http::{Entity, ExchangeId, FieldMap, FieldValue, Message, Request, Response};
pub use packet::Segment;
