//! HTTP message framing and body assembly.
//!
//! This module turns raw segment payloads into [`Request`] and [`Response`]
//! values: the parser frames status lines and headers, the body assembler
//! grows bodies across segments until their framing says they are complete.

mod body;
mod field_map;
mod message;
mod parser;

pub use field_map::{FieldMap, FieldValue};
pub use message::{Entity, ExchangeId, Message, Request, Response};
pub(crate) use parser::{Frame, frame_message};
