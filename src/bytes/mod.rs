//! Zero-copy helpers over byte spans.
//!
//! Everything here returns views into the input buffer, never copies.

mod span;

pub(crate) use span::{CRLF, find, split, split_n};
