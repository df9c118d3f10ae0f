//! Packet parsing and TCP segment extraction.
//!
//! This module turns captured frames into the [`Segment`] values the decoder
//! consumes. It supports both IPv4 and IPv6 packets in various formats
//! (Ethernet frames or raw IP packets).

mod segment;

pub use segment::Segment;
