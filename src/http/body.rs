//! Body assembly for chunked and content-length framing.

use super::message::BodyScratch;
use super::Entity;
use crate::bytes::{CRLF, find};
use crate::error::DecodeError;

/// How the body of a message is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    Chunked,
    ContentLength(usize),
    Unframed,
}

impl Framing {
    pub(crate) fn of(entity: &Entity) -> Self {
        if entity.headers.has_value("Transfer-Encoding", "chunked") {
            return Self::Chunked;
        }
        // The first candidate that parses as a length wins; junk values are skipped.
        entity
            .headers
            .get("Content-Length")
            .and_then(|values| values.iter().find_map(|v| v.parse().ok()))
            .map_or(Self::Unframed, Self::ContentLength)
    }
}

impl Entity {
    /// Feed newly arrived body bytes into the entity.
    ///
    /// Appending to a complete entity is a no-op. On error the partially
    /// assembled body is discarded and the entity stays incomplete.
    pub(crate) fn append_body(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        if self.complete {
            return Ok(());
        }
        match Framing::of(self) {
            Framing::Chunked => self.append_chunked(bytes),
            Framing::ContentLength(length) => {
                self.append_sized(bytes, length);
                Ok(())
            }
            Framing::Unframed => {
                self.finish(Vec::new());
                Ok(())
            }
        }
    }

    fn append_chunked(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let (mut unresolved, mut data) = match self.scratch.take() {
            Some(BodyScratch::Chunked { unresolved, data }) => (unresolved, data),
            _ => (Vec::new(), Vec::new()),
        };
        unresolved.extend_from_slice(bytes);

        let mut cursor = 0;
        loop {
            let pending = &unresolved[cursor..];
            let Some(line_end) = find(pending, CRLF) else {
                break;
            };
            let size = parse_chunk_size(&pending[..line_end])?;
            if size == 0 {
                self.finish(data);
                return Ok(());
            }
            let start = line_end + CRLF.len();
            let Some(end) = start.checked_add(size) else {
                break;
            };
            let Some(needed) = end.checked_add(CRLF.len()) else {
                break;
            };
            if pending.len() < needed {
                break;
            }
            data.extend_from_slice(&pending[start..end]);
            cursor += needed;
        }

        unresolved.drain(..cursor);
        self.scratch = Some(BodyScratch::Chunked { unresolved, data });
        Ok(())
    }

    fn append_sized(&mut self, bytes: &[u8], length: usize) {
        let mut data = match self.scratch.take() {
            Some(BodyScratch::Sized { data }) => data,
            _ => Vec::new(),
        };
        data.extend_from_slice(bytes);
        if data.len() < length {
            self.scratch = Some(BodyScratch::Sized { data });
        } else {
            // Bytes past the declared length stay in the body.
            self.finish(data);
        }
    }

    fn finish(&mut self, data: Vec<u8>) {
        self.body = String::from_utf8_lossy(&data).into_owned();
        self.scratch = None;
        self.complete = true;
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, DecodeError> {
    let invalid = || DecodeError::InvalidChunkSize(String::from_utf8_lossy(line).into_owned());
    let text = core::str::from_utf8(line).map_err(|_| invalid())?;
    usize::from_str_radix(text, 16).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FieldMap;
    use rstest::rstest;

    fn entity(headers: &[(&str, &str)]) -> Entity {
        let mut map = FieldMap::new();
        for (name, value) in headers {
            map.insert(*name, *value);
        }
        Entity::with_headers(map)
    }

    #[rstest]
    #[case(&[("Transfer-Encoding", "chunked")], Framing::Chunked)]
    #[case(&[("Transfer-Encoding", "gzip"), ("Transfer-Encoding", "chunked")], Framing::Chunked)]
    #[case(&[("Transfer-Encoding", "chunked"), ("Content-Length", "3")], Framing::Chunked)]
    #[case(&[("Content-Length", "12")], Framing::ContentLength(12))]
    #[case(&[("Content-Length", "abc"), ("Content-Length", "7")], Framing::ContentLength(7))]
    #[case(&[("Content-Length", "-1")], Framing::Unframed)]
    #[case(&[("Content-Length", "abc")], Framing::Unframed)]
    #[case(&[("content-length", "5")], Framing::Unframed)]
    #[case(&[], Framing::Unframed)]
    fn test_framing_from_headers(#[case] headers: &[(&str, &str)], #[case] expected: Framing) {
        assert_eq!(Framing::of(&entity(headers)), expected);
    }

    #[test]
    fn test_content_length_single_append() {
        let mut body = entity(&[("Content-Length", "5")]);
        body.append_body(b"hello").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "hello");
        assert!(body.scratch.is_none());
    }

    #[test]
    fn test_content_length_split_across_appends() {
        let mut body = entity(&[("Content-Length", "10")]);
        body.append_body(b"0123").unwrap();
        assert!(!body.complete);
        assert_eq!(body.body, "");
        body.append_body(b"45").unwrap();
        assert!(!body.complete);
        body.append_body(b"6789").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "0123456789");
    }

    #[test]
    fn test_content_length_keeps_excess_bytes() {
        let mut body = entity(&[("Content-Length", "3")]);
        body.append_body(b"abcdef").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "abcdef");
    }

    #[test]
    fn test_content_length_zero_completes_immediately() {
        let mut body = entity(&[("Content-Length", "0")]);
        body.append_body(b"").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "");
    }

    #[test]
    fn test_no_framing_completes_and_ignores_bytes() {
        let mut body = entity(&[("Host", "example.com")]);
        body.append_body(b"stray").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "");
    }

    #[test]
    fn test_complete_entity_is_not_mutated() {
        let mut body = entity(&[("Content-Length", "2")]);
        body.append_body(b"ok").unwrap();
        body.append_body(b"more").unwrap();
        assert_eq!(body.body, "ok");
    }

    #[rstest]
    #[case(b"ffffffffffffffec\r\nab")]
    #[case(b"fffffffffffffffe\r\nab")]
    #[case(b"ffffffffffffffff\r\n")]
    fn test_chunked_huge_size_waits_for_data(#[case] bytes: &[u8]) {
        let mut body = entity(&[("Transfer-Encoding", "chunked")]);
        body.append_body(bytes).unwrap();
        assert!(!body.complete);
        assert_eq!(body.body, "");
    }

    #[test]
    fn test_chunked_single_append() {
        let mut body = entity(&[("Transfer-Encoding", "chunked")]);
        body.append_body(b"5\r\nhello\r\n0\r\n\r\n").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "hello");
        assert!(body.scratch.is_none());
    }

    #[test]
    fn test_chunked_multiple_chunks_hex_sizes() {
        let mut body = entity(&[("Transfer-Encoding", "chunked")]);
        body.append_body(b"3\r\nabc\r\na\r\n0123456789\r\n0\r\n\r\n").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "abc0123456789");
    }

    #[test]
    fn test_chunked_split_inside_chunk_and_size_line() {
        let mut body = entity(&[("Transfer-Encoding", "chunked")]);
        body.append_body(b"5\r\nhe").unwrap();
        assert!(!body.complete);
        body.append_body(b"llo\r\n").unwrap();
        assert!(!body.complete);
        body.append_body(b"6\r").unwrap();
        assert!(!body.complete);
        body.append_body(b"\n world\r\n0").unwrap();
        assert!(!body.complete);
        body.append_body(b"\r\n\r\n").unwrap();
        assert!(body.complete);
        assert_eq!(body.body, "hello world");
    }

    #[test]
    fn test_chunked_waits_for_trailing_crlf() {
        let mut body = entity(&[("Transfer-Encoding", "chunked")]);
        body.append_body(b"5\r\nhello").unwrap();
        assert_eq!(
            body.scratch,
            Some(BodyScratch::Chunked {
                unresolved: b"5\r\nhello".to_vec(),
                data: Vec::new(),
            })
        );
        body.append_body(b"\r\n0\r\n\r\n").unwrap();
        assert_eq!(body.body, "hello");
    }

    #[test]
    fn test_chunked_invalid_size() {
        let mut body = entity(&[("Transfer-Encoding", "chunked")]);
        let err = body.append_body(b"zz\r\nhello\r\n").unwrap_err();
        assert_eq!(err, DecodeError::InvalidChunkSize("zz".to_owned()));
        assert!(!body.complete);
    }
}
