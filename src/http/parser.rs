//! HTTP status line and header parsing.
//!
//! This module turns the first segment of an HTTP message into a [`Message`]
//! skeleton: the status line decides between request and response, header
//! lines fill the header map, and whatever follows the blank line is handed
//! back as the first piece of the body.

use std::borrow::Cow;
use std::time::UNIX_EPOCH;

use percent_encoding::percent_decode_str;

use super::{Entity, ExchangeId, FieldMap, Message, Request, Response};
use crate::bytes::{CRLF, find, split, split_n};
use crate::error::DecodeError;

const HTTP_VERSION: &[u8] = b"HTTP/1.1";
const HEADER_END: &[u8] = b"\r\n\r\n";
const HEADER_SEPARATOR: &[u8] = b": ";

/// Outcome of framing the start of a message.
#[derive(Debug)]
pub(crate) enum Frame<'a> {
    /// No header boundary yet; the bytes may become a message later.
    Incomplete,
    /// The status line is not HTTP/1.1.
    NotHttp,
    /// Status line and headers parsed; `rest` is the start of the body.
    Message { message: Box<Message>, rest: &'a [u8] },
}

/// Parse the status line and headers at the start of `data`.
pub(crate) fn frame_message(data: &[u8]) -> Result<Frame<'_>, DecodeError> {
    if data.len() < 3 {
        return Ok(Frame::Incomplete);
    }
    let Some(header_end) = find(data, HEADER_END) else {
        return Ok(Frame::Incomplete);
    };

    let head = split_n(&data[..header_end], CRLF, 2);
    let Some(mut message) = parse_status_line(head[0])? else {
        return Ok(Frame::NotHttp);
    };

    if let Some(header_block) = head.get(1) {
        message.entity_mut().headers = parse_header_lines(header_block);
    }

    Ok(Frame::Message {
        message: Box::new(message),
        rest: &data[header_end + HEADER_END.len()..],
    })
}

/// Classify a status line.
///
/// `GET /path?query HTTP/1.1` is a request, `HTTP/1.1 200 OK` a response;
/// anything else yields `None`.
fn parse_status_line(line: &[u8]) -> Result<Option<Message>, DecodeError> {
    let tokens = split(line, b" ");

    if tokens.len() == 3 && tokens[2] == HTTP_VERSION {
        let target = split_n(tokens[1], b"?", 2);
        let parameters = target
            .get(1)
            .map(|query| parse_query(query))
            .unwrap_or_default();
        return Ok(Some(Message::Request(Request {
            method: lossy(tokens[0]).into_owned(),
            path: lossy(target[0]).into_owned(),
            parameters,
            entity: Entity::default(),
            captured_at: UNIX_EPOCH,
            exchange_id: ExchangeId::default(),
            ack_num: 0,
            src_host: None,
            dst_host: None,
            dst_port: 0,
        })));
    }

    if tokens.len() >= 2 && tokens[0] == HTTP_VERSION {
        let code = lossy(tokens[1]);
        let status = code
            .parse()
            .map_err(|_| DecodeError::InvalidStatusCode(code.to_string()))?;
        return Ok(Some(Message::Response(Response {
            status,
            entity: Entity::default(),
            captured_at: UNIX_EPOCH,
            exchange_id: ExchangeId::default(),
            seq_num: 0,
            ack_num: 0,
        })));
    }

    Ok(None)
}

/// Parse `key=v1,v2&other=v` into a field map.
///
/// Comma-separated values become separate entries under the same key. A pair
/// without `=` contributes nothing.
pub(crate) fn parse_query(query: &[u8]) -> FieldMap {
    let mut parameters = FieldMap::new();
    for pair in split(query, b"&") {
        let key_value = split_n(pair, b"=", 2);
        let Some(values) = key_value.get(1) else {
            continue;
        };
        let key = url_decode(key_value[0]);
        for value in split(values, b",") {
            parameters.insert(key.clone(), url_decode(value));
        }
    }
    parameters
}

/// Parse `Name: value` lines; lines without the `": "` separator are skipped.
fn parse_header_lines(block: &[u8]) -> FieldMap {
    let mut headers = FieldMap::new();
    for line in split(block, CRLF) {
        if let [name, value] = split_n(line, HEADER_SEPARATOR, 2).as_slice() {
            headers.insert(lossy(name), lossy(value));
        }
    }
    headers
}

/// Decode a form-urlencoded component: `+` is a space, `%XX` an escaped byte.
fn url_decode(raw: &[u8]) -> String {
    let text = lossy(raw).replace('+', " ");
    percent_decode_str(&text).decode_utf8_lossy().into_owned()
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
