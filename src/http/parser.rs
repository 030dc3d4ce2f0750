use bytes::{Buf, BytesMut};
use std::fmt;

use crate::http::request::Request;

/// Why a request line or header line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    MissingMethod,
    MissingUri,
    MissingVersion,
    InvalidHeader,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseError::MissingMethod => "Unable to parse HTTP Method.",
            ParseError::MissingUri => "Unable to parse HTTP URI.",
            ParseError::MissingVersion => "Unable to parse HTTP Version.",
            ParseError::InvalidHeader => "Unable to parse header line.",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    AwaitingRequestLine,
    AwaitingHeaderOrBlank,
}

/// Splits a connection's inbound bytes into pipelined requests.
///
/// Lines are CRLF terminated and a blank line ends each request. Only the
/// bytes of finished requests are removed from the buffer: an unterminated
/// line or a request still waiting for its blank line stays in place,
/// byte for byte, until more data arrives.
pub struct RequestParser {
    root: String,
}

impl RequestParser {
    /// `root` is prefixed to every URI to form the request's full path.
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Drains every complete request from `buf`, in arrival order.
    ///
    /// An empty result just means no request has been completed yet.
    pub fn parse(&self, buf: &mut BytesMut) -> Vec<Request> {
        let mut requests = Vec::new();
        let mut state = ParserState::AwaitingRequestLine;
        let mut current = Request::new();
        let mut pos = 0;
        let mut consumed = 0;

        while let Some(len) = find_crlf(&buf[pos..]) {
            let line = String::from_utf8_lossy(&buf[pos..pos + len]).into_owned();
            pos += len + 2;

            match state {
                ParserState::AwaitingRequestLine => {
                    if line.is_empty() {
                        // stray CRLF between requests
                        consumed = pos;
                        continue;
                    }
                    self.parse_request_line(&line, &mut current);
                    state = ParserState::AwaitingHeaderOrBlank;
                }
                ParserState::AwaitingHeaderOrBlank => {
                    if line.is_empty() {
                        requests.push(std::mem::take(&mut current));
                        state = ParserState::AwaitingRequestLine;
                        consumed = pos;
                        continue;
                    }
                    match parse_header_line(&line) {
                        Ok((key, value)) => {
                            tracing::trace!(key = %key, value = %value, "header");
                            current.headers.insert(key, value);
                        }
                        Err(e) => {
                            tracing::debug!(line = %line, "{}", e);
                        }
                    }
                }
            }
        }

        buf.advance(consumed);
        tracing::trace!(
            requests = requests.len(),
            residual = buf.len(),
            "parsed pipelined requests"
        );
        requests
    }

    fn parse_request_line(&self, line: &str, req: &mut Request) {
        req.request_line = line.to_string();

        if let Err(e) = self.fill_request_line(line, req) {
            tracing::warn!(line = %line, "{}", e);
            req.invalidate(e.to_string());
        }
    }

    fn fill_request_line(&self, line: &str, req: &mut Request) -> Result<(), ParseError> {
        let mut parts = line.split_whitespace();

        req.method = parts.next().ok_or(ParseError::MissingMethod)?.to_string();
        tracing::trace!(method = %req.method, "request method");

        let uri = parts.next().ok_or(ParseError::MissingUri)?;
        req.set_uri(&self.root, uri);
        tracing::trace!(uri = %req.uri, full_path = %req.full_path.display(), "request uri");

        req.version = parts.next().ok_or(ParseError::MissingVersion)?.to_string();
        tracing::trace!(version = %req.version, "request version");

        Ok(())
    }
}

/// Splits `key: value`, dropping at most one space after the colon.
pub fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
    if key.is_empty() {
        return Err(ParseError::InvalidHeader);
    }
    let value = value.strip_prefix(' ').unwrap_or(value);
    Ok((key.to_string(), value.to_string()))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
