//! Incremental request parser.
//!
//! [`RequestParser`] never reads from the network itself. It is handed the
//! bytes buffered so far and reports how many of them it consumed; the caller
//! drops that prefix and keeps the rest for the next call.
//! [`request_from_reader`] drives it over any async byte stream.
//!
//! States advance `RequestLine -> Headers -> Body -> Done` and never go back.

use std::fmt;

use async_std::io::{Read, ReadExt};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::http::chunked::ChunkedDecoder;
use crate::http::error::ParseError;
use crate::http::request::{HttpRequest, parse_request_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    RequestLine,
    Headers,
    Body,
    Done,
}

impl fmt::Display for ParseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseState::RequestLine => "request-line",
            ParseState::Headers => "headers",
            ParseState::Body => "body",
            ParseState::Done => "done",
        };
        f.write_str(name)
    }
}

/// What to do with bytes following the headers of a request that has
/// neither `Content-Length` nor `Transfer-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnframedBodyPolicy {
    /// Finish the request with an empty body and drop whatever is buffered.
    #[default]
    Discard,
    /// Fail if any byte was received past the header section.
    Reject,
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Initial size of the read buffer in [`request_from_reader`].
    pub buffer_size: usize,
    /// Largest the read buffer may grow to while a line is incomplete.
    pub max_buffer_size: usize,
    pub max_body_size: usize,
    pub unframed_body: UnframedBodyPolicy,
    pub chunked_requests: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            buffer_size: 8,
            max_buffer_size: 64 * 1024,
            max_body_size: 1024 * 1024, // 1 MB
            unframed_body: UnframedBodyPolicy::Discard,
            chunked_requests: true,
        }
    }
}

#[derive(Debug)]
enum BodyFraming {
    Unframed,
    Length(usize),
    Chunked(ChunkedDecoder),
}

#[derive(Debug)]
pub struct RequestParser {
    state: ParseState,
    request: HttpRequest,
    framing: BodyFraming,
    options: ParserOptions,
}

impl RequestParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            state: ParseState::RequestLine,
            request: HttpRequest::new(),
            framing: BodyFraming::Unframed,
            options,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    /// The request as parsed so far. Only the parts belonging to states
    /// already passed are meaningful.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn into_request(self) -> Result<HttpRequest, ParseError> {
        if self.state != ParseState::Done {
            return Err(ParseError::Incomplete(self.state));
        }
        Ok(self.request)
    }

    /// Parses as much of `data` as possible and returns the number of bytes
    /// consumed. A single buffer may hold several parseable units, so this
    /// keeps stepping until a step consumes nothing or the request is done.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut total = 0;
        while self.state != ParseState::Done {
            let n = self.parse_single(&data[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::RequestLine => {
                let Some((request_line, n)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                trace!(method = %request_line.method, target = %request_line.target, "parsed request line");
                self.request.request_line = request_line;
                self.state = ParseState::Headers;
                Ok(n)
            }
            ParseState::Headers => {
                let (n, done) = self.request.headers.parse(data)?;
                if done {
                    self.framing = self.body_framing()?;
                    trace!(fields = self.request.headers.len(), "parsed headers");
                    self.state = ParseState::Body;
                }
                Ok(n)
            }
            ParseState::Body => self.parse_body(data),
            ParseState::Done => Err(ParseError::AlreadyDone),
        }
    }

    fn body_framing(&self) -> Result<BodyFraming, ParseError> {
        let headers = &self.request.headers;
        let content_length = headers.get("content-length");
        let transfer_encoding = headers.get("transfer-encoding");

        match (content_length, transfer_encoding) {
            (Some(_), Some(_)) => Err(ParseError::ConflictingFraming),
            (Some(value), None) => {
                let len = value
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidContentLength(value.to_string()))?;
                if len > self.options.max_body_size {
                    return Err(ParseError::BodyTooLarge(len, self.options.max_body_size));
                }
                Ok(BodyFraming::Length(len))
            }
            (None, Some(value)) => {
                // chunked must be the final coding and the only one we decode
                let is_chunked = value.trim().eq_ignore_ascii_case("chunked");
                if !is_chunked || !self.options.chunked_requests {
                    return Err(ParseError::UnsupportedTransferEncoding(value.to_string()));
                }
                Ok(BodyFraming::Chunked(ChunkedDecoder::new()))
            }
            (None, None) => Ok(BodyFraming::Unframed),
        }
    }

    fn parse_body(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match &mut self.framing {
            BodyFraming::Unframed => {
                if self.options.unframed_body == UnframedBodyPolicy::Reject && !data.is_empty() {
                    return Err(ParseError::UnframedBody);
                }
                // nothing is parsed, but everything buffered is dropped
                self.finish();
                Ok(data.len())
            }
            BodyFraming::Length(declared) => {
                let declared = *declared;
                self.request.body.extend_from_slice(data);
                let actual = self.request.body.len();
                if actual > declared {
                    return Err(ParseError::BodyTooLong { actual, declared });
                }
                if actual == declared {
                    self.finish();
                }
                Ok(data.len())
            }
            BodyFraming::Chunked(decoder) => {
                let n = decoder.decode(data, &mut self.request.body, &mut self.request.trailers)?;
                let done = decoder.is_done();
                if self.request.body.len() > self.options.max_body_size {
                    return Err(ParseError::BodyTooLarge(
                        self.request.body.len(),
                        self.options.max_body_size,
                    ));
                }
                if done {
                    self.finish();
                }
                Ok(n)
            }
        }
    }

    fn finish(&mut self) {
        debug!(
            method = %self.request.request_line.method,
            target = %self.request.request_line.target,
            body_len = self.request.body.len(),
            "request parsed"
        );
        self.state = ParseState::Done;
    }
}

/// Errors that can occur while reading a request from a stream.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("i/o error while reading request: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed before any request data")]
    ConnectionClosed,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Reads and parses one request from `reader`.
///
/// The read buffer starts at [`ParserOptions::buffer_size`] bytes and doubles
/// whenever it fills up with unconsumed data. Reaching end of stream before
/// the request is complete is an error.
pub async fn request_from_reader<R>(
    reader: &mut R,
    options: &ParserOptions,
) -> Result<HttpRequest, ReadError>
where
    R: Read + Unpin + ?Sized,
{
    let mut parser = RequestParser::new(options.clone());
    let mut buffer = vec![0u8; options.buffer_size.max(1)];
    let mut read_to = 0;
    let mut received = 0;

    while !parser.is_done() {
        if read_to >= buffer.len() {
            if buffer.len() >= options.max_buffer_size {
                return Err(ParseError::BufferLimitExceeded(options.max_buffer_size).into());
            }
            let grown = (buffer.len() * 2).min(options.max_buffer_size);
            buffer.resize(grown, 0);
        }

        let n = match reader.read(&mut buffer[read_to..]).await {
            Ok(0) if received == 0 => return Err(ReadError::ConnectionClosed),
            Ok(0) => return Err(ParseError::Incomplete(parser.state()).into()),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadError::Io(e)),
        };
        read_to += n;
        received += n;

        let parsed = parser.parse(&buffer[..read_to])?;
        if parsed > 0 {
            buffer.copy_within(parsed..read_to, 0);
            read_to -= parsed;
        }
    }

    Ok(parser.into_request()?)
}
