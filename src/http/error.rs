use thiserror::Error;

use crate::http::parser::ParseState;
use crate::http::response::WriterState;

/// Fatal errors raised while parsing a request.
///
/// Every variant is terminal for the message being parsed: the caller is
/// expected to answer with `400 Bad Request` and close the connection.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("invalid method: {0:?}")]
    InvalidMethod(String),
    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),
    #[error("unsupported HTTP version: {0:?}")]
    UnsupportedVersion(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),
    #[error("body exceeds content-length: {actual} > {declared}")]
    BodyTooLong { actual: usize, declared: usize },
    #[error("body of {0} bytes exceeds the limit of {1} bytes")]
    BodyTooLarge(usize, usize),
    #[error("unexpected bytes after headers without content-length")]
    UnframedBody,
    #[error("both content-length and transfer-encoding present")]
    ConflictingFraming,
    #[error("unsupported transfer-encoding: {0:?}")]
    UnsupportedTransferEncoding(String),
    #[error("invalid chunk size line: {0:?}")]
    InvalidChunkSize(String),
    #[error("missing CRLF after chunk data")]
    MissingChunkTerminator,

    #[error("unparsed data exceeds the buffer limit of {0} bytes")]
    BufferLimitExceeded(usize),
    #[error("request is already done")]
    AlreadyDone,
    #[error("incomplete request, stream ended in state {0}")]
    Incomplete(ParseState),
}

/// Errors raised by [`ResponseWriter`](crate::http::response::ResponseWriter).
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The call is not legal in the writer's current state. Nothing was written.
    #[error("cannot {operation} in state {state}")]
    StateViolation {
        operation: &'static str,
        state: WriterState,
    },
    #[error("i/o error while writing response: {0}")]
    Io(#[from] std::io::Error),
}
