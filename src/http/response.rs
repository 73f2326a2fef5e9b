//! Response serialization with write-order enforcement.
//!
//! A [`ResponseWriter`] walks through status line, headers and body in that
//! order. A chunked body is closed with [`ResponseWriter::write_chunked_body_done`]
//! and finished with [`ResponseWriter::write_trailers`], even when there are no
//! trailer fields to send.
//!
//! Every call checks the state before touching the sink, so an out-of-order
//! call fails without writing anything. Each call serializes its whole output
//! up front and hands it to the sink with a single `write_all`.

use std::fmt;

use async_std::io::{Write, WriteExt};

use crate::http::HTTP_VERSION;
use crate::http::chunked::{LAST_CHUNK, encode_chunk};
use crate::http::error::ResponseError;
use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
    Trailer,
    Done,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriterState::StatusLine => "status-line",
            WriterState::Headers => "headers",
            WriterState::Body => "body",
            WriterState::Trailer => "trailer",
            WriterState::Done => "done",
        };
        f.write_str(name)
    }
}

/// `Content-Length`, `Connection: close` and `Content-Type: text/plain`.
pub fn default_headers(content_len: usize) -> HttpHeaders {
    let mut headers = HttpHeaders::new();
    headers.set("Content-Length", &content_len.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
where
    W: Write + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::StatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn expect_state(&self, expected: WriterState, operation: &'static str) -> Result<(), ResponseError> {
        if self.state != expected {
            return Err(ResponseError::StateViolation {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    pub async fn write_status_line(&mut self, status: HttpStatus) -> Result<(), ResponseError> {
        self.expect_state(WriterState::StatusLine, "write status line")?;

        // HTTP/1.1 <code> <reason>\r\n
        let line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.code(),
            status.reason_phrase()
        );
        self.sink.write_all(line.as_bytes()).await?;
        self.state = WriterState::Headers;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &HttpHeaders) -> Result<(), ResponseError> {
        self.expect_state(WriterState::Headers, "write headers")?;

        let mut block = headers.stringify();
        block.push_str("\r\n");
        self.sink.write_all(block.as_bytes()).await?;
        self.state = WriterState::Body;
        Ok(())
    }

    /// Writes body bytes verbatim. The length is not checked against the
    /// `Content-Length` sent with the headers.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, ResponseError> {
        self.expect_state(WriterState::Body, "write body")?;

        self.sink.write_all(body).await?;
        Ok(body.len())
    }

    /// Writes `data` as one chunk. An empty slice writes nothing, since a
    /// zero-sized chunk would end the body.
    pub async fn write_chunked_body(&mut self, data: &[u8]) -> Result<usize, ResponseError> {
        self.expect_state(WriterState::Body, "write chunked body")?;

        if data.is_empty() {
            return Ok(0);
        }
        let chunk = encode_chunk(data);
        self.sink.write_all(&chunk).await?;
        Ok(chunk.len())
    }

    pub async fn write_chunked_body_done(&mut self) -> Result<usize, ResponseError> {
        self.expect_state(WriterState::Body, "finish chunked body")?;

        self.sink.write_all(LAST_CHUNK).await?;
        self.state = WriterState::Trailer;
        Ok(LAST_CHUNK.len())
    }

    pub async fn write_trailers(&mut self, trailers: &HttpHeaders) -> Result<(), ResponseError> {
        self.expect_state(WriterState::Trailer, "write trailers")?;

        let mut block = trailers.stringify();
        block.push_str("\r\n");
        self.sink.write_all(block.as_bytes()).await?;
        self.state = WriterState::Done;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ResponseError> {
        self.sink.flush().await?;
        Ok(())
    }
}
