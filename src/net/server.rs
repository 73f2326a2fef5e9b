//! Core HTTP server implementation.
//!
//! This module only deals with networking concerns:
//! - accepting TCP connections,
//! - handing the raw stream to the request parser,
//! - handing the same stream to a [`ResponseWriter`] for the handler.
//!
//! Every connection carries exactly one request and runs on its own
//! `async-std` task. Reading and writing never overlap: the request is fully
//! parsed before the handler starts, and the connection is closed once the
//! handler returns.
//!
//! ## Request handling flow
//!
//! 1. Accept a TCP connection
//! 2. Parse one request from the stream
//!    (delegated to [`request_from_reader`])
//! 3. Call the [`Handler`], which writes the response
//! 4. Close the connection
//!
//! A malformed request is answered with `400 Bad Request` carrying the parse
//! error as body. Transport errors close the connection without a response.

use std::io;
use std::net::Shutdown;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_std::io::Write;
use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;
use async_std::task;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::config::ServerConfig;
use crate::handler::Handler;
use crate::http::error::ResponseError;
use crate::http::parser::{ParserOptions, ReadError, request_from_reader};
use crate::http::response::{ResponseWriter, default_headers};
use crate::http::status::HttpStatus;

pub struct Server<H> {
    config: ServerConfig,
    handler: Arc<H>,
    requests: Arc<AtomicU64>,
}

impl<H: Handler> Server<H> {
    pub fn new(config: ServerConfig, handler: H) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of requests parsed successfully and handed to the handler.
    pub fn requests_served(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Binds the configured address and serves until the listener fails.
    pub async fn run(&self) -> io::Result<()> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        info!(address = %self.config.socket_addr(), "server listening");
        self.serve(listener).await
    }

    /// Accepts connections from `listener`, spawning a task for each one.
    pub async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        let mut incoming = listener.incoming();

        while let Some(stream) = incoming.next().await {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(error = %err, "error accepting connection");
                    continue;
                }
            };

            let peer = stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            let handler = Arc::clone(&self.handler);
            let requests = Arc::clone(&self.requests);
            let options = self.config.parser_options();

            task::spawn(
                Self::handle_client(stream, handler, options, requests)
                    .instrument(info_span!("connection", peer = %peer)),
            );
        }

        Ok(())
    }

    /// Handles a single client connection.
    /// Reads one request, lets the handler answer it, and closes the stream.
    async fn handle_client(
        stream: TcpStream,
        handler: Arc<H>,
        options: ParserOptions,
        requests: Arc<AtomicU64>,
    ) {
        let mut reader = stream.clone();
        let mut writer = ResponseWriter::new(stream);

        let result = match request_from_reader(&mut reader, &options).await {
            Ok(req) => {
                let request_id = requests.fetch_add(1, Ordering::Relaxed) + 1;
                info!(
                    request_id,
                    method = %req.method(),
                    target = req.target(),
                    body_len = req.body.len(),
                    "handling request"
                );
                handler.handle(&mut writer, &req).await
            }
            Err(ReadError::Parse(err)) => {
                debug!(error = %err, "rejecting malformed request");
                respond_with_error(&mut writer, HttpStatus::BadRequest, &err.to_string()).await
            }
            Err(ReadError::ConnectionClosed) => {
                trace!("connection closed before sending a request");
                return;
            }
            Err(ReadError::Io(err)) => {
                warn!(error = %err, "i/o error while reading request");
                return;
            }
        };

        if let Err(err) = result {
            warn!(error = %err, "failed to write response");
            return;
        }
        if let Err(err) = writer.flush().await {
            warn!(error = %err, "failed to flush response");
            return;
        }
        if let Err(err) = writer.get_ref().shutdown(Shutdown::Both) {
            debug!(error = %err, "error closing connection");
        }
    }
}

/// Writes a plain-text response whose body is `message`.
pub async fn respond_with_error<W>(
    w: &mut ResponseWriter<W>,
    status: HttpStatus,
    message: &str,
) -> Result<(), ResponseError>
where
    W: Write + Unpin,
{
    let body = message.as_bytes();
    w.write_status_line(status).await?;
    w.write_headers(&default_headers(body.len())).await?;
    w.write_body(body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_layout() {
        task::block_on(async {
            let mut w = ResponseWriter::new(Vec::new());
            respond_with_error(&mut w, HttpStatus::BadRequest, "invalid method: \"get\"")
                .await
                .unwrap();
            let out = String::from_utf8(w.into_inner()).unwrap();
            assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
            assert!(out.contains("Content-Length: 21\r\n"));
            assert!(out.contains("Connection: close\r\n"));
            assert!(out.contains("Content-Type: text/plain\r\n"));
            assert!(out.ends_with("\r\n\r\ninvalid method: \"get\""));
        });
    }
}
