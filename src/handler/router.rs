use std::path::{Path, PathBuf};

use async_std::io::Write;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::handler::Handler;
use crate::handler::{responses, static_files};
use crate::http::HttpMethod;
use crate::http::error::ResponseError;
use crate::http::headers::HttpHeaders;
use crate::http::request::HttpRequest;
use crate::http::response::ResponseWriter;
use crate::http::status::HttpStatus;

const MAX_STREAM_CHUNKS: usize = 1000;
const VIDEO_FILE: &str = "vim.mp4";

/// Demo routes served by the `rustynet` binary.
///
/// - `/yourproblem`: 400 page
/// - `/myproblem`: 500 page
/// - `/echo`: the request body sent back
/// - `/stream/<n>`: `n` chunks with `X-Content-SHA256` and `X-Content-Length` trailers
/// - `/video`: `vim.mp4` from the static files root
/// - `/static/<path>`: any file below the static files root
/// - anything else: 200 page
pub struct Router {
    server_name: String,
    static_files_root: PathBuf,
}

impl Router {
    pub fn new(server_name: &str, static_files_root: &Path) -> Self {
        Self {
            server_name: server_name.to_string(),
            static_files_root: static_files_root.to_path_buf(),
        }
    }

    async fn stream<W>(&self, w: &mut ResponseWriter<W>, count: &str) -> Result<(), ResponseError>
    where
        W: Write + Unpin + Send,
    {
        let count = match count.parse::<usize>() {
            Ok(n) if n <= MAX_STREAM_CHUNKS => n,
            _ => {
                return responses::html(
                    w,
                    HttpStatus::BadRequest,
                    responses::BAD_REQUEST_PAGE,
                    &self.server_name,
                )
                .await;
            }
        };

        let mut headers = HttpHeaders::new();
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");
        headers.set("Trailer", "X-Content-SHA256, X-Content-Length");
        responses::stamp(&mut headers, &self.server_name);

        w.write_status_line(HttpStatus::Ok).await?;
        w.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut content_len = 0;
        for i in 0..count {
            let line = format!("chunk {i}\n");
            hasher.update(line.as_bytes());
            content_len += line.len();
            w.write_chunked_body(line.as_bytes()).await?;
        }
        w.write_chunked_body_done().await?;

        let mut trailers = HttpHeaders::new();
        trailers.set("X-Content-SHA256", &hex::encode(hasher.finalize()));
        trailers.set("X-Content-Length", &content_len.to_string());
        w.write_trailers(&trailers).await
    }
}

impl Handler for Router {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &HttpRequest) -> Result<(), ResponseError>
    where
        W: Write + Unpin + Send,
    {
        debug!(method = %req.method(), target = req.target(), "routing request");

        match (req.method(), req.target()) {
            (_, "/yourproblem") => {
                responses::html(
                    w,
                    HttpStatus::BadRequest,
                    responses::BAD_REQUEST_PAGE,
                    &self.server_name,
                )
                .await
            }
            (_, "/myproblem") => {
                responses::html(
                    w,
                    HttpStatus::InternalServerError,
                    responses::INTERNAL_ERROR_PAGE,
                    &self.server_name,
                )
                .await
            }
            (HttpMethod::Post | HttpMethod::Put, "/echo") => {
                let content_type = req
                    .headers
                    .get("content-type")
                    .unwrap_or("application/octet-stream");
                responses::send(w, HttpStatus::Ok, content_type, &req.body, &self.server_name).await
            }
            (HttpMethod::Get, target) if target.starts_with("/stream/") => {
                self.stream(w, &target["/stream/".len()..]).await
            }
            (HttpMethod::Get, "/video") => {
                static_files::serve(w, &self.static_files_root, VIDEO_FILE, &self.server_name).await
            }
            (HttpMethod::Get, target) if target.starts_with("/static/") => {
                let path = &target["/static/".len()..];
                static_files::serve(w, &self.static_files_root, path, &self.server_name).await
            }
            _ => {
                responses::html(w, HttpStatus::Ok, responses::SUCCESS_PAGE, &self.server_name).await
            }
        }
    }
}
