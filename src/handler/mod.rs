//! Request handlers.
//!
//! A [`Handler`] receives each fully parsed request together with a fresh
//! [`ResponseWriter`] and is solely responsible for producing the response
//! through it. The server closes the connection once the handler returns.

mod responses;
mod router;
mod static_files;

use std::future::Future;

use async_std::io::Write;

use crate::http::error::ResponseError;
use crate::http::request::HttpRequest;
use crate::http::response::ResponseWriter;

pub use router::Router;

pub trait Handler: Send + Sync + 'static {
    fn handle<W>(
        &self,
        w: &mut ResponseWriter<W>,
        req: &HttpRequest,
    ) -> impl Future<Output = Result<(), ResponseError>> + Send
    where
        W: Write + Unpin + Send;
}
