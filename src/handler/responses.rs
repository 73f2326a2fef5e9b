use std::time::SystemTime;

use async_std::io::Write;

use crate::http::error::ResponseError;
use crate::http::headers::HttpHeaders;
use crate::http::response::ResponseWriter;
use crate::http::status::HttpStatus;

pub const SUCCESS_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

pub const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

pub const INTERNAL_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

/// Adds the `Date` and `Server` fields every response carries.
pub fn stamp(headers: &mut HttpHeaders, server_name: &str) {
    headers.set("Date", &httpdate::fmt_http_date(SystemTime::now()));
    headers.set("Server", server_name);
}

/// Writes a complete fixed-length response.
pub async fn send<W>(
    w: &mut ResponseWriter<W>,
    status: HttpStatus,
    content_type: &str,
    body: &[u8],
    server_name: &str,
) -> Result<(), ResponseError>
where
    W: Write + Unpin,
{
    let mut headers = HttpHeaders::new();
    headers.set("Content-Length", &body.len().to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", content_type);
    stamp(&mut headers, server_name);

    w.write_status_line(status).await?;
    w.write_headers(&headers).await?;
    w.write_body(body).await?;
    Ok(())
}

pub async fn html<W>(
    w: &mut ResponseWriter<W>,
    status: HttpStatus,
    page: &str,
    server_name: &str,
) -> Result<(), ResponseError>
where
    W: Write + Unpin,
{
    send(w, status, "text/html", page.as_bytes(), server_name).await
}
