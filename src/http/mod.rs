pub mod chunked;
pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;

use std::fmt;

/// The only protocol version spoken on either side of the connection.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Request method token.
///
/// Any token made only of uppercase ASCII letters is accepted; the registered
/// methods get their own variant and everything else is kept as
/// [`HttpMethod::Extension`].
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Extension(String),
}

impl HttpMethod {
    /// Returns `None` unless `token` is a non-empty run of uppercase letters.
    pub fn from_token(token: &str) -> Option<HttpMethod> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }

        let method = match token {
            "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "CONNECT" => HttpMethod::Connect,
            "OPTIONS" => HttpMethod::Options,
            "TRACE" => HttpMethod::Trace,
            "PATCH" => HttpMethod::Patch,
            other => HttpMethod::Extension(other.to_string()),
        };
        Some(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Extension(token) => token,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Offset of the first `\r\n` in `data`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_tokens() {
        assert_eq!(HttpMethod::from_token("GET"), Some(HttpMethod::Get));
        assert_eq!(
            HttpMethod::from_token("PURGE"),
            Some(HttpMethod::Extension("PURGE".to_string()))
        );
        assert_eq!(HttpMethod::from_token("get"), None);
        assert_eq!(HttpMethod::from_token("G3T"), None);
        assert_eq!(HttpMethod::from_token(""), None);
    }

    #[test]
    fn crlf_position() {
        assert_eq!(find_crlf(b"abc\r\ndef"), Some(3));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"abc\r"), None);
        assert_eq!(find_crlf(b""), None);
    }
}
