use crate::http::error::ParseError;
use crate::http::headers::HttpHeaders;
use crate::http::{HTTP_VERSION, HttpMethod, find_crlf};

/// `METHOD SP request-target SP HTTP-version`, parsed as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: HttpMethod,
    pub target: String,
    /// Version without the `HTTP/` prefix; always `1.1`.
    pub version: String,
}

/// Parses the request line at the front of `data`.
///
/// Returns `Ok(None)` while no CRLF is buffered. On success the second value
/// is the number of bytes consumed, CRLF included.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(line_end) = find_crlf(data) else {
        return Ok(None);
    };

    let line = &data[..line_end];
    let parts: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
    let &[method, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine(lossy(line)));
    };

    // method and version are ASCII tokens, the target is opaque
    let method = std::str::from_utf8(method)
        .ok()
        .and_then(HttpMethod::from_token)
        .ok_or_else(|| ParseError::InvalidMethod(lossy(method)))?;
    if target.is_empty() {
        return Err(ParseError::InvalidTarget(String::new()));
    }
    if version != HTTP_VERSION.as_bytes() {
        return Err(ParseError::UnsupportedVersion(lossy(version)));
    }

    let request_line = RequestLine {
        method,
        target: lossy(target),
        version: "1.1".to_string(),
    };
    Ok(Some((request_line, line_end + 2)))
}

pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// A fully parsed request, handed to the [`Handler`](crate::handler::Handler).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub request_line: RequestLine,
    pub headers: HttpHeaders,
    /// Fields received after a chunked body.
    pub trailers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub(crate) fn new() -> Self {
        Self {
            request_line: RequestLine {
                method: HttpMethod::Get,
                target: String::new(),
                version: String::new(),
            },
            headers: HttpHeaders::new(),
            trailers: HttpHeaders::new(),
            body: Vec::new(),
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_get_request_line() {
        let (line, n) = parse_request_line(b"GET /path HTTP/1.1\r\nHost: x\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(line.method, HttpMethod::Get);
        assert_eq!(line.target, "/path");
        assert_eq!(line.version, "1.1");
        assert_eq!(n, 20);
    }

    #[test]
    fn good_post_request_line() {
        let (line, _) = parse_request_line(b"POST /coffee HTTP/1.1\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(line.method, HttpMethod::Post);
        assert_eq!(line.target, "/coffee");
    }

    #[test]
    fn incomplete_line_needs_more_data() {
        assert!(parse_request_line(b"GET /path HTTP/1.1").unwrap().is_none());
        assert!(parse_request_line(b"").unwrap().is_none());
    }

    #[test]
    fn wrong_number_of_parts() {
        let err = parse_request_line(b"/coffee HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine(_)));

        let err = parse_request_line(b"GET  /coffee HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine(_)));

        let err = parse_request_line(b"GET /coffee HTTP/1.1 extra\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine(_)));
    }

    #[test]
    fn lowercase_method_rejected() {
        let err = parse_request_line(b"get /path HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidMethod(m) if m == "get"));
    }

    #[test]
    fn unsupported_versions_rejected() {
        for line in [
            &b"GET /path HTTP/1.0\r\n"[..],
            b"GET /path HTTP/2\r\n",
            b"GET /path http/1.1\r\n",
        ] {
            let err = parse_request_line(line).unwrap_err();
            assert!(matches!(err, ParseError::UnsupportedVersion(_)));
        }
    }

    #[test]
    fn raw_bytes_in_target_accepted() {
        let (line, n) = parse_request_line(b"GET /caf\xe9 HTTP/1.1\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(line.method, HttpMethod::Get);
        assert_eq!(line.target, "/caf\u{FFFD}");
        assert_eq!(n, 20);
    }

    #[test]
    fn non_ascii_method_rejected() {
        let err = parse_request_line(b"G\xc9T /path HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidMethod(_)));

        let err = parse_request_line(b"GET /path HTTP/1.\xb9\r\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion(_)));
    }
}
