//! HTTP header map shared by [`HttpRequest`](crate::http::request::HttpRequest),
//! request trailers and the [`ResponseWriter`](crate::http::response::ResponseWriter).
//!
//! Names are matched case-insensitively. Setting a name that is already present
//! does not replace the value: the new value is appended after `", "`, which is
//! how repeated header fields are combined on the wire.
//!
//! Fields are kept in an ordered map so serialization is deterministic, but no
//! caller may rely on that order.
//!
//! [`HttpHeaders::parse`] consumes one field line at a time from a byte buffer
//! and validates the name against the token character set. Values may carry
//! any byte; bytes that are not UTF-8 are decoded lossily. Fields added with
//! [`HttpHeaders::set`] are stored as given.

use indexmap::IndexMap;

use crate::http::error::ParseError;
use crate::http::find_crlf;
use crate::http::request::lossy;

/// Symbols allowed in a field name besides ASCII letters and digits.
const NAME_SYMBOLS: &[u8] = b"!#$%&'*+-.^_`|~";

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderField {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    // keyed by the lower-cased name
    fields: IndexMap<String, HeaderField>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    /// Parses a single field line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the line was the empty
    /// line ending the field section. `(0, false)` means no complete line is
    /// buffered yet.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(line_end) = find_crlf(data) else {
            return Ok((0, false));
        };
        if line_end == 0 {
            return Ok((2, true));
        }

        let line = data[..line_end].trim_ascii();
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Err(ParseError::MalformedHeader(lossy(line)));
        };
        let (name, value) = (&line[..colon], &line[colon + 1..]);

        let name = parse_field_name(name)?;
        self.set(&name, &lossy(value.trim_ascii()));
        Ok((line_end + 2, false))
    }

    /// Adds a field, joining it to an existing value with `", "`.
    pub fn set(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.fields.get_mut(&key) {
            Some(field) => {
                field.value.push_str(", ");
                field.value.push_str(value);
            }
            None => {
                self.fields.insert(
                    key,
                    HeaderField {
                        name: name.to_string(),
                        value: value.to_string(),
                    },
                );
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|field| field.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .values()
            .map(|field| (field.name.as_str(), field.value.as_str()))
    }

    /// Serializes every field as `name: value\r\n`, without the closing empty line.
    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in self.iter() {
            result.push_str(name);
            result.push_str(": ");
            result.push_str(value);
            result.push_str("\r\n");
        }
        result
    }
}

fn parse_field_name(raw: &[u8]) -> Result<String, ParseError> {
    // no whitespace between the name and the colon
    if raw.is_empty() || raw.last().is_some_and(u8::is_ascii_whitespace) {
        return Err(ParseError::InvalidHeaderName(lossy(raw)));
    }

    let name = raw.trim_ascii().to_ascii_lowercase();
    let valid = name
        .iter()
        .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || NAME_SYMBOLS.contains(&b));
    if !valid {
        return Err(ParseError::InvalidHeaderName(lossy(raw)));
    }
    Ok(lossy(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_header() {
        let mut headers = HttpHeaders::new();
        let (n, done) = headers.parse(b"Host: localhost:42069\r\n\r\n").unwrap();
        assert_eq!(n, 23);
        assert!(!done);
        assert_eq!(headers.get("host"), Some("localhost:42069"));
    }

    #[test]
    fn parse_surrounding_whitespace() {
        let mut headers = HttpHeaders::new();
        let (n, done) = headers.parse(b"    Host:   example.com    \r\n").unwrap();
        assert_eq!(n, 29);
        assert!(!done);
        assert_eq!(headers.get("Host"), Some("example.com"));
    }

    #[test]
    fn parse_terminator() {
        let mut headers = HttpHeaders::new();
        let (n, done) = headers.parse(b"\r\nbody").unwrap();
        assert_eq!(n, 2);
        assert!(done);
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_needs_more_data() {
        let mut headers = HttpHeaders::new();
        assert_eq!(headers.parse(b"Host: exam").unwrap(), (0, false));
        assert_eq!(headers.parse(b"").unwrap(), (0, false));
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_repeated_header_joins_values() {
        let mut headers = HttpHeaders::new();
        let data = b"Host: example.com\r\nHost: other.com\r\n";
        let (n, _) = headers.parse(data).unwrap();
        let (m, _) = headers.parse(&data[n..]).unwrap();
        assert_eq!(n + m, data.len());
        assert_eq!(headers.get("host"), Some("example.com, other.com"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn parse_empty_value() {
        let mut headers = HttpHeaders::new();
        headers.parse(b"X-Empty:\r\n").unwrap();
        assert_eq!(headers.get("x-empty"), Some(""));
    }

    #[test]
    fn parse_rejects_space_before_colon() {
        let mut headers = HttpHeaders::new();
        let err = headers.parse(b"Foo : bar\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderName(_)));
    }

    #[test]
    fn parse_rejects_invalid_name_characters() {
        let mut headers = HttpHeaders::new();
        let err = headers.parse(b"H\xc2\xa9st: localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderName(_)));

        let err = headers.parse(b"Ho(st: localhost\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderName(_)));
    }

    #[test]
    fn parse_rejects_missing_colon() {
        let mut headers = HttpHeaders::new();
        let err = headers.parse(b"NoColonHere\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeader(_)));
    }

    #[test]
    fn parse_accepts_symbol_names() {
        let mut headers = HttpHeaders::new();
        headers.parse(b"X-Custom_Header.v1~!: yes\r\n").unwrap();
        assert_eq!(headers.get("x-custom_header.v1~!"), Some("yes"));
    }

    #[test]
    fn set_keeps_first_spelling() {
        let mut headers = HttpHeaders::new();
        headers.set("Content-Type", "text/plain");
        headers.set("content-type", "charset=utf-8");
        assert_eq!(
            headers.stringify(),
            "Content-Type: text/plain, charset=utf-8\r\n"
        );
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn parse_accepts_obs_text_value() {
        let mut headers = HttpHeaders::new();
        let (n, done) = headers.parse(b"X-Name: Jos\xe9\r\n").unwrap();
        assert_eq!(n, 14);
        assert!(!done);
        assert_eq!(headers.get("x-name"), Some("Jos\u{FFFD}"));
    }
}
