//! Chunked transfer coding.
//!
//! Encoding frames one buffer as `<hex size>\r\n<data>\r\n`; the body ends with
//! the last chunk `0\r\n` followed by an optional trailer section and an empty
//! line.
//!
//! [`ChunkedDecoder`] is incremental: it is fed whatever bytes are buffered and
//! reports how many it consumed, so a chunk size line or a trailer field split
//! across reads is simply left in the buffer until its CRLF arrives.

use crate::http::error::ParseError;
use crate::http::find_crlf;
use crate::http::headers::HttpHeaders;

pub const LAST_CHUNK: &[u8] = b"0\r\n";

/// Frames `data` as a single chunk.
pub fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let size_line = format!("{:x}\r\n", data.len());
    let mut chunk = Vec::with_capacity(size_line.len() + data.len() + 2);
    chunk.extend_from_slice(size_line.as_bytes());
    chunk.extend_from_slice(data);
    chunk.extend_from_slice(b"\r\n");
    chunk
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    SizeLine,
    Data(u64),
    DataEnd,
    Trailer,
    Done,
}

#[derive(Debug)]
pub struct ChunkedDecoder {
    state: DecodeState,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self {
            state: DecodeState::SizeLine,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == DecodeState::Done
    }

    /// Decodes as much of `data` as possible, appending chunk data to `body`
    /// and trailer fields to `trailers`. Returns the number of bytes consumed.
    pub fn decode(
        &mut self,
        data: &[u8],
        body: &mut Vec<u8>,
        trailers: &mut HttpHeaders,
    ) -> Result<usize, ParseError> {
        let mut consumed = 0;
        while self.state != DecodeState::Done {
            let n = self.decode_single(&data[consumed..], body, trailers)?;
            if n == 0 {
                break;
            }
            consumed += n;
        }
        Ok(consumed)
    }

    fn decode_single(
        &mut self,
        data: &[u8],
        body: &mut Vec<u8>,
        trailers: &mut HttpHeaders,
    ) -> Result<usize, ParseError> {
        match self.state {
            DecodeState::SizeLine => {
                let Some(line_end) = find_crlf(data) else {
                    return Ok(0);
                };
                let size = parse_chunk_size(&data[..line_end])?;
                self.state = if size == 0 {
                    DecodeState::Trailer
                } else {
                    DecodeState::Data(size)
                };
                Ok(line_end + 2)
            }
            DecodeState::Data(remaining) => {
                let n = data.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
                body.extend_from_slice(&data[..n]);
                let remaining = remaining - n as u64;
                self.state = if remaining == 0 {
                    DecodeState::DataEnd
                } else {
                    DecodeState::Data(remaining)
                };
                Ok(n)
            }
            DecodeState::DataEnd => {
                if data.len() < 2 {
                    if data.first().is_some_and(|&b| b != b'\r') {
                        return Err(ParseError::MissingChunkTerminator);
                    }
                    return Ok(0);
                }
                if &data[..2] != b"\r\n" {
                    return Err(ParseError::MissingChunkTerminator);
                }
                self.state = DecodeState::SizeLine;
                Ok(2)
            }
            DecodeState::Trailer => {
                let (n, done) = trailers.parse(data)?;
                if done {
                    self.state = DecodeState::Done;
                }
                Ok(n)
            }
            DecodeState::Done => Err(ParseError::AlreadyDone),
        }
    }
}

/// Parses `chunk-size [ ";" chunk-ext ]`, ignoring the extensions.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let invalid = || ParseError::InvalidChunkSize(String::from_utf8_lossy(line).into_owned());

    let size = match line.iter().position(|&b| b == b';') {
        Some(p) => &line[..p],
        None => line,
    };
    let size = size.trim_ascii();
    if size.is_empty() {
        return Err(invalid());
    }
    size.iter()
        .try_fold(0u64, |acc, &b| {
            let digit = char::from(b).to_digit(16)?;
            acc.checked_mul(16)?.checked_add(u64::from(digit))
        })
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Result<(ChunkedDecoder, Vec<u8>, HttpHeaders, usize), ParseError> {
        let mut decoder = ChunkedDecoder::new();
        let mut body = Vec::new();
        let mut trailers = HttpHeaders::new();
        let n = decoder.decode(data, &mut body, &mut trailers)?;
        Ok((decoder, body, trailers, n))
    }

    #[test]
    fn encode_chunks() {
        assert_eq!(encode_chunk(b"abc"), b"3\r\nabc\r\n");
        assert_eq!(encode_chunk(&[b'x'; 26]).len(), 2 + 2 + 26 + 2);
        assert!(encode_chunk(&[b'x'; 26]).starts_with(b"1a\r\n"));
    }

    #[test]
    fn decode_complete_body() {
        let data = b"3\r\nabc\r\n2\r\nde\r\n0\r\n\r\nleftover";
        let (decoder, body, trailers, n) = decode_all(data).unwrap();
        assert!(decoder.is_done());
        assert_eq!(body, b"abcde");
        assert!(trailers.is_empty());
        assert_eq!(n, data.len() - b"leftover".len());
    }

    #[test]
    fn decode_with_extension_and_trailers() {
        let data = b"A;name=value\r\n0123456789\r\n0\r\nX-Checksum: 42\r\n\r\n";
        let (decoder, body, trailers, n) = decode_all(data).unwrap();
        assert!(decoder.is_done());
        assert_eq!(body, b"0123456789");
        assert_eq!(trailers.get("x-checksum"), Some("42"));
        assert_eq!(n, data.len());
    }

    #[test]
    fn decode_byte_by_byte() {
        let data = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\nExpires: never\r\n\r\n";
        let mut decoder = ChunkedDecoder::new();
        let mut body = Vec::new();
        let mut trailers = HttpHeaders::new();
        let mut pending = Vec::new();
        for &b in data.iter() {
            pending.push(b);
            let n = decoder.decode(&pending, &mut body, &mut trailers).unwrap();
            pending.drain(..n);
        }
        assert!(decoder.is_done());
        assert!(pending.is_empty());
        assert_eq!(body, b"Wikipedia");
        assert_eq!(trailers.get("expires"), Some("never"));
    }

    #[test]
    fn partial_size_line_needs_more_data() {
        let (decoder, body, _, n) = decode_all(b"1f").unwrap();
        assert!(!decoder.is_done());
        assert!(body.is_empty());
        assert_eq!(n, 0);
    }

    #[test]
    fn invalid_size_rejected() {
        for data in [&b"zz\r\n"[..], b"\r\n", b"+5\r\n", b"fffffffffffffffff\r\n"] {
            let err = decode_all(data).unwrap_err();
            assert!(matches!(err, ParseError::InvalidChunkSize(_)));
        }
    }

    #[test]
    fn size_line_parsed_from_bytes() {
        assert_eq!(parse_chunk_size(b"1F").unwrap(), 0x1f);
        assert_eq!(parse_chunk_size(b" a ; ext").unwrap(), 10);
        assert_eq!(parse_chunk_size(b"ffffffffffffffff").unwrap(), u64::MAX);
        assert!(parse_chunk_size(b"1\xe9").is_err());
        assert!(parse_chunk_size(b";ext").is_err());
    }

    #[test]
    fn missing_data_terminator_rejected() {
        let err = decode_all(b"3\r\nabcX\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingChunkTerminator));

        let err = decode_all(b"3\r\nabc\rX").unwrap_err();
        assert!(matches!(err, ParseError::MissingChunkTerminator));
    }
}
