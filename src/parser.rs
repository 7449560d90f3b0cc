//! HTTP/1.x request-line/header parsing and chunked transfer-coding
//! decoding, both hand-rolled over raw bytes rather than routed through a
//! general-purpose HTTP parsing crate: this is core engine logic, not
//! ambient plumbing.

use memchr::memchr;

use crate::headers::HeaderMap;
use crate::method::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Not enough bytes buffered yet; read more and retry.
    Incomplete,
    /// Malformed request line or header block.
    Invalid,
    /// The header block exceeds the configured size cap.
    TooLarge,
}

/// A parsed request line plus headers. `consumed` is the number of bytes
/// of `buf` occupied by the request line and header block (up to and
/// including the terminating blank line); body bytes start there.
pub struct ParsedHead {
    pub method: Method,
    pub target: String,
    pub version_minor: u8,
    pub headers: HeaderMap,
    pub consumed: usize,
}

/// Parse a request line and header block out of `buf`, rejecting anything
/// beyond `max_header_bytes` before it is known to be complete.
pub fn parse_head(buf: &[u8], max_header_bytes: usize) -> Result<ParsedHead, ParseError> {
    let header_end = find_header_end(buf, max_header_bytes)?;
    let head = &buf[..header_end];

    let line_end = memchr(b'\r', head).filter(|&i| head.get(i + 1) == Some(&b'\n'));
    let line_end = line_end.ok_or(ParseError::Invalid)?;
    let line = std::str::from_utf8(&head[..line_end]).map_err(|_| ParseError::Invalid)?;

    let mut parts = line.split(' ');
    let method_str = parts.next().ok_or(ParseError::Invalid)?;
    let target = parts.next().ok_or(ParseError::Invalid)?.to_string();
    let version_str = parts.next().ok_or(ParseError::Invalid)?;
    if parts.next().is_some() {
        return Err(ParseError::Invalid);
    }
    let version_minor = parse_http_version(version_str)?;
    let method = Method::from_bytes(method_str.as_bytes());

    let mut headers = HeaderMap::new();
    let mut cursor = line_end + 2;
    loop {
        if head[cursor..].starts_with(b"\r\n") {
            cursor += 2;
            break;
        }
        let rest = &head[cursor..];
        let line_len = memchr(b'\r', rest)
            .filter(|&i| rest.get(i + 1) == Some(&b'\n'))
            .ok_or(ParseError::Invalid)?;
        let header_line =
            std::str::from_utf8(&rest[..line_len]).map_err(|_| ParseError::Invalid)?;
        let (name, value) = header_line.split_once(':').ok_or(ParseError::Invalid)?;
        headers.insert(name.trim(), value.trim());
        cursor += line_len + 2;
    }

    Ok(ParsedHead {
        method,
        target,
        version_minor,
        headers,
        consumed: cursor,
    })
}

fn parse_http_version(s: &str) -> Result<u8, ParseError> {
    match s {
        "HTTP/1.0" => Ok(0),
        "HTTP/1.1" => Ok(1),
        _ => Err(ParseError::Invalid),
    }
}

fn find_header_end(buf: &[u8], max_header_bytes: usize) -> Result<usize, ParseError> {
    let mut search_from = 0;
    while let Some(rel) = memchr(b'\n', &buf[search_from..]) {
        let idx = search_from + rel;
        if idx >= 3 && &buf[idx - 3..=idx] == b"\r\n\r\n" {
            if idx + 1 > max_header_bytes {
                return Err(ParseError::TooLarge);
            }
            return Ok(idx + 1);
        }
        search_from = idx + 1;
    }
    if buf.len() >= max_header_bytes {
        return Err(ParseError::TooLarge);
    }
    Err(ParseError::Incomplete)
}

/// Decode as many complete chunks as are present in `buf`, appending their
/// payload bytes to `out`. Returns the number of input bytes consumed and
/// whether the terminating zero-length chunk (plus trailer CRLF) was seen.
pub fn decode_chunks(buf: &[u8], out: &mut Vec<u8>) -> Result<(usize, bool), ParseError> {
    let mut cursor = 0;
    loop {
        let rest = &buf[cursor..];
        let line_end = match memchr(b'\n', rest) {
            Some(i) if i > 0 && rest[i - 1] == b'\r' => i,
            Some(_) => return Err(ParseError::Invalid),
            None => return Ok((cursor, false)),
        };
        let size_line = std::str::from_utf8(&rest[..line_end - 1]).map_err(|_| ParseError::Invalid)?;
        let size_str = size_line.split(';').next().unwrap_or("");
        let size = usize::from_str_radix(size_str.trim(), 16).map_err(|_| ParseError::Invalid)?;

        let body_start = cursor + line_end + 1;
        if size == 0 {
            // Final chunk: require the trailing CRLF that ends the trailer
            // section (we don't support trailers beyond skipping them).
            if buf.len() < body_start + 2 {
                return Ok((cursor, false));
            }
            if &buf[body_start..body_start + 2] != b"\r\n" {
                return Err(ParseError::Invalid);
            }
            return Ok((body_start + 2, true));
        }

        let body_end = body_start + size;
        if buf.len() < body_end + 2 {
            return Ok((cursor, false));
        }
        if &buf[body_end..body_end + 2] != b"\r\n" {
            return Err(ParseError::Invalid);
        }
        out.extend_from_slice(&buf[body_start..body_end]);
        cursor = body_end + 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_get() {
        let raw = b"GET /a/b?x=1 HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";
        let head = parse_head(raw, 8192).unwrap();
        assert_eq!(head.method, Method::Get);
        assert_eq!(head.target, "/a/b?x=1");
        assert_eq!(head.version_minor, 1);
        assert_eq!(head.headers.get("host"), Some("example.com"));
        assert_eq!(head.consumed, raw.len());
    }

    #[test]
    fn incomplete_without_blank_line() {
        let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
        assert_eq!(parse_head(raw, 8192), Err(ParseError::Incomplete));
    }

    #[test]
    fn rejects_oversized_headers() {
        let raw = b"GET / HTTP/1.1\r\nX: aaaaaaaaaaaaaaaaaaaa\r\n\r\n";
        assert_eq!(parse_head(raw, 8), Err(ParseError::TooLarge));
    }

    #[test]
    fn decodes_two_chunks_and_terminator() {
        let raw = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut out = Vec::new();
        let (consumed, done) = decode_chunks(raw, &mut out).unwrap();
        assert_eq!(consumed, raw.len());
        assert!(done);
        assert_eq!(out, b"Wikipedia");
    }

    #[test]
    fn incomplete_chunk_waits_for_more_bytes() {
        let raw = b"4\r\nWi";
        let mut out = Vec::new();
        let (consumed, done) = decode_chunks(raw, &mut out).unwrap();
        assert_eq!(consumed, 0);
        assert!(!done);
        assert!(out.is_empty());
    }
}
