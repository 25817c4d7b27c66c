use crate::http::request::{Method, Request};

/// Size of the path buffer a request target must fit in once it has been
/// prefixed with `.` and terminated.
pub const MAX_PATH_LEN: usize = 256;

/// Largest accepted `Content-Length`; anything above cannot be addressed by
/// a file offset.
pub const MAX_CONTENT_LENGTH: u64 = i64::MAX as u64;

const REQUEST_LINE_SUFFIX: &[u8] = b" HTTP/1.0";
const CRLF: &[u8] = b"\r\n";
const CONTENT_LENGTH: &[u8] = b"content-length:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidPath,
    PathTooLong,
    InvalidContentLength,
    Incomplete,
}

/// Parses the request line and headers accumulated so far.
///
/// The buffer is scanned from the start on every call. On success returns the
/// request and the number of bytes taken by the head; anything after that
/// offset is body already received. `ParseError::Incomplete` means the blank
/// line ending the headers has not arrived yet.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let (method, mut pos) = match Method::from_prefix(buf) {
        Some(found) => found,
        // "POST " is the longest method token, but any 5 bytes that did not
        // match "GET " already rule out every method
        None if buf.len() > 4 => return Err(ParseError::InvalidMethod),
        None => return Err(ParseError::Incomplete),
    };

    // Request line
    let line_len = find_crlf(&buf[pos..]).ok_or(ParseError::Incomplete)?;
    let line = &buf[pos..pos + line_len];
    let target = line
        .strip_suffix(REQUEST_LINE_SUFFIX)
        .ok_or(ParseError::InvalidRequest)?;

    if target.first() != Some(&b'/') {
        return Err(ParseError::InvalidPath);
    }
    if target.len() >= MAX_PATH_LEN - 2 {
        return Err(ParseError::PathTooLong);
    }
    pos += line_len + CRLF.len();

    // Headers
    let mut content_length = None;

    loop {
        let rest = &buf[pos..];
        if rest.starts_with(CRLF) {
            pos += CRLF.len();
            break;
        }

        let line_len = find_crlf(rest).ok_or(ParseError::Incomplete)?;
        let line = &rest[..line_len];

        if line.len() >= CONTENT_LENGTH.len()
            && line[..CONTENT_LENGTH.len()].eq_ignore_ascii_case(CONTENT_LENGTH)
        {
            content_length = Some(parse_content_length(&line[CONTENT_LENGTH.len()..])?);
        }

        pos += line_len + CRLF.len();
    }

    let request = Request {
        method,
        path: target.to_vec(),
        content_length,
    };

    Ok((request, pos))
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    let value = std::str::from_utf8(value)
        .map_err(|_| ParseError::InvalidContentLength)?
        .trim();

    // `u64::from_str` would accept a leading '+'
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength);
    }

    value
        .parse::<u64>()
        .ok()
        .filter(|n| *n <= MAX_CONTENT_LENGTH)
        .ok_or(ParseError::InvalidContentLength)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}
