use std::borrow::Cow;

/// HTTP request methods understood by the server.
///
/// Only GET (read a file) and POST (create or overwrite a file) are served;
/// anything else is rejected by the parser as a malformed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Read a file
    GET,
    /// POST - Create or truncate a file and store the request body in it
    POST,
}

impl Method {
    /// Recognizes the method token at the start of a request, including the
    /// separating space.
    ///
    /// Matching is case-insensitive. Returns the method and the number of
    /// bytes it occupies, or `None` if the buffer does not start with a
    /// supported method (yet).
    ///
    /// # Example
    ///
    /// ```
    /// # use fileport::http::request::Method;
    /// assert_eq!(Method::from_prefix(b"GET /a HTTP/1.0"), Some((Method::GET, 4)));
    /// assert_eq!(Method::from_prefix(b"post /a HTTP/1.0"), Some((Method::POST, 5)));
    /// assert_eq!(Method::from_prefix(b"PUT /a HTTP/1.0"), None);
    /// ```
    pub fn from_prefix(buf: &[u8]) -> Option<(Self, usize)> {
        const PREFIXES: [(&[u8], Method); 2] = [(b"GET ", Method::GET), (b"POST ", Method::POST)];

        PREFIXES.iter().find_map(|(prefix, method)| {
            buf.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| (*method, prefix.len()))
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

/// A fully received request line and header block.
///
/// The body is not part of the request: POST content is streamed straight
/// from the socket into storage by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method (GET or POST)
    pub method: Method,
    /// The request path as sent by the client, always starting with `/`.
    /// Raw bytes: file names need not be UTF-8.
    pub path: Vec<u8>,
    /// Value of the `Content-Length` header, if one was sent
    pub content_length: Option<u64>,
}

impl Request {
    /// Whether the path tries to climb out of the serving root.
    ///
    /// Any occurrence of `../` counts, wherever it appears in the path.
    pub fn escapes_root(&self) -> bool {
        self.path.windows(3).any(|w| w == b"../")
    }

    /// The path for logging, with invalid UTF-8 replaced.
    pub fn path_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }
}
