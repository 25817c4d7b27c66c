/// HTTP status codes the server answers with.
///
/// - `Ok` (200): File sent or stored
/// - `BadRequest` (400): Malformed request or wrong amount of POST content
/// - `Forbidden` (403): Path tries to leave the serving root
/// - `NotFound` (404): File missing, unopenable, or a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use fileport::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Head of a response: status plus the declared content length.
///
/// The content itself, if any, is streamed from storage after the head has
/// been sent, so it is not part of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Value sent in the `Content-Length` header
    pub content_length: u64,
}

impl Response {
    /// A 200 OK announcing `content_length` bytes of file content.
    pub fn ok(content_length: u64) -> Self {
        Self {
            status: StatusCode::Ok,
            content_length,
        }
    }

    /// A response without content.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_length: 0,
        }
    }

    pub fn bad_request() -> Self {
        Self::empty(StatusCode::BadRequest)
    }

    pub fn forbidden() -> Self {
        Self::empty(StatusCode::Forbidden)
    }

    pub fn not_found() -> Self {
        Self::empty(StatusCode::NotFound)
    }
}
