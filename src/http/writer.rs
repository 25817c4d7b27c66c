use std::io::{self, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.0";

/// Formats the response head exactly as it goes on the wire.
pub fn serialize_response(resp: &Response) -> Bytes {
    let head = format!(
        "{} {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase(),
        resp.content_length
    );

    let mut buf = BytesMut::with_capacity(head.len());
    buf.put_slice(head.as_bytes());
    buf.freeze()
}

/// A formatted response head plus how much of it has been transmitted.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    /// Number of head bytes already accepted by the peer.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn is_complete(&self) -> bool {
        self.written == self.buffer.len()
    }

    /// Issues a single write of the unsent part of the head.
    ///
    /// Partial writes advance the cursor; `WouldBlock` and other errors are
    /// returned untouched so the caller can decide whether to retry.
    pub fn write_to<W: Write>(&mut self, stream: &mut W) -> io::Result<usize> {
        let n = stream.write(&self.buffer[self.written..])?;

        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "connection closed while writing",
            ));
        }

        self.written += n;
        Ok(n)
    }
}
