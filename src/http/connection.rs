use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::{Buf, BytesMut};
use tracing::{debug, info};

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::storage::{self, FileStore, OpenMode};

/// Size of the scratch buffer used to copy content between socket and file.
const TRANSFER_BUF_SIZE: usize = 8192;

/// Which way a connection needs the peer to be ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Receiving(ReceivePhase),
    Sending(SendPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivePhase {
    /// Accumulating the request line and headers
    Request,
    /// Copying POST content into the target file
    Body { remaining: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    /// Sending the head of a response that carries file content
    Header { content_length: u64 },
    /// Sending the head of a response without content
    HeaderOnly,
    /// Streaming file content
    Content { remaining: u64 },
}

impl ConnectionState {
    pub fn direction(&self) -> Direction {
        match self {
            ConnectionState::Receiving(_) => Direction::Read,
            ConnectionState::Sending(_) => Direction::Write,
        }
    }
}

/// Outcome of handling a readiness notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for the next readiness notification in `state().direction()`
    Pending,
    /// The exchange is over, successfully or not; release the connection
    Finished,
}

enum Step {
    Continue,
    Blocked,
    Close,
}

/// One accepted client, from the first request byte to the last response
/// byte.
///
/// Handlers perform I/O until the stream would block or the connection
/// changes direction, which keeps them correct under edge-triggered
/// readiness.
pub struct Connection<S> {
    id: usize,
    stream: S,
    state: ConnectionState,
    buffer: BytesMut,
    max_header_len: usize,
    request: Option<Request>,
    writer: Option<ResponseWriter>,
    status: Option<StatusCode>,
    file: Option<File>,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(id: usize, stream: S, max_header_len: usize) -> Self {
        Self {
            id,
            stream,
            state: ConnectionState::Receiving(ReceivePhase::Request),
            buffer: BytesMut::with_capacity(max_header_len),
            max_header_len,
            request: None,
            writer: None,
            status: None,
            file: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Status of the response being sent, once one has been chosen.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_stream(self) -> S {
        self.stream
    }

    /// Handles read readiness: request accumulation and POST content.
    pub fn on_readable(&mut self, store: &FileStore) -> Progress {
        loop {
            let step = match self.state {
                ConnectionState::Receiving(ReceivePhase::Request) => self.receive_request(store),
                ConnectionState::Receiving(ReceivePhase::Body { remaining }) => {
                    self.receive_body(remaining)
                }
                ConnectionState::Sending(_) => return Progress::Pending,
            };

            match step {
                Step::Continue => {}
                Step::Blocked => return Progress::Pending,
                Step::Close => return Progress::Finished,
            }
        }
    }

    /// Handles write readiness: response head and file content.
    pub fn on_writable(&mut self) -> Progress {
        loop {
            let step = match self.state {
                ConnectionState::Sending(SendPhase::HeaderOnly) => self.send_header(None),
                ConnectionState::Sending(SendPhase::Header { content_length }) => {
                    self.send_header(Some(content_length))
                }
                ConnectionState::Sending(SendPhase::Content { remaining }) => {
                    self.send_content(remaining)
                }
                ConnectionState::Receiving(_) => return Progress::Pending,
            };

            match step {
                Step::Continue => {}
                Step::Blocked => return Progress::Pending,
                Step::Close => return Progress::Finished,
            }
        }
    }

    fn receive_request(&mut self, store: &FileStore) -> Step {
        let mut temp = [0u8; TRANSFER_BUF_SIZE];
        let room = (self.max_header_len - self.buffer.len()).min(temp.len());

        let n = match self.stream.read(&mut temp[..room]) {
            Ok(0) => {
                debug!(slot = self.id, "Peer closed before sending a complete request");
                self.respond(Response::bad_request());
                return Step::Continue;
            }
            Ok(n) => n,
            Err(e) => return io_failed(self.id, e, "Failed to read request"),
        };

        self.buffer.extend_from_slice(&temp[..n]);

        match parse_http_request(&self.buffer) {
            Ok((request, consumed)) => {
                // Whatever follows the head is POST content
                self.buffer.advance(consumed);
                self.start(request, store)
            }
            Err(ParseError::Incomplete) if self.buffer.len() < self.max_header_len => {
                Step::Continue
            }
            Err(ParseError::Incomplete) => {
                debug!(
                    slot = self.id,
                    limit = self.max_header_len,
                    "Request head exceeds buffer"
                );
                self.respond(Response::bad_request());
                Step::Continue
            }
            Err(e) => {
                debug!(slot = self.id, error = ?e, "Malformed request");
                self.respond(Response::bad_request());
                Step::Continue
            }
        }
    }

    fn start(&mut self, request: Request, store: &FileStore) -> Step {
        let method = request.method;
        let path = request.path.clone();
        let content_length = request.content_length;
        let forbidden = request.escapes_root();
        self.request = Some(request);

        if forbidden {
            debug!(
                slot = self.id,
                path = %String::from_utf8_lossy(&path),
                "Path escapes serving root"
            );
            self.respond(Response::forbidden());
            return Step::Continue;
        }

        match method {
            Method::GET => self.start_download(&path, store),
            Method::POST => self.start_upload(&path, content_length, store),
        }
    }

    fn start_download(&mut self, path: &[u8], store: &FileStore) -> Step {
        let mut file = match store.open(path, OpenMode::Read) {
            Ok(file) => file,
            Err(e) => {
                debug!(
                    slot = self.id,
                    path = %String::from_utf8_lossy(path),
                    error = %e,
                    "Cannot open file"
                );
                self.respond(Response::not_found());
                return Step::Continue;
            }
        };

        let len = match storage::content_length(&mut file) {
            Ok(len) => len,
            Err(e) => {
                debug!(slot = self.id, error = %e, "Cannot determine file size");
                return Step::Close;
            }
        };

        self.file = Some(file);
        self.respond_with_content(Response::ok(len));
        Step::Continue
    }

    fn start_upload(
        &mut self,
        path: &[u8],
        content_length: Option<u64>,
        store: &FileStore,
    ) -> Step {
        let buffered = self.buffer.len() as u64;

        let content_length = match content_length {
            Some(len) if len >= buffered => len,
            Some(len) => {
                debug!(
                    slot = self.id,
                    content_length = len,
                    buffered,
                    "More POST content than declared"
                );
                self.respond(Response::bad_request());
                return Step::Continue;
            }
            None => {
                debug!(slot = self.id, "POST without Content-Length");
                self.respond(Response::bad_request());
                return Step::Continue;
            }
        };

        let mut file = match store.open(path, OpenMode::Create) {
            Ok(file) => file,
            Err(e) => {
                debug!(
                    slot = self.id,
                    path = %String::from_utf8_lossy(path),
                    error = %e,
                    "Cannot create file"
                );
                self.respond(Response::not_found());
                return Step::Continue;
            }
        };

        if let Err(e) = file.write_all(&self.buffer) {
            debug!(slot = self.id, error = %e, "Failed to store POST content");
            return Step::Close;
        }
        self.buffer.clear();

        let remaining = content_length - buffered;
        if remaining == 0 {
            drop(file);
            self.respond(Response::empty(StatusCode::Ok));
        } else {
            self.file = Some(file);
            self.state = ConnectionState::Receiving(ReceivePhase::Body { remaining });
        }

        Step::Continue
    }

    fn receive_body(&mut self, remaining: u64) -> Step {
        let mut chunk = [0u8; TRANSFER_BUF_SIZE];

        let n = match self.stream.read(&mut chunk) {
            Ok(n) if n == 0 || n as u64 > remaining => {
                debug!(
                    slot = self.id,
                    received = n,
                    remaining,
                    "Wrong amount of POST content"
                );
                self.respond(Response::bad_request());
                return Step::Continue;
            }
            Ok(n) => n,
            Err(e) => return io_failed(self.id, e, "Failed to read POST content"),
        };

        let Some(file) = self.file.as_mut() else {
            return Step::Close;
        };

        if let Err(e) = file.write_all(&chunk[..n]) {
            debug!(slot = self.id, error = %e, "Failed to store POST content");
            return Step::Close;
        }

        let remaining = remaining - n as u64;
        if remaining == 0 {
            self.respond(Response::empty(StatusCode::Ok));
        } else {
            self.state = ConnectionState::Receiving(ReceivePhase::Body { remaining });
        }

        Step::Continue
    }

    fn send_header(&mut self, content_length: Option<u64>) -> Step {
        let Some(writer) = self.writer.as_mut() else {
            return Step::Close;
        };

        let result = writer.write_to(&mut self.stream);
        let complete = writer.is_complete();

        match result {
            Err(e) => return io_failed(self.id, e, "Failed to send response header"),
            Ok(_) if !complete => return Step::Continue,
            Ok(_) => {}
        }

        match content_length {
            Some(remaining) => {
                self.state = ConnectionState::Sending(SendPhase::Content { remaining });
                Step::Continue
            }
            None => {
                debug!(slot = self.id, "Response sent");
                Step::Close
            }
        }
    }

    fn send_content(&mut self, remaining: u64) -> Step {
        if remaining == 0 {
            debug!(slot = self.id, "Response sent");
            return Step::Close;
        }

        let Some(file) = self.file.as_mut() else {
            return Step::Close;
        };

        let mut chunk = [0u8; TRANSFER_BUF_SIZE];
        let want = usize::try_from(remaining).map_or(chunk.len(), |r| r.min(chunk.len()));

        let read = match file.read(&mut chunk[..want]) {
            Ok(0) => {
                debug!(slot = self.id, remaining, "File ended before declared length");
                return Step::Close;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Step::Continue,
            Err(e) => {
                debug!(slot = self.id, error = %e, "Failed to read file content");
                return Step::Close;
            }
        };

        let written = match self.stream.write(&chunk[..read]) {
            Ok(0) => {
                debug!(slot = self.id, "Peer stopped accepting content");
                return Step::Close;
            }
            Ok(n) => n,
            Err(e) => {
                // Nothing was accepted; the whole chunk goes back
                if let Err(seek_err) = unread(file, read) {
                    debug!(slot = self.id, error = %seek_err, "Failed to rewind file");
                    return Step::Close;
                }
                return io_failed(self.id, e, "Failed to send content");
            }
        };

        if written < read {
            if let Err(e) = unread(file, read - written) {
                debug!(slot = self.id, error = %e, "Failed to rewind file");
                return Step::Close;
            }
        }

        self.state = ConnectionState::Sending(SendPhase::Content {
            remaining: remaining - written as u64,
        });
        Step::Continue
    }

    /// Queues a response without content. Any open file is closed.
    fn respond(&mut self, response: Response) {
        self.file = None;
        self.queue(response, ConnectionState::Sending(SendPhase::HeaderOnly));
    }

    /// Queues a response whose content is streamed from the open file.
    fn respond_with_content(&mut self, response: Response) {
        let state = ConnectionState::Sending(SendPhase::Header {
            content_length: response.content_length,
        });
        self.queue(response, state);
    }

    fn queue(&mut self, response: Response, state: ConnectionState) {
        let (method, path) = match self.request() {
            Some(request) => (request.method.as_str(), request.path_lossy()),
            None => ("-", Cow::Borrowed("-")),
        };

        info!(
            slot = self.id,
            method,
            path = %path,
            status = response.status.as_u16(),
            content_length = response.content_length,
            "Responding"
        );

        self.buffer.clear();
        self.status = Some(response.status);
        self.writer = Some(ResponseWriter::new(&response));
        self.state = state;
    }
}

/// Moves the file cursor back over `len` bytes that were read but not sent.
fn unread(file: &mut File, len: usize) -> io::Result<u64> {
    let offset = i64::try_from(len).map_err(io::Error::other)?;
    file.seek(SeekFrom::Current(-offset))
}

/// Would-block waits for the next notification and interrupted calls are
/// retried; anything else ends the connection.
fn io_failed(slot: usize, err: io::Error, what: &'static str) -> Step {
    match err.kind() {
        io::ErrorKind::WouldBlock => Step::Blocked,
        io::ErrorKind::Interrupted => Step::Continue,
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => {
            debug!(slot, error = %err, "{what}: peer went away");
            Step::Close
        }
        _ => {
            debug!(slot, error = %err, "{what}");
            Step::Close
        }
    }
}
