//! HTTP/1.0 protocol implementation.
//!
//! Every connection carries exactly one request and one response; the server
//! always answers with `Connection: close`.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request/response state machine
//! - **`parser`**: Recognizes a complete request head in a byte buffer
//! - **`request`**: Parsed request representation
//! - **`response`**: Status codes and response heads
//! - **`writer`**: Serializes a response head and tracks how much was sent
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────────┐
//!        │  Receiving(Request)  │ ← Accumulate request line + headers
//!        └──────┬───────────────┘
//!               │ POST head complete      GET head complete / error
//!               ▼                                  │
//!        ┌──────────────────────┐                  │
//!        │   Receiving(Body)    │ ← Copy content   │
//!        └──────┬───────────────┘   into the file  │
//!               │ all content stored / error       │
//!               ▼                                  ▼
//!        ┌──────────────────────┐   ┌──────────────────────┐
//!        │ Sending(HeaderOnly)  │   │   Sending(Header)    │
//!        └──────┬───────────────┘   └──────┬───────────────┘
//!               │                          ▼
//!               │                   ┌──────────────────────┐
//!               │                   │   Sending(Content)   │ ← Stream file
//!               │                   └──────┬───────────────┘
//!               ▼                          ▼
//!                          Closed
//! ```
//!
//! Receiving states need read readiness, sending states write readiness; the
//! event loop derives the interest of every connection from its state.

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
