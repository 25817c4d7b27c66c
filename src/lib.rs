//! fileport - minimal HTTP/1.0 file server
//!
//! GET reads a file below the serving root, POST creates or overwrites one.
//! All connections are driven by a single readiness-based event loop.

pub mod config;
pub mod http;
pub mod server;
pub mod storage;
