use std::net::SocketAddr;

use anyhow::Context;
use mio::net::TcpListener;
use tracing::info;

/// Opens the non-blocking listening socket (with address reuse) the event
/// loop takes over.
pub fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener =
        TcpListener::bind(addr).with_context(|| format!("failed to listen on {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(listener)
}
