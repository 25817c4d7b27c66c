use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mio::event::Event;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, error, info, warn};

use crate::config::{Config, ServerConfig};
use crate::http::connection::{Connection, Direction, Progress};
use crate::server::interest::InterestSet;
use crate::server::listener;
use crate::server::slots::SlotTable;
use crate::storage::FileStore;

const LISTENER: Token = Token(usize::MAX);
const WAKER: Token = Token(usize::MAX - 1);

const EVENTS_CAPACITY: usize = 1024;

/// Longest wait while clients may still sit in the accept queue. The listener
/// is edge-triggered and will not report them again.
const ACCEPT_RETRY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
struct Readiness {
    readable: bool,
    writable: bool,
}

impl Readiness {
    fn of(event: &Event) -> Self {
        // Hang-ups and errors surface through the next read or write
        Self {
            readable: event.is_readable() || event.is_read_closed() || event.is_error(),
            writable: event.is_writable() || event.is_write_closed() || event.is_error(),
        }
    }
}

/// Stops a running [`Server`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) -> io::Result<()> {
        self.waker.wake()
    }
}

/// The single-threaded event loop serving every connection.
pub struct Server {
    poll: Poll,
    events: Events,
    ready: Vec<(usize, Readiness)>,
    listener: TcpListener,
    waker: Arc<Waker>,
    slots: SlotTable<Connection<TcpStream>>,
    interest: InterestSet,
    store: FileStore,
    max_header_len: usize,
    accept_pending: bool,
    stopped: bool,
}

impl Server {
    /// Binds the configured address and prepares the loop.
    pub fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let listener = listener::bind(cfg.listen_addr)?;
        Self::new(listener, &cfg.server)
    }

    /// Takes over an already listening socket.
    pub fn new(mut listener: TcpListener, cfg: &ServerConfig) -> anyhow::Result<Self> {
        let poll = Poll::new().context("failed to create poller")?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .context("failed to register listening socket")?;
        let waker = Waker::new(poll.registry(), WAKER).context("failed to create waker")?;

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            ready: Vec::with_capacity(EVENTS_CAPACITY),
            listener,
            waker: Arc::new(waker),
            slots: SlotTable::with_capacity(cfg.max_connections),
            interest: InterestSet::with_capacity(cfg.max_connections),
            store: FileStore::new(cfg.root.clone()),
            max_header_len: cfg.max_header_len,
            accept_pending: false,
            stopped: false,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            waker: Arc::clone(&self.waker),
        }
    }

    /// Number of bound connection slots.
    pub fn connections(&self) -> usize {
        self.slots.len()
    }

    /// Serves until a [`ShutdownHandle`] fires or waiting fails.
    pub fn run(&mut self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            root = %self.store.root().display(),
            capacity = self.slots.capacity(),
            "Serving files"
        );

        while !self.stopped {
            if let Err(e) = self.turn(None) {
                error!(error = %e, "Event loop failed");
                return Err(e);
            }
        }

        info!(open = self.connections(), "Event loop stopped");
        Ok(())
    }

    /// One iteration: flush interest, wait, dispatch, accept.
    pub fn turn(&mut self, timeout: Option<Duration>) -> anyhow::Result<()> {
        self.sync_interest();

        let timeout = if self.accept_pending && !self.slots.is_full() {
            Some(timeout.map_or(ACCEPT_RETRY, |t| t.min(ACCEPT_RETRY)))
        } else {
            timeout
        };

        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e).context("waiting for readiness failed"),
        }

        let mut ready = std::mem::take(&mut self.ready);
        for event in self.events.iter() {
            match event.token() {
                LISTENER => self.accept_pending = true,
                WAKER => self.stopped = true,
                Token(index) => ready.push((index, Readiness::of(event))),
            }
        }

        for (index, readiness) in ready.drain(..) {
            self.dispatch(index, readiness);
        }
        self.ready = ready;

        // Runs after dispatch so slots released above can take deferred clients
        if self.accept_pending && !self.stopped {
            self.accept();
        }

        Ok(())
    }

    fn dispatch(&mut self, index: usize, readiness: Readiness) {
        let token = Token(index);
        let registered = self.interest.registered(token);

        let Some(conn) = self.slots.get_mut(index) else {
            return;
        };

        let progress = match conn.state().direction() {
            Direction::Read if readiness.readable && registered.read => {
                conn.on_readable(&self.store)
            }
            Direction::Write if readiness.writable && registered.write => conn.on_writable(),
            _ => return,
        };

        match progress {
            Progress::Pending => {
                let direction = conn.state().direction();
                self.interest.want(token, direction);
            }
            Progress::Finished => self.release(index),
        }
    }

    fn accept(&mut self) {
        while self.accept_pending {
            let Some(index) = self.slots.allocate() else {
                debug!(
                    capacity = self.slots.capacity(),
                    "Connection table full, deferring accept"
                );
                return;
            };

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!(slot = index, peer = %peer, "Accepted connection");
                    self.slots
                        .occupy(index, Connection::new(index, stream, self.max_header_len));
                    self.interest.want(Token(index), Direction::Read);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => self.accept_pending = false,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted
                            | io::ErrorKind::ConnectionAborted
                            | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    debug!(error = %e, "Pending connection withdrawn");
                }
                Err(e) => {
                    // Retried once the next wait times out
                    warn!(error = %e, "Failed to accept connection");
                    return;
                }
            }
        }
    }

    /// Frees a slot: drops its interest, then closes socket and file.
    fn release(&mut self, index: usize) {
        let Some(mut conn) = self.slots.release(index) else {
            return;
        };

        if let Err(e) = self
            .interest
            .remove(self.poll.registry(), Token(index), conn.stream_mut())
        {
            debug!(slot = index, error = %e, "Failed to deregister connection");
        }

        debug!(
            slot = index,
            status = ?conn.status().map(|s| s.as_u16()),
            "Connection closed"
        );
    }

    fn sync_interest(&mut self) {
        for token in self.interest.take_dirty() {
            let Some(conn) = self.slots.get_mut(token.0) else {
                continue;
            };

            if let Err(e) = self
                .interest
                .apply(self.poll.registry(), token, conn.stream_mut())
            {
                warn!(slot = token.0, error = %e, "Failed to update readiness interest");
                self.release(token.0);
            }
        }
    }
}
