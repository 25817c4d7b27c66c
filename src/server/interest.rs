use std::io;

use mio::event::Source;
use mio::{Interest, Registry, Token};

use crate::http::connection::Direction;

/// Readiness directions a handle is interested in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wanted {
    pub read: bool,
    pub write: bool,
}

impl Wanted {
    pub fn from_direction(direction: Direction) -> Self {
        Self {
            read: direction == Direction::Read,
            write: direction == Direction::Write,
        }
    }

    fn to_interest(self) -> Option<Interest> {
        match (self.read, self.write) {
            (true, true) => Some(Interest::READABLE | Interest::WRITABLE),
            (true, false) => Some(Interest::READABLE),
            (false, true) => Some(Interest::WRITABLE),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    wanted: Wanted,
    registered: Wanted,
    queued: bool,
}

/// Per-token read/write interest.
///
/// Toggling interest only records the wish. [`apply`](Self::apply) pushes it
/// into the multiplexer, which the event loop does right before waiting, so a
/// wait always runs against the interest as it stood when the wait began.
pub struct InterestSet {
    entries: Vec<Entry>,
    dirty: Vec<Token>,
}

impl InterestSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![Entry::default(); capacity],
            dirty: Vec::new(),
        }
    }

    pub fn want_read(&mut self, token: Token, on: bool) {
        self.update(token, |wanted| wanted.read = on);
    }

    pub fn want_write(&mut self, token: Token, on: bool) {
        self.update(token, |wanted| wanted.write = on);
    }

    /// Interest in exactly one direction.
    pub fn want(&mut self, token: Token, direction: Direction) {
        let target = Wanted::from_direction(direction);
        self.update(token, |wanted| *wanted = target);
    }

    pub fn wanted(&self, token: Token) -> Wanted {
        self.entries.get(token.0).map(|e| e.wanted).unwrap_or_default()
    }

    /// Interest the multiplexer is currently waiting with.
    pub fn registered(&self, token: Token) -> Wanted {
        self.entries
            .get(token.0)
            .map(|e| e.registered)
            .unwrap_or_default()
    }

    /// Tokens whose wanted interest differs from the registered one.
    pub fn take_dirty(&mut self) -> Vec<Token> {
        let dirty = std::mem::take(&mut self.dirty);
        for token in &dirty {
            if let Some(entry) = self.entries.get_mut(token.0) {
                entry.queued = false;
            }
        }
        dirty
    }

    /// Brings the multiplexer registration of `source` in line with the
    /// wanted interest.
    pub fn apply<S>(&mut self, registry: &Registry, token: Token, source: &mut S) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        let Some(entry) = self.entries.get_mut(token.0) else {
            return Ok(());
        };

        if entry.wanted == entry.registered {
            return Ok(());
        }

        match (entry.registered.to_interest(), entry.wanted.to_interest()) {
            (None, Some(interest)) => registry.register(source, token, interest)?,
            (Some(_), Some(interest)) => registry.reregister(source, token, interest)?,
            (Some(_), None) => registry.deregister(source)?,
            (None, None) => {}
        }

        entry.registered = entry.wanted;
        Ok(())
    }

    /// Drops every interest of `token`, deregistering `source` if needed.
    pub fn remove<S>(&mut self, registry: &Registry, token: Token, source: &mut S) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        let Some(entry) = self.entries.get_mut(token.0) else {
            return Ok(());
        };

        let was_registered = entry.registered.to_interest().is_some();
        *entry = Entry::default();

        if was_registered {
            registry.deregister(source)?;
        }
        Ok(())
    }

    fn update(&mut self, token: Token, change: impl FnOnce(&mut Wanted)) {
        let Some(entry) = self.entries.get_mut(token.0) else {
            return;
        };

        change(&mut entry.wanted);

        if entry.wanted != entry.registered && !entry.queued {
            entry.queued = true;
            self.dirty.push(token);
        }
    }
}
