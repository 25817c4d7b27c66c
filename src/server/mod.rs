//! Connection multiplexing.
//!
//! One thread, one poller: the [`Server`] owns the listening socket, the
//! fixed [`SlotTable`] of connections and the [`InterestSet`] telling the
//! poller which way each connection is waiting.

pub mod event_loop;
pub mod interest;
pub mod listener;
pub mod slots;

pub use event_loop::{Server, ShutdownHandle};
pub use interest::InterestSet;
pub use slots::SlotTable;
