//! Waiting queue and service archive.
//!
//! The store owns the ordering invariant: every priority entry precedes every
//! normal entry, and entries of the same class keep their arrival order.

mod store;
mod types;

pub use store::QueueStore;
pub use types::{EntryState, QueueEntry, QueueError, QueueSnapshot};
