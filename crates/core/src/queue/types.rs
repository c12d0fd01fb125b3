//! Queue entry and snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::{Ticket, TicketCode};

/// Errors returned by queue mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A waiting entry already uses this code.
    #[error("ticket {0} is already enrolled")]
    DuplicateEnrollment(TicketCode),
}

/// Position of an entry in the service flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Waiting,
    /// Being served. Archived entries keep this state.
    Current,
}

/// A ticket held by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub ticket: Ticket,
    pub state: EntryState,
    pub enrolled_at: DateTime<Utc>,
    /// Last time the entry became current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub called_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl QueueEntry {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            state: EntryState::Waiting,
            enrolled_at: Utc::now(),
            called_at: None,
            archived_at: None,
        }
    }

    pub fn id(&self) -> TicketCode {
        self.ticket.id
    }

    pub fn is_current(&self) -> bool {
        self.state == EntryState::Current
    }
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Entry being served, if any.
    pub current: Option<QueueEntry>,
    /// Waiting entries in service order (excludes the current entry).
    pub waiting: Vec<QueueEntry>,
    /// Served entries, oldest first.
    pub archive: Vec<QueueEntry>,
}

impl QueueSnapshot {
    pub fn current_id(&self) -> Option<TicketCode> {
        self.current.as_ref().map(QueueEntry::id)
    }

    pub fn waiting_ids(&self) -> Vec<TicketCode> {
        self.waiting.iter().map(QueueEntry::id).collect()
    }

    pub fn archive_ids(&self) -> Vec<TicketCode> {
        self.archive.iter().map(QueueEntry::id).collect()
    }

    /// True when nothing is waiting or being served.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.waiting.is_empty()
    }
}
