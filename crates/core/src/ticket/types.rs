//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TicketCode;

/// Queue precedence class, fixed when the ticket is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    /// Served ahead of every normal ticket.
    Priority,
    /// Served in arrival order after all priority tickets.
    Normal,
}

impl PriorityClass {
    /// Letter used as the ticket code prefix.
    pub fn prefix(&self) -> char {
        match self {
            PriorityClass::Priority => 'P',
            PriorityClass::Normal => 'C',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'P' => Some(PriorityClass::Priority),
            'C' => Some(PriorityClass::Normal),
            _ => None,
        }
    }

    /// Sort rank: lower is served first.
    pub fn rank(&self) -> u8 {
        match self {
            PriorityClass::Priority => 0,
            PriorityClass::Normal => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityClass::Priority => "priority",
            PriorityClass::Normal => "normal",
        }
    }
}

/// A registrant's service request.
///
/// Tickets are immutable once issued. The priority class is taken from the
/// code prefix so the displayed code and the queue precedence never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Displayed code, unique among active tickets.
    pub id: TicketCode,
    /// Name or descriptor of the registrant (opaque to the queue).
    pub subject: String,
    pub priority_class: PriorityClass,
    /// Room or counter shown when the ticket is called.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_label: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl Ticket {
    /// Issue a ticket for `subject` under `id`.
    pub fn new(id: TicketCode, subject: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            priority_class: id.class(),
            counter_label: None,
            issued_at: Utc::now(),
        }
    }

    /// Attach the counter label displayed when this ticket is called.
    pub fn with_counter_label(mut self, label: impl Into<String>) -> Self {
        self.counter_label = Some(label.into());
        self
    }

    pub fn is_priority(&self) -> bool {
        self.priority_class == PriorityClass::Priority
    }
}
