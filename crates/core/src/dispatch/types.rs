//! Types for the dispatcher.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ticket::{PriorityClass, TicketCode};

/// Scheduler phase, derived from the active flag and the queue contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    /// Dispatching is stopped.
    Idle,
    /// Active, nothing current, at least one ticket waiting.
    WaitingForCurrent,
    /// Active, one ticket is being served.
    Serving,
    /// Active with no tickets at all.
    Empty,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPhase::Idle => write!(f, "idle"),
            DispatchPhase::WaitingForCurrent => write!(f, "waiting_for_current"),
            DispatchPhase::Serving => write!(f, "serving"),
            DispatchPhase::Empty => write!(f, "empty"),
        }
    }
}

/// The two timers owned by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Calls the head of the queue.
    Promote,
    /// Archives the current ticket.
    Archive,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::Promote => "promote",
            TimerKind::Archive => "archive",
        }
    }
}

/// Instruction for the timer driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Schedule a fire of `kind` after `delay`, replacing any pending one.
    Arm {
        kind: TimerKind,
        generation: u64,
        delay: Duration,
    },
    /// Drop the pending timer of `kind`.
    Cancel { kind: TimerKind },
}

/// What caused a ticket to become current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTrigger {
    Timer,
    Manual,
    CallNext,
}

impl CallTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallTrigger::Timer => "timer",
            CallTrigger::Manual => "manual",
            CallTrigger::CallNext => "call_next",
        }
    }
}

/// Change notification published after every queue mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// A ticket joined the waiting queue.
    Enrolled {
        ticket_id: TicketCode,
        priority_class: PriorityClass,
        /// Zero-based place among waiting tickets.
        position: usize,
    },
    /// A ticket became current.
    Called {
        ticket_id: TicketCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        counter_label: Option<String>,
        trigger: CallTrigger,
    },
    /// The previous current ticket went back to waiting.
    Returned { ticket_id: TicketCode },
    /// A ticket finished service and moved to the archive.
    Archived { ticket_id: TicketCode },
    /// Dispatching was started or stopped.
    SchedulerChanged { active: bool },
}

impl QueueEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            QueueEvent::Enrolled { .. } => "enrolled",
            QueueEvent::Called { .. } => "called",
            QueueEvent::Returned { .. } => "returned",
            QueueEvent::Archived { .. } => "archived",
            QueueEvent::SchedulerChanged { .. } => "scheduler_changed",
        }
    }
}

/// Output of one state machine step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub timers: Vec<TimerCommand>,
    pub events: Vec<QueueEvent>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.events.is_empty()
    }
}

/// Current status of the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchStatus {
    pub active: bool,
    pub phase: DispatchPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<TicketCode>,
    /// Waiting priority tickets (current excluded).
    pub priority_waiting: usize,
    /// Waiting normal tickets (current excluded).
    pub normal_waiting: usize,
    pub archived: usize,
    pub promote_pending: bool,
    pub archive_pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(DispatchPhase::Idle.to_string(), "idle");
        assert_eq!(
            DispatchPhase::WaitingForCurrent.to_string(),
            "waiting_for_current"
        );
        assert_eq!(
            serde_json::to_value(DispatchPhase::Serving).unwrap(),
            "serving"
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = QueueEvent::Called {
            ticket_id: "P001".parse().unwrap(),
            counter_label: Some("2".to_string()),
            trigger: CallTrigger::Timer,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "called");
        assert_eq!(json["ticket_id"], "P001");
        assert_eq!(json["counter_label"], "2");
        assert_eq!(json["trigger"], "timer");
        assert_eq!(event.kind(), "called");

        let json = serde_json::to_value(QueueEvent::SchedulerChanged { active: true }).unwrap();
        assert_eq!(json["type"], "scheduler_changed");
        assert_eq!(json["active"], true);
    }
}
