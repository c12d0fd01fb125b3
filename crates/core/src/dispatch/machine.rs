//! Synchronous dispatch state machine.
//!
//! Every public operation finishes by re-evaluating which timers should be
//! pending and returns the resulting [`Effects`]. Pending timers are tracked
//! by generation; a fire whose generation no longer matches is ignored.

use chrono::Utc;
use tracing::{debug, warn};

use crate::metrics::{
    DUPLICATE_ENROLLMENTS, STALE_TIMER_FIRES, TICKETS_ARCHIVED, TICKETS_CALLED, TICKETS_ENROLLED,
    WAIT_TIME,
};
use crate::queue::{QueueError, QueueSnapshot, QueueStore};
use crate::ticket::{Ticket, TicketCode};

use super::config::DispatchConfig;
use super::types::{
    CallTrigger, DispatchPhase, DispatchStatus, Effects, QueueEvent, TimerCommand, TimerKind,
};

/// Queue store plus scheduler state.
#[derive(Debug)]
pub struct DispatchMachine {
    config: DispatchConfig,
    store: QueueStore,
    active: bool,
    promote_generation: Option<u64>,
    archive_generation: Option<u64>,
    next_generation: u64,
}

impl DispatchMachine {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            store: QueueStore::new(),
            active: false,
            promote_generation: None,
            archive_generation: None,
            next_generation: 1,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.store.snapshot()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> DispatchPhase {
        if !self.active {
            DispatchPhase::Idle
        } else if self.store.current().is_some() {
            DispatchPhase::Serving
        } else if self.store.head().is_some() {
            DispatchPhase::WaitingForCurrent
        } else {
            DispatchPhase::Empty
        }
    }

    /// Generation of the pending timer of `kind`, if one is armed.
    pub fn pending(&self, kind: TimerKind) -> Option<u64> {
        match kind {
            TimerKind::Promote => self.promote_generation,
            TimerKind::Archive => self.archive_generation,
        }
    }

    pub fn status(&self) -> DispatchStatus {
        let priority_waiting = self
            .store
            .waiting()
            .filter(|e| e.ticket.is_priority())
            .count();
        let normal_waiting = self.store.waiting().count() - priority_waiting;

        DispatchStatus {
            active: self.active,
            phase: self.phase(),
            current: self.store.current().map(|e| e.id()),
            priority_waiting,
            normal_waiting,
            archived: self.store.archive().len(),
            promote_pending: self.promote_generation.is_some(),
            archive_pending: self.archive_generation.is_some(),
        }
    }

    /// Activate dispatching. Timers are computed from scratch.
    pub fn start(&mut self) -> Effects {
        let mut fx = Effects::default();
        if self.active {
            return fx;
        }

        self.active = true;
        fx.events.push(QueueEvent::SchedulerChanged { active: true });
        self.reevaluate(&mut fx);
        debug!(phase = %self.phase(), "Dispatch started");
        fx
    }

    /// Deactivate dispatching and drop both timers. No entries move.
    pub fn stop(&mut self) -> Effects {
        let mut fx = Effects::default();
        if !self.active {
            return fx;
        }

        self.active = false;
        self.cancel(TimerKind::Promote, &mut fx);
        self.cancel(TimerKind::Archive, &mut fx);
        fx.events.push(QueueEvent::SchedulerChanged { active: false });
        debug!("Dispatch stopped");
        fx
    }

    /// Add a ticket to the queue.
    ///
    /// The promote timer is only touched when the queue was empty or the new
    /// ticket took over the head.
    pub fn enroll(&mut self, ticket: Ticket) -> Result<Effects, QueueError> {
        let mut fx = Effects::default();
        let phase_before = self.phase();
        let head_before = self.store.head().map(|e| e.id());
        let ticket_id = ticket.id;
        let priority_class = ticket.priority_class;

        if let Err(e) = self.store.enroll(ticket) {
            DUPLICATE_ENROLLMENTS.inc();
            warn!(ticket_id = %ticket_id, "Rejected enrollment: {}", e);
            return Err(e);
        }

        TICKETS_ENROLLED
            .with_label_values(&[priority_class.as_str()])
            .inc();

        let position = self
            .store
            .waiting()
            .position(|e| e.id() == ticket_id)
            .unwrap_or_default();
        fx.events.push(QueueEvent::Enrolled {
            ticket_id,
            priority_class,
            position,
        });
        debug!(ticket_id = %ticket_id, position, "Ticket enrolled");

        match phase_before {
            DispatchPhase::Empty => self.reevaluate(&mut fx),
            DispatchPhase::WaitingForCurrent => {
                let head_after = self.store.head().map(|e| e.id());
                if head_after != head_before {
                    self.arm_promote(&mut fx);
                }
            }
            DispatchPhase::Serving | DispatchPhase::Idle => {}
        }

        Ok(fx)
    }

    /// Manually make `id` current.
    ///
    /// Returns `None` without side effects when `id` is not waiting, which is
    /// how stale taps on already-served tickets are absorbed.
    pub fn select_current(&mut self, id: &TicketCode) -> Option<Effects> {
        if !self.store.contains(id) {
            debug!(ticket_id = %id, "Ignoring selection of unknown ticket");
            return None;
        }

        let mut fx = Effects::default();
        self.cancel(TimerKind::Promote, &mut fx);
        self.cancel(TimerKind::Archive, &mut fx);
        self.call(*id, CallTrigger::Manual, &mut fx);
        if self.active {
            self.arm_archive(&mut fx);
        }
        Some(fx)
    }

    /// Finish the current ticket now and call the head of the queue.
    pub fn call_next(&mut self) -> Effects {
        let mut fx = Effects::default();
        self.cancel(TimerKind::Promote, &mut fx);
        self.cancel(TimerKind::Archive, &mut fx);
        self.archive_current(&mut fx);

        if let Some(head) = self.store.head().map(|e| e.id()) {
            self.call(head, CallTrigger::CallNext, &mut fx);
        }
        self.reevaluate(&mut fx);
        fx
    }

    /// Handle a timer fire. Stale generations are no-ops.
    pub fn timer_fired(&mut self, kind: TimerKind, generation: u64) -> Effects {
        let mut fx = Effects::default();
        let slot = match kind {
            TimerKind::Promote => &mut self.promote_generation,
            TimerKind::Archive => &mut self.archive_generation,
        };

        if !self.active || *slot != Some(generation) {
            STALE_TIMER_FIRES.with_label_values(&[kind.as_str()]).inc();
            debug!(timer = kind.as_str(), generation, "Ignoring stale timer");
            return fx;
        }
        *slot = None;

        match kind {
            TimerKind::Promote => {
                if self.store.current().is_none() {
                    if let Some(head) = self.store.head().map(|e| e.id()) {
                        self.call(head, CallTrigger::Timer, &mut fx);
                    }
                }
            }
            TimerKind::Archive => self.archive_current(&mut fx),
        }

        self.reevaluate(&mut fx);
        fx
    }

    /// Arm whatever timer the current phase calls for, if it is not pending.
    fn reevaluate(&mut self, fx: &mut Effects) {
        match self.phase() {
            DispatchPhase::Serving => {
                if self.archive_generation.is_none() {
                    self.arm_archive(fx);
                }
            }
            DispatchPhase::WaitingForCurrent => {
                if self.promote_generation.is_none() {
                    self.arm_promote(fx);
                }
            }
            DispatchPhase::Idle | DispatchPhase::Empty => {}
        }
    }

    fn call(&mut self, id: TicketCode, trigger: CallTrigger, fx: &mut Effects) {
        let previous = self.store.current().map(|e| e.id());
        let first_call = self
            .store
            .get(&id)
            .filter(|e| e.called_at.is_none())
            .map(|e| (e.enrolled_at, e.ticket.priority_class));

        if !self.store.select_current(&id) {
            return;
        }

        if let Some(previous) = previous.filter(|p| *p != id) {
            fx.events.push(QueueEvent::Returned {
                ticket_id: previous,
            });
        }

        if let Some((enrolled_at, class)) = first_call {
            let waited = (Utc::now() - enrolled_at).num_milliseconds().max(0) as f64 / 1000.0;
            WAIT_TIME.with_label_values(&[class.as_str()]).observe(waited);
        }
        TICKETS_CALLED.with_label_values(&[trigger.as_str()]).inc();

        let counter_label = self
            .store
            .current()
            .and_then(|e| e.ticket.counter_label.clone());
        fx.events.push(QueueEvent::Called {
            ticket_id: id,
            counter_label,
            trigger,
        });
        debug!(ticket_id = %id, trigger = trigger.as_str(), "Ticket called");
    }

    fn archive_current(&mut self, fx: &mut Effects) {
        if let Some(entry) = self.store.archive_current() {
            TICKETS_ARCHIVED.inc();
            fx.events.push(QueueEvent::Archived {
                ticket_id: entry.id(),
            });
            debug!(ticket_id = %entry.id(), "Ticket archived");
        }
    }

    fn arm_promote(&mut self, fx: &mut Effects) {
        let Some(class) = self.store.head().map(|e| e.ticket.priority_class) else {
            return;
        };
        let delay = self.config.promote_delay(class);
        self.arm(TimerKind::Promote, delay, fx);
    }

    fn arm_archive(&mut self, fx: &mut Effects) {
        let delay = self.config.current_delay();
        self.arm(TimerKind::Archive, delay, fx);
    }

    fn arm(&mut self, kind: TimerKind, delay: std::time::Duration, fx: &mut Effects) {
        let generation = self.next_generation;
        self.next_generation += 1;

        match kind {
            TimerKind::Promote => self.promote_generation = Some(generation),
            TimerKind::Archive => self.archive_generation = Some(generation),
        }
        fx.timers.push(TimerCommand::Arm {
            kind,
            generation,
            delay,
        });
    }

    fn cancel(&mut self, kind: TimerKind, fx: &mut Effects) {
        let slot = match kind {
            TimerKind::Promote => &mut self.promote_generation,
            TimerKind::Archive => &mut self.archive_generation,
        };
        if slot.take().is_some() {
            fx.timers.push(TimerCommand::Cancel { kind });
        }
    }
}
