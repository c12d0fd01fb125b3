//! Dispatcher implementation.
//!
//! Drives a [`DispatchMachine`] on tokio. Every operation takes the same lock,
//! including timer fires, so the machine never runs concurrently with itself:
//! - Arm: abort the pending task of that kind, spawn a sleeping task
//! - Cancel: abort the pending task of that kind
//! - Fire: the task locks the machine and hands it the generation it was armed with

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::queue::{QueueError, QueueSnapshot};
use crate::ticket::{Ticket, TicketCode};

use super::config::DispatchConfig;
use super::machine::DispatchMachine;
use super::types::{DispatchStatus, Effects, QueueEvent, TimerCommand, TimerKind};

/// Capacity of the queue event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Machine plus the tasks backing its pending timers.
struct DispatchShared {
    machine: DispatchMachine,
    promote_task: Option<JoinHandle<()>>,
    archive_task: Option<JoinHandle<()>>,
}

impl DispatchShared {
    fn task_mut(&mut self, kind: TimerKind) -> &mut Option<JoinHandle<()>> {
        match kind {
            TimerKind::Promote => &mut self.promote_task,
            TimerKind::Archive => &mut self.archive_task,
        }
    }
}

impl Drop for DispatchShared {
    fn drop(&mut self) {
        for task in [self.promote_task.take(), self.archive_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

struct DispatchInner {
    state: Mutex<DispatchShared>,
    events: broadcast::Sender<QueueEvent>,
}

impl DispatchInner {
    /// Execute timer commands and publish events produced by one machine step.
    fn apply(self: &Arc<Self>, shared: &mut DispatchShared, effects: Effects) {
        for command in effects.timers {
            match command {
                TimerCommand::Cancel { kind } => {
                    if let Some(task) = shared.task_mut(kind).take() {
                        task.abort();
                    }
                }
                TimerCommand::Arm {
                    kind,
                    generation,
                    delay,
                } => {
                    if let Some(task) = shared.task_mut(kind).take() {
                        task.abort();
                    }
                    debug!(
                        timer = kind.as_str(),
                        generation,
                        delay_ms = delay.as_millis() as u64,
                        "Arming timer"
                    );
                    *shared.task_mut(kind) =
                        Some(spawn_timer(Arc::downgrade(self), kind, generation, delay));
                }
            }
        }

        for event in effects.events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

/// Spawn the task backing one armed timer.
///
/// The deadline is fixed here, at the arm point. The task only holds a weak
/// reference so dropping the last [`Dispatcher`] aborts pending timers.
fn spawn_timer(
    inner: Weak<DispatchInner>,
    kind: TimerKind,
    generation: u64,
    delay: Duration,
) -> JoinHandle<()> {
    let deadline = Instant::now() + delay;
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;

        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut shared = inner.state.lock().await;
        if shared.machine.pending(kind) == Some(generation) {
            // This task is the one in the slot; release it without aborting itself.
            shared.task_mut(kind).take();
        }
        let effects = shared.machine.timer_fired(kind, generation);
        inner.apply(&mut shared, effects);
    })
}

/// The queue control surface.
///
/// Owns the queue and both timers. Cloning is cheap and every clone drives
/// the same queue.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatchInner>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a stopped dispatcher with an empty queue.
    pub fn new(config: DispatchConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(DispatchInner {
                state: Mutex::new(DispatchShared {
                    machine: DispatchMachine::new(config.clone()),
                    promote_task: None,
                    archive_task: None,
                }),
                events,
            }),
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Receive a [`QueueEvent`] for every change to the queue or scheduler.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// Start automatic dispatching.
    pub async fn start(&self) {
        let mut shared = self.inner.state.lock().await;
        if shared.machine.is_active() {
            warn!("Dispatcher already running");
            return;
        }

        let effects = shared.machine.start();
        self.inner.apply(&mut shared, effects);
        info!(phase = %shared.machine.phase(), "Dispatcher started");
    }

    /// Stop automatic dispatching. The queue is left as it is.
    pub async fn stop(&self) {
        let mut shared = self.inner.state.lock().await;
        if !shared.machine.is_active() {
            warn!("Dispatcher not running");
            return;
        }

        let effects = shared.machine.stop();
        self.inner.apply(&mut shared, effects);
        info!("Dispatcher stopped");
    }

    /// Add a ticket to the queue.
    pub async fn enroll(&self, ticket: Ticket) -> Result<(), QueueError> {
        let mut shared = self.inner.state.lock().await;
        let effects = shared.machine.enroll(ticket)?;
        self.inner.apply(&mut shared, effects);
        Ok(())
    }

    /// Make `id` current. Returns `false` when `id` is not waiting.
    pub async fn select_current(&self, id: &TicketCode) -> bool {
        let mut shared = self.inner.state.lock().await;
        match shared.machine.select_current(id) {
            Some(effects) => {
                self.inner.apply(&mut shared, effects);
                true
            }
            None => false,
        }
    }

    /// Archive the current ticket and call the next one immediately.
    pub async fn call_next(&self) {
        let mut shared = self.inner.state.lock().await;
        let effects = shared.machine.call_next();
        self.inner.apply(&mut shared, effects);
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        self.inner.state.lock().await.machine.snapshot()
    }

    pub async fn status(&self) -> DispatchStatus {
        self.inner.state.lock().await.machine.status()
    }

    /// Status and snapshot taken under one lock, so they always agree.
    pub async fn view(&self) -> (DispatchStatus, QueueSnapshot) {
        let shared = self.inner.state.lock().await;
        (shared.machine.status(), shared.machine.snapshot())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
