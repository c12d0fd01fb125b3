//! Timed dispatch of the waiting queue.
//!
//! [`DispatchMachine`] is the synchronous state machine: every operation
//! mutates the queue and returns the timer commands and events it implies.
//! [`Dispatcher`] drives it on tokio, owning the promote and archive timers:
//! - **Promote**: calls the head of the queue after the class-specific delay
//! - **Archive**: moves the current ticket to history after the serving delay

mod config;
mod machine;
mod runner;
mod types;

pub use config::DispatchConfig;
pub use machine::DispatchMachine;
pub use runner::Dispatcher;
pub use types::{
    CallTrigger, DispatchPhase, DispatchStatus, Effects, QueueEvent, TimerCommand, TimerKind,
};
