//! Dispatch timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ticket::PriorityClass;

/// Delays used by the dispatcher. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Wait before calling a priority ticket at the head of the queue (milliseconds).
    #[serde(default = "default_priority_delay")]
    pub priority_delay_ms: u64,

    /// Wait before calling a normal ticket at the head of the queue (milliseconds).
    #[serde(default = "default_normal_delay")]
    pub normal_delay_ms: u64,

    /// How long a called ticket stays current before it is archived (milliseconds).
    #[serde(default = "default_current_delay")]
    pub current_delay_ms: u64,

    /// Start dispatching as soon as the server is up.
    /// When disabled, dispatching starts via the API.
    #[serde(default)]
    pub autostart: bool,
}

fn default_priority_delay() -> u64 {
    5000 // 5 seconds
}

fn default_normal_delay() -> u64 {
    10_000 // 10 seconds
}

fn default_current_delay() -> u64 {
    10_000 // 10 seconds
}

impl DispatchConfig {
    pub fn priority_delay(&self) -> Duration {
        Duration::from_millis(self.priority_delay_ms)
    }

    pub fn normal_delay(&self) -> Duration {
        Duration::from_millis(self.normal_delay_ms)
    }

    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.current_delay_ms)
    }

    /// Promote delay for a queue head of the given class.
    pub fn promote_delay(&self, class: PriorityClass) -> Duration {
        match class {
            PriorityClass::Priority => self.priority_delay(),
            PriorityClass::Normal => self.normal_delay(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            priority_delay_ms: default_priority_delay(),
            normal_delay_ms: default_normal_delay(),
            current_delay_ms: default_current_delay(),
            autostart: false,
        }
    }
}
