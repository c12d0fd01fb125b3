//! Registration rules configuration.

use serde::{Deserialize, Serialize};

use crate::ticket::PriorityClass;

/// Validation limits, priority thresholds and available counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Minimum length of the cleaned patient name.
    #[serde(default = "default_min_name_len")]
    pub min_name_len: usize,

    /// Oldest accepted age. The youngest is always 1.
    #[serde(default = "default_max_age")]
    pub max_age: u32,

    /// Patients this age or younger are priority.
    #[serde(default = "default_infant_age")]
    pub infant_age: u32,

    /// Patients this age or older are priority.
    #[serde(default = "default_elderly_age")]
    pub elderly_age: u32,

    /// Counter labels handed out round-robin.
    #[serde(default = "default_counters")]
    pub counters: Vec<String>,
}

fn default_min_name_len() -> usize {
    3
}

fn default_max_age() -> u32 {
    120
}

fn default_infant_age() -> u32 {
    2
}

fn default_elderly_age() -> u32 {
    60
}

fn default_counters() -> Vec<String> {
    vec!["1".to_string(), "2".to_string(), "3".to_string()]
}

impl RegistrationConfig {
    /// Queue class for a patient of `age`.
    pub fn classify(&self, age: u32) -> PriorityClass {
        if age >= self.elderly_age || age <= self.infant_age {
            PriorityClass::Priority
        } else {
            PriorityClass::Normal
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            min_name_len: default_min_name_len(),
            max_age: default_max_age(),
            infant_age: default_infant_age(),
            elderly_age: default_elderly_age(),
            counters: default_counters(),
        }
    }
}
