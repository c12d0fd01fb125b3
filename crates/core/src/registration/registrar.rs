//! Ticket issuing.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use tracing::debug;

use crate::ticket::{PriorityClass, Ticket, TicketCode, MAX_SEQUENCE};

use super::config::RegistrationConfig;
use super::types::{
    format_name, Gender, PatientForm, PatientSummary, Registration, RegistrationError, Specialty,
};

/// Validates patient forms and issues tickets.
///
/// Each class has its own sequence running from 1 to 999 and wrapping back
/// to 1. Counters are assigned round-robin.
#[derive(Debug)]
pub struct Registrar {
    config: RegistrationConfig,
    priority_seq: AtomicU32,
    normal_seq: AtomicU32,
    next_counter: AtomicUsize,
}

impl Registrar {
    pub fn new(config: RegistrationConfig) -> Self {
        Self {
            config,
            priority_seq: AtomicU32::new(0),
            normal_seq: AtomicU32::new(0),
            next_counter: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Validate `form` and issue a ticket for it.
    pub fn register(&self, form: &PatientForm) -> Result<Registration, RegistrationError> {
        let patient = self.validate(form)?;

        let code = self.next_code(patient.priority_class)?;
        let mut ticket = Ticket::new(code, patient.name.clone());
        if let Some(counter) = self.next_counter() {
            ticket = ticket.with_counter_label(counter);
        }

        debug!(
            ticket_id = %ticket.id,
            class = patient.priority_class.as_str(),
            counter = ?ticket.counter_label,
            "Issued ticket"
        );

        Ok(Registration { ticket, patient })
    }

    /// Check a form without issuing anything.
    pub fn validate(&self, form: &PatientForm) -> Result<PatientSummary, RegistrationError> {
        let name = format_name(&form.name).trim().to_string();
        let len = name.chars().count();
        if len < self.config.min_name_len {
            return Err(RegistrationError::NameTooShort {
                min: self.config.min_name_len,
                actual: len,
            });
        }

        if form.age == 0 || form.age > self.config.max_age {
            return Err(RegistrationError::AgeOutOfRange {
                age: form.age,
                max: self.config.max_age,
            });
        }

        let gender: Gender = form.gender.parse()?;

        Ok(PatientSummary {
            name,
            age: form.age,
            gender,
            specialty: Specialty::for_age(form.age),
            priority_class: self.config.classify(form.age),
        })
    }

    fn next_code(&self, class: PriorityClass) -> Result<TicketCode, RegistrationError> {
        let seq = match class {
            PriorityClass::Priority => &self.priority_seq,
            PriorityClass::Normal => &self.normal_seq,
        };

        let n = seq.fetch_add(1, Ordering::Relaxed) % u32::from(MAX_SEQUENCE);
        let sequence = u16::try_from(n + 1).unwrap_or(MAX_SEQUENCE);
        Ok(TicketCode::new(class, sequence)?)
    }

    fn next_counter(&self) -> Option<String> {
        if self.config.counters.is_empty() {
            return None;
        }
        let index =
            self.next_counter.fetch_add(1, Ordering::Relaxed) % self.config.counters.len();
        self.config.counters.get(index).cloned()
    }
}
