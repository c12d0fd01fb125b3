//! Patient registration.
//!
//! Turns a raw patient form into a [`Ticket`](crate::ticket::Ticket): the
//! form is cleaned and validated, the priority class is derived from the
//! age, and a [`Registrar`] issues the ticket code and counter.

mod config;
mod registrar;
mod types;

pub use config::RegistrationConfig;
pub use registrar::Registrar;
pub use types::{
    format_name, Gender, PatientForm, PatientSummary, Registration, RegistrationError, Specialty,
};
