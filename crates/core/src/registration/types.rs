//! Registration form, patient summary and errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::{PriorityClass, Ticket, TicketCodeError};

/// Errors from validating a patient form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("name must have at least {min} letters, got {actual}")]
    NameTooShort { min: usize, actual: usize },

    #[error("age must be between 1 and {max}, got {age}")]
    AgeOutOfRange { age: u32, max: u32 },

    #[error("gender must be one of M, F or O, got {0:?}")]
    InvalidGender(String),

    #[error(transparent)]
    Code(#[from] TicketCodeError),
}

/// Raw patient form as submitted by the front desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientForm {
    pub name: String,
    pub age: u32,
    /// Single letter: `M`, `F` or `O`.
    pub gender: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            "O" => Ok(Gender::Other),
            _ => Err(RegistrationError::InvalidGender(s.to_string())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Suggested specialty, by age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    /// Up to 12.
    Pediatrics,
    /// 13 to 18.
    Adolescent,
    /// 19 to 40.
    YoungAdult,
    /// 41 to 60.
    Adult,
    /// Over 60.
    Senior,
}

impl Specialty {
    pub fn for_age(age: u32) -> Self {
        match age {
            0..=12 => Specialty::Pediatrics,
            13..=18 => Specialty::Adolescent,
            19..=40 => Specialty::YoungAdult,
            41..=60 => Specialty::Adult,
            _ => Specialty::Senior,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Specialty::Pediatrics => "Pediatrics or Neuropediatrics",
            Specialty::Adolescent => {
                "Pediatric Endocrinology or Child and Adolescent Psychiatry"
            }
            Specialty::YoungAdult => "Dermatology or Gynecology/Urology",
            Specialty::Adult => "Cardiology or Orthopedics",
            Specialty::Senior => "Geriatrics or Ophthalmology",
        }
    }
}

/// Cleaned-up patient details shown on the registration receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub specialty: Specialty,
    pub priority_class: PriorityClass,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub ticket: Ticket,
    pub patient: PatientSummary,
}

/// Clean a typed name: drop anything that is not a letter or whitespace and
/// capitalize each word.
pub fn format_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();

    cleaned
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
