//! Chef-submitted staffing requirements for one meal.
//!
//! # Responsibility
//! - Validate raw requirement input before any mutation happens.
//! - Map the requirement form onto per-role target counts.
//!
//! # Invariants
//! - Counts are within `0..=max_slots_per_role`.
//! - The courier target is derived from a flag and is always 0 or 1.

use crate::model::shift::Role;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for requirement input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementsValidationError {
    /// Count field is not an integer.
    NotAnInteger { field: &'static str, value: String },
    /// Count field is negative.
    Negative { field: &'static str, value: i64 },
    /// Count field exceeds the per-role maximum.
    TooMany {
        field: &'static str,
        value: i64,
        max: u32,
    },
    /// Boolean field is not a recognized flag value.
    InvalidFlag { field: &'static str, value: String },
    /// Notes field exceeds the configured length.
    NotesTooLong { field: &'static str, max_chars: usize },
}

impl Display for RequirementsValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnInteger { field, value } => {
                write!(f, "`{field}` must be an integer, got `{value}`")
            }
            Self::Negative { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
            Self::TooMany { field, value, max } => {
                write!(f, "`{field}` must be at most {max}, got {value}")
            }
            Self::InvalidFlag { field, value } => {
                write!(f, "`{field}` must be a boolean flag, got `{value}`")
            }
            Self::NotesTooLong { field, max_chars } => {
                write!(f, "`{field}` must be at most {max_chars} characters")
            }
        }
    }
}

impl Error for RequirementsValidationError {}

/// Validated requirement set for one meal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleRequirements {
    pub need_courier: bool,
    pub number_of_sous: u32,
    pub number_of_kp: u32,
    pub public_notes: String,
    pub private_notes: String,
}

impl RoleRequirements {
    /// Builds requirements from typed counts, rejecting out-of-range values.
    pub fn new(
        need_courier: bool,
        number_of_sous: i64,
        number_of_kp: i64,
        max_slots_per_role: u32,
    ) -> Result<Self, RequirementsValidationError> {
        Ok(Self {
            need_courier,
            number_of_sous: check_count("number_of_sous", number_of_sous, max_slots_per_role)?,
            number_of_kp: check_count("number_of_kp", number_of_kp, max_slots_per_role)?,
            public_notes: String::new(),
            private_notes: String::new(),
        })
    }

    /// Builds requirements from raw form fields.
    ///
    /// `need_courier` follows HTML checkbox semantics: absent means `false`.
    pub fn from_form(
        need_courier: Option<&str>,
        number_of_sous: &str,
        number_of_kp: &str,
        max_slots_per_role: u32,
    ) -> Result<Self, RequirementsValidationError> {
        let need_courier = match need_courier.map(|value| value.trim().to_ascii_lowercase()) {
            None => false,
            Some(value) => match value.as_str() {
                "" | "false" | "off" | "0" => false,
                "true" | "on" | "1" => true,
                _ => {
                    return Err(RequirementsValidationError::InvalidFlag {
                        field: "need_courier",
                        value,
                    })
                }
            },
        };

        Self::new(
            need_courier,
            parse_count("number_of_sous", number_of_sous)?,
            parse_count("number_of_kp", number_of_kp)?,
            max_slots_per_role,
        )
    }

    /// Attaches meal notes to the requirement set.
    pub fn with_notes(
        mut self,
        public_notes: impl Into<String>,
        private_notes: impl Into<String>,
    ) -> Self {
        self.public_notes = public_notes.into();
        self.private_notes = private_notes.into();
        self
    }

    /// Re-checks an already built value against engine limits.
    pub fn validate(
        &self,
        max_slots_per_role: u32,
        max_notes_chars: usize,
    ) -> Result<(), RequirementsValidationError> {
        check_count(
            "number_of_sous",
            i64::from(self.number_of_sous),
            max_slots_per_role,
        )?;
        check_count(
            "number_of_kp",
            i64::from(self.number_of_kp),
            max_slots_per_role,
        )?;
        check_notes("public_notes", &self.public_notes, max_notes_chars)?;
        check_notes("private_notes", &self.private_notes, max_notes_chars)?;
        Ok(())
    }

    /// Checks a direct target count for one slot role against form limits.
    ///
    /// Courier is a flag on the form, so its target is at most 1.
    pub fn check_target(
        role: Role,
        desired: u32,
        max_slots_per_role: u32,
    ) -> Result<(), RequirementsValidationError> {
        let (field, max) = match role {
            Role::SousChef => ("number_of_sous", max_slots_per_role),
            Role::Kp => ("number_of_kp", max_slots_per_role),
            Role::Courier => ("need_courier", 1),
            Role::Chef => return Ok(()),
        };
        check_count(field, i64::from(desired), max).map(|_| ())
    }

    /// Target shift count for one slot role. `Role::Chef` has no slot target.
    pub fn target_for(&self, role: Role) -> Option<u32> {
        match role {
            Role::Chef => None,
            Role::SousChef => Some(self.number_of_sous),
            Role::Kp => Some(self.number_of_kp),
            Role::Courier => Some(u32::from(self.need_courier)),
        }
    }
}

fn parse_count(field: &'static str, raw: &str) -> Result<i64, RequirementsValidationError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| RequirementsValidationError::NotAnInteger {
            field,
            value: trimmed.to_string(),
        })
}

fn check_count(field: &'static str, value: i64, max: u32) -> Result<u32, RequirementsValidationError> {
    if value < 0 {
        return Err(RequirementsValidationError::Negative { field, value });
    }
    if value > i64::from(max) {
        return Err(RequirementsValidationError::TooMany { field, value, max });
    }
    // Bounded by `max` above.
    Ok(value as u32)
}

fn check_notes(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), RequirementsValidationError> {
    if value.chars().count() > max_chars {
        return Err(RequirementsValidationError::NotesTooLong { field, max_chars });
    }
    Ok(())
}
