//! Error taxonomy for staffing use-cases.
//!
//! # Invariants
//! - `Forbidden` and `AlreadyClaimed` are caller-facing and never retried.
//! - `TransientConflict` is only produced after the retry budget is spent.
//! - No variant is fatal to the process; each is scoped to one request.

use crate::db::tx::{BusyAware, TxError};
use crate::model::event::{EventId, MealId};
use crate::model::person::PersonId;
use crate::model::requirements::RequirementsValidationError;
use crate::model::shift::{Role, ShiftId};
use crate::repo::RepoError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a caller lacks authority over a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Requirements can only be edited by the meal's current chef.
    NotChef,
    /// Another identity already holds the chef role.
    ChefTaken { chef: PersonId },
}

/// Service error for staffing use-cases.
#[derive(Debug)]
pub enum StaffingError {
    /// Caller lacks authority for the action.
    Forbidden {
        meal_id: MealId,
        reason: ForbiddenReason,
    },
    /// The shift is held by another identity.
    AlreadyClaimed { shift_id: ShiftId, holder: PersonId },
    /// Requirement input rejected before any mutation.
    Validation(RequirementsValidationError),
    /// Lock contention persisted through every retry.
    TransientConflict { op: &'static str, attempts: u32 },
    /// Role is not backed by shift records.
    NotSlotRole(Role),
    MealNotFound(MealId),
    ShiftNotFound(ShiftId),
    PersonNotFound(PersonId),
    EventNotFound(EventId),
    /// An event with this name already exists and overwrite was not requested.
    EventExists(String),
    /// Event day range is empty or overflows the calendar.
    InvalidEventRange { start_date: NaiveDate, num_days: u32 },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl StaffingError {
    /// Unwraps a transaction runner failure into a service error.
    pub(crate) fn from_tx(op: &'static str, err: TxError<StaffingError>) -> Self {
        match err {
            TxError::Failed(err) => err,
            TxError::Exhausted { attempts, .. } => Self::TransientConflict { op, attempts },
        }
    }

    /// Whether the caller may simply re-render current state and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AlreadyClaimed { .. } | Self::TransientConflict { .. }
        )
    }
}

impl Display for StaffingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden {
                meal_id,
                reason: ForbiddenReason::NotChef,
            } => write!(f, "only the chef can edit requirements of meal {meal_id}"),
            Self::Forbidden {
                meal_id,
                reason: ForbiddenReason::ChefTaken { .. },
            } => write!(f, "a chef is already assigned to meal {meal_id}"),
            Self::AlreadyClaimed { shift_id, .. } => {
                write!(f, "shift {shift_id} is already claimed by another worker")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::TransientConflict { op, attempts } => {
                write!(f, "`{op}` could not acquire the store after {attempts} attempts")
            }
            Self::NotSlotRole(role) => {
                write!(f, "role `{}` is not backed by shift records", role.as_str())
            }
            Self::MealNotFound(id) => write!(f, "meal not found: {id}"),
            Self::ShiftNotFound(id) => write!(f, "shift not found: {id}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::EventExists(name) => write!(f, "event `{name}` already exists"),
            Self::InvalidEventRange {
                start_date,
                num_days,
            } => write!(f, "invalid event range: {num_days} days from {start_date}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StaffingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StaffingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "meal",
                id,
            } => Self::MealNotFound(id),
            RepoError::NotFound {
                entity: "shift",
                id,
            } => Self::ShiftNotFound(id),
            RepoError::NotFound {
                entity: "event",
                id,
            } => Self::EventNotFound(id),
            RepoError::NotFound {
                entity: "person",
                id,
            } => Self::PersonNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for StaffingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<RequirementsValidationError> for StaffingError {
    fn from(value: RequirementsValidationError) -> Self {
        Self::Validation(value)
    }
}

impl BusyAware for StaffingError {
    fn is_busy(&self) -> bool {
        match self {
            Self::Repo(err) => err.is_busy(),
            _ => false,
        }
    }
}
