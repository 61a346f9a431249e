//! Roles and shift (slot) records.
//!
//! # Responsibility
//! - Enumerate the fixed labor roles of a meal.
//! - Model one claimable slot and its claim state.
//!
//! # Invariants
//! - Shift rows only exist for slot roles (`Role::is_slot_role`).
//! - `worker` is mutated only by the assignment service.
//! - `created_at` is the recency key for surplus deletion; ids are not.

use crate::model::event::MealId;
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable shift identifier.
pub type ShiftId = Uuid;

/// Labor category of a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Singular per meal, held through `Meal::chef`.
    Chef,
    SousChef,
    /// Kitchen patrol (dishes and cleanup).
    Kp,
    Courier,
}

impl Role {
    /// Roles backed by shift records, in display order.
    pub const SLOT_ROLES: [Role; 3] = [Role::SousChef, Role::Kp, Role::Courier];

    /// Whether this role is represented by shift records.
    pub fn is_slot_role(self) -> bool {
        !matches!(self, Self::Chef)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chef => "chef",
            Self::SousChef => "sous_chef",
            Self::Kp => "kp",
            Self::Courier => "courier",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "chef" => Some(Self::Chef),
            "sous_chef" => Some(Self::SousChef),
            "kp" => Some(Self::Kp),
            "courier" => Some(Self::Courier),
            _ => None,
        }
    }

    /// Human-facing label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Chef => "Chef",
            Self::SousChef => "Sous-Chef",
            Self::Kp => "KP",
            Self::Courier => "Courier",
        }
    }
}

/// Claim state of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "worker", rename_all = "snake_case")]
pub enum ShiftState {
    Unclaimed,
    Claimed(PersonId),
}

/// One schedulable unit of labor for a meal and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub meal_id: MealId,
    pub role: Role,
    /// `None` means the slot is open.
    pub worker: Option<PersonId>,
    /// Unix epoch milliseconds at creation.
    pub created_at: i64,
}

impl Shift {
    /// Creates an unclaimed shift with a generated stable ID.
    pub fn new(meal_id: MealId, role: Role, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            meal_id,
            role,
            worker: None,
            created_at,
        }
    }

    pub fn state(&self) -> ShiftState {
        match self.worker {
            Some(worker) => ShiftState::Claimed(worker),
            None => ShiftState::Unclaimed,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.worker.is_some()
    }
}
