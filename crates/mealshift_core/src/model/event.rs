//! Event and meal domain model.
//!
//! # Responsibility
//! - Describe the event day range and the meals it owns.
//! - Carry the meal chef as a single optional identity reference.
//!
//! # Invariants
//! - `end_date` is exclusive and strictly after `start_date`.
//! - A meal belongs to exactly one event and falls inside its day range.

use crate::model::person::PersonId;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable event identifier.
pub type EventId = Uuid;

/// Stable meal identifier.
pub type MealId = Uuid;

/// One staffed event spanning a contiguous range of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start_date: NaiveDate,
    /// Exclusive upper bound.
    pub end_date: NaiveDate,
}

impl Event {
    /// Returns every day of the event in ascending order.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|day| *day < self.end_date)
            .collect()
    }

    /// Number of days covered by the event.
    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Whether `day` falls inside `[start_date, end_date)`.
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start_date && day < self.end_date
    }

    /// Computes the exclusive end date for `num_days` days from `start_date`.
    ///
    /// Returns `None` when the range is empty or overflows the calendar.
    pub fn end_for(start_date: NaiveDate, num_days: u32) -> Option<NaiveDate> {
        if num_days == 0 {
            return None;
        }
        start_date.checked_add_days(Days::new(u64::from(num_days)))
    }
}

/// Meal sitting within a day.
///
/// Ordering follows the order meals are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealKind {
    Breakfast,
    Dinner,
}

impl MealKind {
    /// Every kind served per event day, in serving order.
    pub const ALL: [MealKind; 2] = [MealKind::Breakfast, MealKind::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Dinner => "dinner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "breakfast" => Some(Self::Breakfast),
            "dinner" => Some(Self::Dinner),
            _ => None,
        }
    }
}

/// One meal of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    pub event_id: EventId,
    pub day: NaiveDate,
    pub kind: MealKind,
    /// The chef owning this meal, if anyone stepped up.
    pub chef: Option<PersonId>,
    /// Menu description shown to everyone.
    pub public_notes: String,
    /// Chef-only notes.
    pub private_notes: String,
}

impl Meal {
    /// Creates an unstaffed meal with a generated stable ID.
    pub fn new(event_id: EventId, day: NaiveDate, kind: MealKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            day,
            kind,
            chef: None,
            public_notes: String::new(),
            private_notes: String::new(),
        }
    }

    /// Whether `person` is the chef of this meal.
    pub fn is_chef(&self, person: PersonId) -> bool {
        self.chef == Some(person)
    }
}
