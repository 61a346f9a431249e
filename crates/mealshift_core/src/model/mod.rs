//! Domain model for meal staffing.
//!
//! # Responsibility
//! - Define canonical records for events, meals, shifts and people.
//! - Keep the chef/slot asymmetry explicit at the type level.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - A meal's chef is a dedicated field; `Role::Chef` never backs a shift row.
//! - Per meal, claimed shifts carry pairwise distinct workers.

pub mod event;
pub mod person;
pub mod requirements;
pub mod shift;
