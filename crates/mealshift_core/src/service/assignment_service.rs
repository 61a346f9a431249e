//! Claim and release of shifts and of the chef role.
//!
//! # Responsibility
//! - Toggle a worker on one shift, keeping one claim per (meal, worker).
//! - Toggle the single chef binding of a meal.
//!
//! # Invariants
//! - A shift held by another identity is never overwritten.
//! - Claiming a shift releases the identity's other shift on the same meal
//!   in the same transaction.
//! - Identity comparison is `PersonId` equality only.

use crate::config::EngineConfig;
use crate::db::tx::run_immediate;
use crate::model::event::MealId;
use crate::model::person::PersonId;
use crate::model::shift::ShiftId;
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::repo::shift_repo::{ShiftRepository, SqliteShiftRepository};
use crate::service::error::{ForbiddenReason, StaffingError};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

/// Shift state after a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftClaim {
    pub shift_id: ShiftId,
    pub meal_id: MealId,
    /// `None` when the toggle released the shift.
    pub worker: Option<PersonId>,
    /// Other shifts on the same meal released by this claim.
    pub released: Vec<ShiftId>,
}

/// Chef binding after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChefState {
    pub meal_id: MealId,
    pub chef: Option<PersonId>,
}

/// Assignment facade over one connection.
pub struct AssignmentService<'conn> {
    conn: &'conn Connection,
    config: EngineConfig,
}

impl<'conn> AssignmentService<'conn> {
    pub fn new(conn: &'conn Connection, config: EngineConfig) -> Self {
        Self { conn, config }
    }

    /// Claims an open shift for `identity`, or releases it if they hold it.
    ///
    /// # Errors
    /// - `AlreadyClaimed` when another identity holds the shift.
    /// - `ShiftNotFound` / `PersonNotFound` for unknown ids.
    pub fn toggle_shift(
        &self,
        shift_id: ShiftId,
        identity: PersonId,
    ) -> Result<ShiftClaim, StaffingError> {
        let result = run_immediate(
            self.conn,
            self.config.max_tx_attempts,
            "toggle_shift",
            |tx| -> Result<ShiftClaim, StaffingError> {
                let people = SqlitePersonRepository::try_new(tx)?;
                let shifts = SqliteShiftRepository::try_new(tx)?;

                if people.get_person(identity)?.is_none() {
                    return Err(StaffingError::PersonNotFound(identity));
                }
                let shift = shifts
                    .get_shift(shift_id)?
                    .ok_or(StaffingError::ShiftNotFound(shift_id))?;

                match shift.worker {
                    Some(holder) if holder != identity => {
                        Err(StaffingError::AlreadyClaimed { shift_id, holder })
                    }
                    Some(_) => {
                        shifts.set_worker(shift_id, None)?;
                        Ok(ShiftClaim {
                            shift_id,
                            meal_id: shift.meal_id,
                            worker: None,
                            released: Vec::new(),
                        })
                    }
                    None => {
                        let released = shifts.release_worker_on_meal(shift.meal_id, identity)?;
                        shifts.set_worker(shift_id, Some(identity))?;
                        Ok(ShiftClaim {
                            shift_id,
                            meal_id: shift.meal_id,
                            worker: Some(identity),
                            released,
                        })
                    }
                }
            },
        )
        .map_err(|err| StaffingError::from_tx("toggle_shift", err));

        match &result {
            Ok(claim) => info!(
                "event=shift_toggle module=assignment status=ok shift_id={} claimed={} released={}",
                shift_id,
                claim.worker.is_some(),
                claim.released.len()
            ),
            Err(err) => warn!(
                "event=shift_toggle module=assignment status=error shift_id={} error={}",
                shift_id, err
            ),
        }
        result
    }

    /// Steps `identity` up as chef of a meal, or down if they already are.
    ///
    /// # Errors
    /// - `Forbidden(ChefTaken)` when another identity is chef.
    /// - `MealNotFound` / `PersonNotFound` for unknown ids.
    pub fn toggle_chef(
        &self,
        meal_id: MealId,
        identity: PersonId,
    ) -> Result<ChefState, StaffingError> {
        let result = run_immediate(
            self.conn,
            self.config.max_tx_attempts,
            "toggle_chef",
            |tx| -> Result<ChefState, StaffingError> {
                let people = SqlitePersonRepository::try_new(tx)?;
                let events = SqliteEventRepository::try_new(tx)?;

                if people.get_person(identity)?.is_none() {
                    return Err(StaffingError::PersonNotFound(identity));
                }
                let meal = events
                    .get_meal(meal_id)?
                    .ok_or(StaffingError::MealNotFound(meal_id))?;

                let chef = match meal.chef {
                    Some(chef) if chef != identity => {
                        return Err(StaffingError::Forbidden {
                            meal_id,
                            reason: ForbiddenReason::ChefTaken { chef },
                        });
                    }
                    Some(_) => None,
                    None => Some(identity),
                };
                events.set_chef(meal_id, chef)?;
                Ok(ChefState { meal_id, chef })
            },
        )
        .map_err(|err| StaffingError::from_tx("toggle_chef", err));

        match &result {
            Ok(state) => info!(
                "event=chef_toggle module=assignment status=ok meal_id={} assigned={}",
                meal_id,
                state.chef.is_some()
            ),
            Err(err) => warn!(
                "event=chef_toggle module=assignment status=error meal_id={} error={}",
                meal_id, err
            ),
        }
        result
    }
}
