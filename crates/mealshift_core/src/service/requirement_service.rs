//! Role requirement use-case service.
//!
//! # Responsibility
//! - Accept chef-submitted requirements and reconcile every slot role.
//! - Expose the requirement store reads (shift sets, form initial values).
//!
//! # Invariants
//! - Input is validated before a transaction is opened.
//! - Only the meal's current chef may submit requirements.
//! - Requirement bookkeeping, reconciliation of all slot roles and the notes
//!   update commit together or not at all.

use crate::config::EngineConfig;
use crate::db::tx::run_immediate;
use crate::model::event::MealId;
use crate::model::person::PersonId;
use crate::model::requirements::RoleRequirements;
use crate::model::shift::{Role, Shift};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::shift_repo::{ShiftRepository, SqliteShiftRepository};
use crate::service::error::{ForbiddenReason, StaffingError};
use crate::service::reconciler::{reconcile_role, ReconcileOutcome};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

/// Result of one accepted requirements submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementsUpdate {
    pub meal_id: MealId,
    /// One entry per slot role, in `Role::SLOT_ROLES` order.
    pub roles: Vec<ReconcileOutcome>,
}

impl RequirementsUpdate {
    pub fn changed(&self) -> bool {
        self.roles.iter().any(ReconcileOutcome::changed)
    }
}

/// Requirement store and reconciliation facade over one connection.
pub struct RequirementService<'conn> {
    conn: &'conn Connection,
    config: EngineConfig,
}

impl<'conn> RequirementService<'conn> {
    pub fn new(conn: &'conn Connection, config: EngineConfig) -> Self {
        Self { conn, config }
    }

    /// Replaces the requirements of a meal on behalf of its chef.
    ///
    /// # Errors
    /// - `Validation` when counts or notes are out of range (nothing written).
    /// - `Forbidden(NotChef)` when `requested_by` is not the meal's chef.
    /// - `MealNotFound` when the meal does not exist.
    /// - `TransientConflict` when the store stayed locked through every retry.
    pub fn set_role_requirements(
        &self,
        meal_id: MealId,
        requested_by: PersonId,
        requirements: &RoleRequirements,
    ) -> Result<RequirementsUpdate, StaffingError> {
        requirements.validate(self.config.max_slots_per_role, self.config.max_notes_chars)?;

        let result = run_immediate(
            self.conn,
            self.config.max_tx_attempts,
            "set_role_requirements",
            |tx| -> Result<RequirementsUpdate, StaffingError> {
                let events = SqliteEventRepository::try_new(tx)?;
                let shifts = SqliteShiftRepository::try_new(tx)?;

                let meal = events
                    .get_meal(meal_id)?
                    .ok_or(StaffingError::MealNotFound(meal_id))?;
                if !meal.is_chef(requested_by) {
                    return Err(StaffingError::Forbidden {
                        meal_id,
                        reason: ForbiddenReason::NotChef,
                    });
                }

                let now_ms = now_epoch_ms();
                let mut roles = Vec::with_capacity(Role::SLOT_ROLES.len());
                for role in Role::SLOT_ROLES {
                    let desired = requirements
                        .target_for(role)
                        .ok_or(StaffingError::NotSlotRole(role))?;
                    shifts.set_requirement(meal_id, role, desired)?;
                    roles.push(reconcile_role(&shifts, meal_id, role, desired, now_ms)?);
                }

                events.set_notes(
                    meal_id,
                    requirements.public_notes.as_str(),
                    requirements.private_notes.as_str(),
                )?;

                Ok(RequirementsUpdate { meal_id, roles })
            },
        )
        .map_err(|err| StaffingError::from_tx("set_role_requirements", err));

        match &result {
            Ok(update) => info!(
                "event=requirements_update module=requirements status=ok meal_id={} changed={}",
                meal_id,
                update.changed()
            ),
            Err(err) => warn!(
                "event=requirements_update module=requirements status=error meal_id={} error={}",
                meal_id, err
            ),
        }
        result
    }

    /// Records a target count for one slot role and reconciles it.
    ///
    /// Administrative entry point: no chef check. Idempotent for a repeated
    /// `desired`.
    ///
    /// # Errors
    /// - `Validation` when `desired` exceeds what the requirement form allows.
    pub fn reconcile(
        &self,
        meal_id: MealId,
        role: Role,
        desired: u32,
    ) -> Result<ReconcileOutcome, StaffingError> {
        if !role.is_slot_role() {
            return Err(StaffingError::NotSlotRole(role));
        }
        RoleRequirements::check_target(role, desired, self.config.max_slots_per_role)?;

        run_immediate(
            self.conn,
            self.config.max_tx_attempts,
            "reconcile",
            |tx| -> Result<ReconcileOutcome, StaffingError> {
                let events = SqliteEventRepository::try_new(tx)?;
                let shifts = SqliteShiftRepository::try_new(tx)?;
                if events.get_meal(meal_id)?.is_none() {
                    return Err(StaffingError::MealNotFound(meal_id));
                }
                shifts.set_requirement(meal_id, role, desired)?;
                reconcile_role(&shifts, meal_id, role, desired, now_epoch_ms())
            },
        )
        .map_err(|err| StaffingError::from_tx("reconcile", err))
    }

    /// Returns the current shift set for (meal, role), in creation order.
    pub fn get_shifts(&self, meal_id: MealId, role: Role) -> Result<Vec<Shift>, StaffingError> {
        if !role.is_slot_role() {
            return Err(StaffingError::NotSlotRole(role));
        }
        let shifts = SqliteShiftRepository::try_new(self.conn)?;
        Ok(shifts.list_shifts(meal_id, Some(role))?)
    }

    /// Returns the recorded target count for (meal, role), if any was set.
    pub fn get_requirement(
        &self,
        meal_id: MealId,
        role: Role,
    ) -> Result<Option<u32>, StaffingError> {
        if !role.is_slot_role() {
            return Err(StaffingError::NotSlotRole(role));
        }
        let shifts = SqliteShiftRepository::try_new(self.conn)?;
        Ok(shifts.get_requirement(meal_id, role)?)
    }

    /// Derives requirement form values from the live shift set and notes.
    pub fn current_requirements(&self, meal_id: MealId) -> Result<RoleRequirements, StaffingError> {
        let events = SqliteEventRepository::try_new(self.conn)?;
        let shifts = SqliteShiftRepository::try_new(self.conn)?;
        let meal = events
            .get_meal(meal_id)?
            .ok_or(StaffingError::MealNotFound(meal_id))?;

        let mut requirements = RoleRequirements::default()
            .with_notes(meal.public_notes.as_str(), meal.private_notes.as_str());
        for shift in shifts.list_shifts(meal_id, None)? {
            match shift.role {
                Role::SousChef => requirements.number_of_sous += 1,
                Role::Kp => requirements.number_of_kp += 1,
                Role::Courier => requirements.need_courier = true,
                Role::Chef => {}
            }
        }
        Ok(requirements)
    }
}

/// Current wall-clock time as Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
