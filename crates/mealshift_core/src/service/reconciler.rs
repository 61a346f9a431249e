//! Slot reconciliation.
//!
//! # Responsibility
//! - Decide which shift rows to delete or create so that (meal, role)
//!   matches a target count.
//! - Apply that decision through a `ShiftRepository` bound to the caller's
//!   transaction.
//!
//! # Invariants
//! - The plan is computed from one read of the shift set; counts are never
//!   re-queried between deletes.
//! - Unclaimed shifts absorb a reduction first, oldest first.
//! - Claimed shifts are deleted only when unclaimed ones run out, newest
//!   `created_at` first.
//! - After application the role holds exactly `desired` shifts.
//! - New shifts are stamped later than every existing shift of the role,
//!   even if the wall clock stepped backwards.

use crate::model::event::MealId;
use crate::model::shift::{Role, Shift, ShiftId};
use crate::repo::shift_repo::ShiftRepository;
use crate::repo::RepoError;
use crate::service::error::StaffingError;
use log::{debug, info};
use serde::Serialize;
use std::cmp::Reverse;

/// Row-level changes needed to reach a target count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcilePlan {
    /// Unclaimed shifts to delete.
    pub delete_unclaimed: Vec<ShiftId>,
    /// Claimed shifts to delete, newest first.
    pub delete_claimed: Vec<ShiftId>,
    /// Number of new unclaimed shifts to create.
    pub create: u32,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.delete_unclaimed.is_empty() && self.delete_claimed.is_empty() && self.create == 0
    }

    /// Every shift id scheduled for deletion.
    pub fn deletions(&self) -> Vec<ShiftId> {
        self.delete_unclaimed
            .iter()
            .chain(self.delete_claimed.iter())
            .copied()
            .collect()
    }
}

/// Applied result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub meal_id: MealId,
    pub role: Role,
    pub before: usize,
    pub after: usize,
    pub created: Vec<ShiftId>,
    pub deleted: Vec<ShiftId>,
    /// Subset of `deleted` that had a worker.
    pub deleted_claimed: Vec<ShiftId>,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.deleted.is_empty()
    }
}

/// Computes the changes that bring `existing` to `desired` rows.
///
/// `existing` must all belong to one (meal, role). Input order is used as
/// the tie-break when `created_at` values are equal.
pub fn plan_reconciliation(existing: &[Shift], desired: u32) -> ReconcilePlan {
    let desired = desired as usize;
    let count = existing.len();

    if count == desired {
        return ReconcilePlan::default();
    }

    if count < desired {
        return ReconcilePlan {
            create: (desired - count) as u32,
            ..ReconcilePlan::default()
        };
    }

    let surplus = count - desired;

    let mut unclaimed: Vec<(usize, &Shift)> = existing
        .iter()
        .enumerate()
        .filter(|(_, shift)| !shift.is_claimed())
        .collect();
    unclaimed.sort_by_key(|(index, shift)| (shift.created_at, *index));
    let delete_unclaimed: Vec<ShiftId> = unclaimed
        .iter()
        .take(surplus)
        .map(|(_, shift)| shift.id)
        .collect();

    let remainder = surplus - delete_unclaimed.len();
    let mut delete_claimed = Vec::new();
    if remainder > 0 {
        let mut claimed: Vec<(usize, &Shift)> = existing
            .iter()
            .enumerate()
            .filter(|(_, shift)| shift.is_claimed())
            .collect();
        claimed.sort_by_key(|(index, shift)| Reverse((shift.created_at, *index)));
        delete_claimed = claimed
            .iter()
            .take(remainder)
            .map(|(_, shift)| shift.id)
            .collect();
    }

    ReconcilePlan {
        delete_unclaimed,
        delete_claimed,
        create: 0,
    }
}

/// `created_at` for shifts added after `existing`: `now_ms`, or one past the
/// newest existing stamp when the clock is behind it.
pub fn creation_stamp(existing: &[Shift], now_ms: i64) -> i64 {
    existing
        .iter()
        .map(|shift| shift.created_at)
        .max()
        .map_or(now_ms, |latest| now_ms.max(latest.saturating_add(1)))
}

/// Brings (meal, role) to exactly `desired` shifts.
///
/// Runs inside the caller's transaction; created rows are stamped with
/// `creation_stamp(existing, now_ms)`.
pub fn reconcile_role<R: ShiftRepository>(
    repo: &R,
    meal_id: MealId,
    role: Role,
    desired: u32,
    now_ms: i64,
) -> Result<ReconcileOutcome, StaffingError> {
    if !role.is_slot_role() {
        return Err(StaffingError::NotSlotRole(role));
    }

    let existing = repo.list_shifts(meal_id, Some(role))?;
    let before = existing.len();
    let plan = plan_reconciliation(&existing, desired);

    if plan.is_noop() {
        debug!(
            "event=reconcile module=reconciler status=noop meal_id={} role={} count={}",
            meal_id,
            role.as_str(),
            before
        );
        return Ok(ReconcileOutcome {
            meal_id,
            role,
            before,
            after: before,
            created: Vec::new(),
            deleted: Vec::new(),
            deleted_claimed: Vec::new(),
        });
    }

    let deleted = plan.deletions();
    let removed = repo.delete_shifts(&deleted)?;
    if removed != deleted.len() {
        return Err(StaffingError::Repo(RepoError::InvalidData(format!(
            "expected to delete {} shifts for meal {meal_id}, removed {removed}",
            deleted.len()
        ))));
    }

    let stamp = creation_stamp(&existing, now_ms);
    let mut created = Vec::with_capacity(plan.create as usize);
    for _ in 0..plan.create {
        let shift = Shift::new(meal_id, role, stamp);
        repo.insert_shift(&shift)?;
        created.push(shift.id);
    }

    let after = before - deleted.len() + created.len();
    info!(
        "event=reconcile module=reconciler status=ok meal_id={} role={} before={} after={} created={} deleted={} deleted_claimed={}",
        meal_id,
        role.as_str(),
        before,
        after,
        created.len(),
        deleted.len(),
        plan.delete_claimed.len()
    );

    Ok(ReconcileOutcome {
        meal_id,
        role,
        before,
        after,
        created,
        deleted,
        deleted_claimed: plan.delete_claimed,
    })
}

#[cfg(test)]
mod tests {
    use super::{creation_stamp, plan_reconciliation};
    use crate::model::shift::{Role, Shift};
    use uuid::Uuid;

    fn shift(meal_id: Uuid, created_at: i64, worker: Option<Uuid>) -> Shift {
        let mut shift = Shift::new(meal_id, Role::SousChef, created_at);
        shift.worker = worker;
        shift
    }

    #[test]
    fn equal_count_is_noop() {
        let meal = Uuid::new_v4();
        let existing = vec![shift(meal, 1, None), shift(meal, 2, Some(Uuid::new_v4()))];
        assert!(plan_reconciliation(&existing, 2).is_noop());
    }

    #[test]
    fn growth_only_creates() {
        let meal = Uuid::new_v4();
        let existing = vec![shift(meal, 1, None)];
        let plan = plan_reconciliation(&existing, 4);
        assert_eq!(plan.create, 3);
        assert!(plan.deletions().is_empty());
    }

    #[test]
    fn shrink_prefers_unclaimed_oldest_first() {
        let meal = Uuid::new_v4();
        let claimed = shift(meal, 1, Some(Uuid::new_v4()));
        let open_old = shift(meal, 2, None);
        let open_new = shift(meal, 3, None);
        let existing = vec![claimed.clone(), open_old.clone(), open_new.clone()];

        let plan = plan_reconciliation(&existing, 2);
        assert_eq!(plan.delete_unclaimed, vec![open_old.id]);
        assert!(plan.delete_claimed.is_empty());
        assert_eq!(plan.create, 0);
    }

    #[test]
    fn shrink_below_unclaimed_deletes_newest_claims() {
        let meal = Uuid::new_v4();
        let first = shift(meal, 10, Some(Uuid::new_v4()));
        let open = shift(meal, 20, None);
        let second = shift(meal, 30, Some(Uuid::new_v4()));
        let third = shift(meal, 40, Some(Uuid::new_v4()));
        let existing = vec![first.clone(), open.clone(), second.clone(), third.clone()];

        let plan = plan_reconciliation(&existing, 1);
        assert_eq!(plan.delete_unclaimed, vec![open.id]);
        assert_eq!(plan.delete_claimed, vec![third.id, second.id]);
    }

    #[test]
    fn claimed_tie_break_follows_input_order_not_ids() {
        let meal = Uuid::new_v4();
        let earlier = shift(meal, 5, Some(Uuid::new_v4()));
        let later = shift(meal, 5, Some(Uuid::new_v4()));
        let existing = vec![earlier.clone(), later.clone()];

        let plan = plan_reconciliation(&existing, 1);
        assert_eq!(plan.delete_claimed, vec![later.id]);
    }

    #[test]
    fn recency_uses_created_at_even_when_input_is_unordered() {
        let meal = Uuid::new_v4();
        let newest = shift(meal, 300, Some(Uuid::new_v4()));
        let oldest = shift(meal, 100, Some(Uuid::new_v4()));
        let existing = vec![newest.clone(), oldest.clone()];

        let plan = plan_reconciliation(&existing, 1);
        assert_eq!(plan.delete_claimed, vec![newest.id]);
    }

    #[test]
    fn shrink_to_zero_removes_everything() {
        let meal = Uuid::new_v4();
        let existing = vec![shift(meal, 1, Some(Uuid::new_v4())), shift(meal, 2, None)];
        let plan = plan_reconciliation(&existing, 0);
        assert_eq!(plan.deletions().len(), 2);
    }

    #[test]
    fn creation_stamp_never_precedes_existing_rows() {
        let meal = Uuid::new_v4();
        assert_eq!(creation_stamp(&[], 1_000), 1_000);

        let existing = vec![shift(meal, 500, None), shift(meal, 900, None)];
        assert_eq!(creation_stamp(&existing, 1_000), 1_000);

        let ahead = vec![shift(meal, 5_000, Some(Uuid::new_v4())), shift(meal, 10, None)];
        assert_eq!(creation_stamp(&ahead, 1_000), 5_001);

        let saturated = vec![shift(meal, i64::MAX, None)];
        assert_eq!(creation_stamp(&saturated, 0), i64::MAX);
    }
}
