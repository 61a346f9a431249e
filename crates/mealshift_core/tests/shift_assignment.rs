mod common;

use common::{first_meal, person, seeded};
use mealshift_core::{
    AssignmentService, EngineConfig, ForbiddenReason, MealKind, RequirementService, Role,
    StaffingError,
};

#[test]
fn toggling_twice_restores_unclaimed() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let meal = first_meal(&conn, &event, MealKind::Dinner);
    let config = EngineConfig::default();
    let requirements = RequirementService::new(&conn, config.clone());
    let assignments = AssignmentService::new(&conn, config);
    requirements.reconcile(meal.id, Role::Kp, 1).unwrap();
    let shift = requirements.get_shifts(meal.id, Role::Kp).unwrap()[0].id;

    let claim = assignments.toggle_shift(shift, a.id).unwrap();
    assert_eq!(claim.worker, Some(a.id));
    assert_eq!(claim.meal_id, meal.id);

    let release = assignments.toggle_shift(shift, a.id).unwrap();
    assert_eq!(release.worker, None);
    assert!(requirements.get_shifts(meal.id, Role::Kp).unwrap()[0]
        .worker
        .is_none());
}

#[test]
fn claimed_shift_is_never_overwritten() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let b = person(&conn, "B");
    let meal = first_meal(&conn, &event, MealKind::Dinner);
    let config = EngineConfig::default();
    let requirements = RequirementService::new(&conn, config.clone());
    let assignments = AssignmentService::new(&conn, config);
    requirements.reconcile(meal.id, Role::SousChef, 1).unwrap();
    let shift = requirements.get_shifts(meal.id, Role::SousChef).unwrap()[0].id;

    assignments.toggle_shift(shift, a.id).unwrap();
    let err = assignments.toggle_shift(shift, b.id).unwrap_err();

    match err {
        StaffingError::AlreadyClaimed { shift_id, holder } => {
            assert_eq!(shift_id, shift);
            assert_eq!(holder, a.id);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(StaffingError::AlreadyClaimed {
        shift_id: shift,
        holder: a.id
    }
    .is_recoverable());
    let stored = requirements.get_shifts(meal.id, Role::SousChef).unwrap();
    assert_eq!(stored[0].worker, Some(a.id));
}

#[test]
fn claiming_another_shift_on_same_meal_moves_the_claim() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let meal = first_meal(&conn, &event, MealKind::Dinner);
    let config = EngineConfig::default();
    let requirements = RequirementService::new(&conn, config.clone());
    let assignments = AssignmentService::new(&conn, config);
    requirements.reconcile(meal.id, Role::SousChef, 1).unwrap();
    requirements.reconcile(meal.id, Role::Kp, 1).unwrap();
    let sous = requirements.get_shifts(meal.id, Role::SousChef).unwrap()[0].id;
    let kp = requirements.get_shifts(meal.id, Role::Kp).unwrap()[0].id;

    assignments.toggle_shift(sous, a.id).unwrap();
    let claim = assignments.toggle_shift(kp, a.id).unwrap();

    assert_eq!(claim.released, vec![sous]);
    assert!(requirements.get_shifts(meal.id, Role::SousChef).unwrap()[0]
        .worker
        .is_none());
    assert_eq!(
        requirements.get_shifts(meal.id, Role::Kp).unwrap()[0].worker,
        Some(a.id)
    );
}

#[test]
fn one_worker_may_hold_shifts_on_different_meals() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let breakfast = first_meal(&conn, &event, MealKind::Breakfast);
    let dinner = first_meal(&conn, &event, MealKind::Dinner);
    let config = EngineConfig::default();
    let requirements = RequirementService::new(&conn, config.clone());
    let assignments = AssignmentService::new(&conn, config);
    requirements.reconcile(breakfast.id, Role::Kp, 1).unwrap();
    requirements.reconcile(dinner.id, Role::Kp, 1).unwrap();

    let morning = requirements.get_shifts(breakfast.id, Role::Kp).unwrap()[0].id;
    let evening = requirements.get_shifts(dinner.id, Role::Kp).unwrap()[0].id;
    assignments.toggle_shift(morning, a.id).unwrap();
    let claim = assignments.toggle_shift(evening, a.id).unwrap();

    assert!(claim.released.is_empty());
    assert_eq!(
        requirements.get_shifts(breakfast.id, Role::Kp).unwrap()[0].worker,
        Some(a.id)
    );
}

#[test]
fn unknown_shift_or_person_is_reported() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let meal = first_meal(&conn, &event, MealKind::Dinner);
    let config = EngineConfig::default();
    let requirements = RequirementService::new(&conn, config.clone());
    let assignments = AssignmentService::new(&conn, config);
    requirements.reconcile(meal.id, Role::Courier, 1).unwrap();
    let shift = requirements.get_shifts(meal.id, Role::Courier).unwrap()[0].id;

    let stranger = uuid::Uuid::new_v4();
    assert!(matches!(
        assignments.toggle_shift(shift, stranger),
        Err(StaffingError::PersonNotFound(id)) if id == stranger
    ));
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        assignments.toggle_shift(missing, a.id),
        Err(StaffingError::ShiftNotFound(id)) if id == missing
    ));
}

#[test]
fn chef_toggle_steps_up_and_down() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let meal = first_meal(&conn, &event, MealKind::Breakfast);
    let assignments = AssignmentService::new(&conn, EngineConfig::default());

    let state = assignments.toggle_chef(meal.id, a.id).unwrap();
    assert_eq!(state.chef, Some(a.id));

    let state = assignments.toggle_chef(meal.id, a.id).unwrap();
    assert_eq!(state.chef, None);
}

#[test]
fn chef_slot_held_by_another_is_forbidden() {
    let (conn, event) = seeded();
    let a = person(&conn, "A");
    let b = person(&conn, "B");
    let meal = first_meal(&conn, &event, MealKind::Dinner);
    let assignments = AssignmentService::new(&conn, EngineConfig::default());

    assignments.toggle_chef(meal.id, a.id).unwrap();
    let err = assignments.toggle_chef(meal.id, b.id).unwrap_err();

    assert!(matches!(
        err,
        StaffingError::Forbidden {
            reason: ForbiddenReason::ChefTaken { chef },
            ..
        } if chef == a.id
    ));
    assert!(!err.is_recoverable());
}
