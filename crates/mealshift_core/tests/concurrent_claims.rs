mod common;

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{first_meal, person, seed_event};
use mealshift_core::{
    open_db_with_config, AssignmentService, EngineConfig, MealKind, PersonId, RequirementService,
    Role, ShiftClaim, ShiftId, StaffingError,
};

fn config() -> EngineConfig {
    EngineConfig {
        max_tx_attempts: 5,
        busy_timeout_ms: 10_000,
        ..EngineConfig::default()
    }
}

fn race(path: &Path, claims: Vec<(ShiftId, PersonId)>) -> Vec<Result<ShiftClaim, StaffingError>> {
    let barrier = Arc::new(Barrier::new(claims.len()));
    let handles: Vec<_> = claims
        .into_iter()
        .map(|(shift, identity)| {
            let barrier = Arc::clone(&barrier);
            let path = path.to_path_buf();
            thread::spawn(move || {
                let conn = open_db_with_config(&path, &config()).unwrap();
                barrier.wait();
                AssignmentService::new(&conn, config()).toggle_shift(shift, identity)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn concurrent_claims_of_one_shift_have_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let conn = open_db_with_config(&path, &config()).unwrap();
    let event = seed_event(&conn);
    let meal = first_meal(&conn, &event, MealKind::Dinner);
    let requirements = RequirementService::new(&conn, config());
    requirements.reconcile(meal.id, Role::Kp, 1).unwrap();
    let shift = requirements.get_shifts(meal.id, Role::Kp).unwrap()[0].id;
    let contenders: Vec<PersonId> = (0..8)
        .map(|n| person(&conn, &format!("worker-{n}")).id)
        .collect();

    let results = race(
        &path,
        contenders.iter().map(|identity| (shift, *identity)).collect(),
    );

    let winners: Vec<PersonId> = results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .filter_map(|claim| claim.worker)
        .collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, StaffingError::AlreadyClaimed { holder, .. } if *holder == winners[0]),
                "unexpected error: {err}"
            );
        }
    }

    let stored = requirements.get_shifts(meal.id, Role::Kp).unwrap();
    assert_eq!(stored[0].worker, Some(winners[0]));
}

#[test]
fn concurrent_claims_by_one_worker_leave_a_single_claim_per_meal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("same-worker.db");
    let conn = open_db_with_config(&path, &config()).unwrap();
    let event = seed_event(&conn);
    let meal = first_meal(&conn, &event, MealKind::Breakfast);
    let requirements = RequirementService::new(&conn, config());
    requirements.reconcile(meal.id, Role::SousChef, 2).unwrap();
    requirements.reconcile(meal.id, Role::Kp, 2).unwrap();
    let worker = person(&conn, "busy bee").id;

    let mut claims = Vec::new();
    for role in [Role::SousChef, Role::Kp] {
        for shift in requirements.get_shifts(meal.id, role).unwrap() {
            claims.push((shift.id, worker));
        }
    }
    let results = race(&path, claims);

    assert!(results.iter().all(Result::is_ok));
    let held: usize = [Role::SousChef, Role::Kp]
        .into_iter()
        .flat_map(|role| requirements.get_shifts(meal.id, role).unwrap())
        .filter(|shift| shift.worker == Some(worker))
        .count();
    assert_eq!(held, 1);
}
