mod common;

use std::cell::Cell;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use common::{date, first_meal, person, seeded};
use mealshift_core::{
    AssignmentService, Attendance, AttendanceSource, DayCounts, EngineConfig, EventId,
    EventService, MealKind, PersonId, RepoResult, RequirementService, Role, RoleRequirements,
    SqlitePersonRepository, StaffingViewBuilder,
};

/// Everybody is present on every day; no arrival or departure is recorded.
struct FixedAttendance(BTreeSet<PersonId>);

impl AttendanceSource for FixedAttendance {
    fn attendees_present_on(
        &self,
        _event_id: EventId,
        _day: NaiveDate,
    ) -> RepoResult<BTreeSet<PersonId>> {
        Ok(self.0.clone())
    }

    fn event_attendance(&self, event_id: EventId) -> RepoResult<Vec<Attendance>> {
        Ok(self
            .0
            .iter()
            .map(|person_id| Attendance {
                person_id: *person_id,
                event_id,
                arrival_day: None,
                departure_day: None,
            })
            .collect())
    }
}

/// Records how often each attendance query runs.
#[derive(Default)]
struct CountingAttendance {
    day_lookups: Cell<usize>,
    event_lookups: Cell<usize>,
}

impl AttendanceSource for CountingAttendance {
    fn attendees_present_on(
        &self,
        _event_id: EventId,
        _day: NaiveDate,
    ) -> RepoResult<BTreeSet<PersonId>> {
        self.day_lookups.set(self.day_lookups.get() + 1);
        Ok(BTreeSet::new())
    }

    fn event_attendance(&self, _event_id: EventId) -> RepoResult<Vec<Attendance>> {
        self.event_lookups.set(self.event_lookups.get() + 1);
        Ok(Vec::new())
    }
}

#[test]
fn schedule_lists_meals_in_serving_order_with_all_slot_roles() {
    let (conn, event) = seeded();
    let chef = person(&conn, "Chef Ada");
    let helper = person(&conn, "Bo");
    let dinner = first_meal(&conn, &event, MealKind::Dinner);
    let config = EngineConfig::default();
    let assignments = AssignmentService::new(&conn, config.clone());
    let requirements = RequirementService::new(&conn, config);
    assignments.toggle_chef(dinner.id, chef.id).unwrap();
    requirements
        .set_role_requirements(
            dinner.id,
            chef.id,
            &RoleRequirements::new(false, 2, 0, 4)
                .unwrap()
                .with_notes("Curry", "secret spice"),
        )
        .unwrap();
    let sous = requirements.get_shifts(dinner.id, Role::SousChef).unwrap();
    assignments.toggle_shift(sous[0].id, helper.id).unwrap();

    let attendance = FixedAttendance(BTreeSet::from([chef.id, helper.id]));
    let schedule = StaffingViewBuilder::new(&conn, &attendance)
        .meal_schedule(&event)
        .unwrap();

    assert_eq!(schedule.len(), 6);
    let order: Vec<(NaiveDate, MealKind)> = schedule.iter().map(|m| (m.day, m.kind)).collect();
    assert_eq!(order[0], (date(2026, 7, 1), MealKind::Breakfast));
    assert_eq!(order[1], (date(2026, 7, 1), MealKind::Dinner));
    assert_eq!(order[5], (date(2026, 7, 3), MealKind::Dinner));

    let summary = &schedule[1];
    assert_eq!(summary.meal_id, dinner.id);
    assert_eq!(
        summary.chef.as_ref().and_then(|c| c.display_name.as_deref()),
        Some("Chef Ada")
    );
    assert_eq!(summary.public_notes, "Curry");
    assert_eq!(summary.num_served, 2);
    let roles: Vec<Role> = summary.positions.iter().map(|p| p.role).collect();
    assert_eq!(roles, vec![Role::SousChef, Role::Kp, Role::Courier]);
    assert_eq!(summary.positions[0].shifts.len(), 2);
    assert_eq!(summary.positions[0].open(), 1);
    assert!(summary.positions[2].shifts.is_empty());

    let json = serde_json::to_string(summary).unwrap();
    assert!(!json.contains("secret spice"));
}

#[test]
fn calendar_pads_to_sunday_first_weeks_with_headcounts() {
    let (conn, event) = seeded();
    let early = person(&conn, "Early");
    let late = person(&conn, "Late");
    let unsure = person(&conn, "Unsure");
    let events = EventService::new(&conn, EngineConfig::default());
    events
        .record_attendance(early.id, event.id, Some(date(2026, 7, 1)), Some(date(2026, 7, 2)))
        .unwrap();
    events
        .record_attendance(late.id, event.id, Some(date(2026, 7, 2)), Some(date(2026, 7, 3)))
        .unwrap();
    events
        .record_attendance(unsure.id, event.id, Some(date(2026, 7, 1)), None)
        .unwrap();

    let attendance = SqlitePersonRepository::try_new(&conn).unwrap();
    let calendar = StaffingViewBuilder::new(&conn, &attendance)
        .calendar(&event)
        .unwrap();

    assert_eq!(calendar.event_name, "Camp 2026");
    assert_eq!(calendar.weeks.len(), 1);
    let week = &calendar.weeks[0].days;
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, date(2026, 6, 28));
    assert_eq!(
        week.iter().map(|day| day.index).collect::<Vec<_>>(),
        (0..7).collect::<Vec<i64>>()
    );

    let in_event: Vec<usize> = week
        .iter()
        .filter(|day| day.in_event)
        .map(|day| day.index as usize)
        .collect();
    assert_eq!(in_event, vec![3, 4, 5]);
    assert!(week[0].meals.is_empty());
    assert!(week[6].meals.is_empty());
    assert_eq!(week[3].meals.len(), 2);

    let headcounts: Vec<usize> = week[3..6].iter().map(|day| day.headcount).collect();
    assert_eq!(headcounts, vec![1, 2, 1]);
    assert_eq!(week[4].meals[0].num_served, 2);

    assert_eq!(
        week[3].counts,
        DayCounts {
            arriving: 2,
            departing: 0,
            staying: 0,
            unconfirmed: 1,
        }
    );
    assert_eq!(
        week[4].counts,
        DayCounts {
            arriving: 1,
            departing: 1,
            staying: 0,
            unconfirmed: 1,
        }
    );
    assert_eq!(week[5].counts.departing, 1);
    assert_eq!(week[0].counts, DayCounts::default());

    let json = serde_json::to_value(&week[3]).unwrap();
    assert_eq!(json["arriving"], 2);
    assert_eq!(json["unconfirmed"], 1);
}

#[test]
fn staying_counts_only_days_strictly_inside_a_stay() {
    let (conn, event) = seeded();
    let whole = person(&conn, "Whole Camp");
    EventService::new(&conn, EngineConfig::default())
        .record_attendance(whole.id, event.id, Some(date(2026, 7, 1)), Some(date(2026, 7, 3)))
        .unwrap();

    let attendance = SqlitePersonRepository::try_new(&conn).unwrap();
    let calendar = StaffingViewBuilder::new(&conn, &attendance)
        .calendar(&event)
        .unwrap();

    let staying: Vec<usize> = calendar.weeks[0].days[3..6]
        .iter()
        .map(|day| day.counts.staying)
        .collect();
    assert_eq!(staying, vec![0, 1, 0]);
    let headcounts: Vec<usize> = calendar.weeks[0].days[3..6]
        .iter()
        .map(|day| day.headcount)
        .collect();
    assert_eq!(headcounts, vec![1, 1, 1]);
}

#[test]
fn calendar_reads_attendance_once_per_event_day() {
    let (conn, event) = seeded();
    let attendance = CountingAttendance::default();
    let builder = StaffingViewBuilder::new(&conn, &attendance);

    builder.calendar(&event).unwrap();
    assert_eq!(attendance.day_lookups.get(), event.days().len());
    assert_eq!(attendance.event_lookups.get(), 1);

    builder.meal_schedule(&event).unwrap();
    assert_eq!(attendance.day_lookups.get(), 2 * event.days().len());
    assert_eq!(attendance.event_lookups.get(), 1);
}
