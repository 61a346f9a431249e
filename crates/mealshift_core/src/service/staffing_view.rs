//! Read-only staffing projections.
//!
//! # Responsibility
//! - Summarize each meal: chef, notes, slot positions and headcount.
//! - Lay the event out as Sunday-first calendar weeks with per-day
//!   attendance transitions.
//!
//! # Invariants
//! - Never mutates storage.
//! - All three slot roles are present in every summary, even when empty.
//! - Calendar cells are contiguous; padding cells carry no meals and zero
//!   counts.
//! - Attendance is read once per view, not once per consumer.

use crate::model::event::{Event, EventId, Meal, MealId, MealKind};
use crate::model::person::{DayCounts, PersonId};
use crate::model::shift::{Role, Shift, ShiftId};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::person_repo::{AttendanceSource, PersonRepository, SqlitePersonRepository};
use crate::repo::shift_repo::{ShiftRepository, SqliteShiftRepository};
use crate::service::error::StaffingError;
use chrono::{Datelike, Days, NaiveDate};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Identity reference with its display name, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRef {
    pub id: PersonId,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftView {
    pub shift_id: ShiftId,
    pub worker: Option<PersonRef>,
}

/// Shifts of one slot role, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePositions {
    pub role: Role,
    pub label: &'static str,
    pub shifts: Vec<ShiftView>,
}

impl RolePositions {
    pub fn open(&self) -> usize {
        self.shifts.iter().filter(|shift| shift.worker.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealSummary {
    pub meal_id: MealId,
    pub day: NaiveDate,
    pub kind: MealKind,
    pub chef: Option<PersonRef>,
    pub public_notes: String,
    /// One entry per slot role, in `Role::SLOT_ROLES` order.
    pub positions: Vec<RolePositions>,
    /// Attendees present on the meal's day.
    pub num_served: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// Days since the Sunday on or before the event start.
    pub index: i64,
    pub date: NaiveDate,
    pub in_event: bool,
    pub headcount: usize,
    #[serde(flatten)]
    pub counts: DayCounts,
    pub meals: Vec<MealSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarWeek {
    /// Sunday through Saturday.
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffingCalendar {
    pub event_id: EventId,
    pub event_name: String,
    pub weeks: Vec<CalendarWeek>,
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
}

/// Calendar cell index of `day` for an event starting on `event_start`.
pub fn calendar_index(event_start: NaiveDate, day: NaiveDate) -> i64 {
    (day - week_start(event_start)).num_days()
}

/// Every date shown on the event calendar: whole weeks covering the event.
fn calendar_dates(event: &Event) -> Vec<NaiveDate> {
    let first = week_start(event.start_date);
    let last_day = event.end_date.pred_opt().unwrap_or(event.start_date);
    let last = week_start(last_day) + Days::new(6);
    first.iter_days().take_while(|day| *day <= last).collect()
}

/// Builds staffing views from storage and an attendance source.
pub struct StaffingViewBuilder<'a, A: AttendanceSource> {
    conn: &'a Connection,
    attendance: &'a A,
}

impl<'a, A: AttendanceSource> StaffingViewBuilder<'a, A> {
    pub fn new(conn: &'a Connection, attendance: &'a A) -> Self {
        Self { conn, attendance }
    }

    /// Meal summaries of an event, ordered by day then kind.
    pub fn meal_schedule(&self, event: &Event) -> Result<Vec<MealSummary>, StaffingError> {
        let headcounts = self.headcounts(event)?;
        self.schedule_with(event, &headcounts)
    }

    fn schedule_with(
        &self,
        event: &Event,
        headcounts: &HashMap<NaiveDate, usize>,
    ) -> Result<Vec<MealSummary>, StaffingError> {
        let events = SqliteEventRepository::try_new(self.conn)?;
        let shifts = SqliteShiftRepository::try_new(self.conn)?;
        let people = SqlitePersonRepository::try_new(self.conn)?;

        let names: HashMap<PersonId, String> = people
            .list_people()?
            .into_iter()
            .map(|person| (person.id, person.display_name))
            .collect();

        let meals = events.list_meals(event.id)?;
        let mut summaries = Vec::with_capacity(meals.len());
        for meal in meals {
            let meal_shifts = shifts.list_shifts(meal.id, None)?;
            let num_served = headcounts.get(&meal.day).copied().unwrap_or(0);
            summaries.push(summarize(meal, &meal_shifts, &names, num_served));
        }

        debug!(
            "event=meal_schedule module=staffing_view status=ok event_id={} meals={}",
            event.id,
            summaries.len()
        );
        Ok(summaries)
    }

    /// Calendar of an event in Sunday-first week rows.
    pub fn calendar(&self, event: &Event) -> Result<StaffingCalendar, StaffingError> {
        let headcounts = self.headcounts(event)?;
        let attendance = self.attendance.event_attendance(event.id)?;
        let mut meals_by_day: BTreeMap<NaiveDate, Vec<MealSummary>> = BTreeMap::new();
        for summary in self.schedule_with(event, &headcounts)? {
            meals_by_day.entry(summary.day).or_default().push(summary);
        }

        let mut weeks: Vec<CalendarWeek> = Vec::new();
        for date in calendar_dates(event) {
            let in_event = event.contains(date);
            let day = CalendarDay {
                index: calendar_index(event.start_date, date),
                date,
                in_event,
                headcount: headcounts.get(&date).copied().unwrap_or(0),
                counts: if in_event {
                    DayCounts::tally(&attendance, date)
                } else {
                    DayCounts::default()
                },
                meals: if in_event {
                    meals_by_day.remove(&date).unwrap_or_default()
                } else {
                    Vec::new()
                },
            };
            match weeks.last_mut() {
                Some(week) if week.days.len() < 7 => week.days.push(day),
                _ => weeks.push(CalendarWeek { days: vec![day] }),
            }
        }

        Ok(StaffingCalendar {
            event_id: event.id,
            event_name: event.name.clone(),
            weeks,
        })
    }

    fn headcounts(&self, event: &Event) -> Result<HashMap<NaiveDate, usize>, StaffingError> {
        let mut counts = HashMap::new();
        for day in event.days() {
            let present = self.attendance.attendees_present_on(event.id, day)?;
            counts.insert(day, present.len());
        }
        Ok(counts)
    }
}

fn person_ref(id: PersonId, names: &HashMap<PersonId, String>) -> PersonRef {
    PersonRef {
        id,
        display_name: names.get(&id).cloned(),
    }
}

fn summarize(
    meal: Meal,
    shifts: &[Shift],
    names: &HashMap<PersonId, String>,
    num_served: usize,
) -> MealSummary {
    let positions = Role::SLOT_ROLES
        .into_iter()
        .map(|role| RolePositions {
            role,
            label: role.display_name(),
            shifts: shifts
                .iter()
                .filter(|shift| shift.role == role)
                .map(|shift| ShiftView {
                    shift_id: shift.id,
                    worker: shift.worker.map(|id| person_ref(id, names)),
                })
                .collect(),
        })
        .collect();

    MealSummary {
        meal_id: meal.id,
        day: meal.day,
        kind: meal.kind,
        chef: meal.chef.map(|id| person_ref(id, names)),
        public_notes: meal.public_notes,
        positions,
        num_served,
    }
}

#[cfg(test)]
mod tests {
    use super::{calendar_dates, calendar_index, summarize, week_start};
    use crate::model::event::{Event, Meal, MealKind};
    use crate::model::shift::{Role, Shift};
    use chrono::{Datelike, NaiveDate, Weekday};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(start: NaiveDate, num_days: u32) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "Camp 2026".to_string(),
            start_date: start,
            end_date: Event::end_for(start, num_days).unwrap(),
        }
    }

    #[test]
    fn week_start_is_sunday_on_or_before() {
        // 2026-07-01 is a Wednesday.
        assert_eq!(week_start(date(2026, 7, 1)), date(2026, 6, 28));
        assert_eq!(week_start(date(2026, 6, 28)), date(2026, 6, 28));
        assert_eq!(week_start(date(2026, 7, 4)).weekday(), Weekday::Sun);
    }

    #[test]
    fn index_counts_from_leading_sunday() {
        let start = date(2026, 7, 1);
        assert_eq!(calendar_index(start, start), 3);
        assert_eq!(calendar_index(start, date(2026, 7, 5)), 7);
    }

    #[test]
    fn calendar_dates_pad_to_whole_weeks() {
        // Wednesday through the following Monday.
        let dates = calendar_dates(&event(date(2026, 7, 1), 6));
        assert_eq!(dates.len(), 14);
        assert_eq!(dates.first().copied(), Some(date(2026, 6, 28)));
        assert_eq!(dates.last().copied(), Some(date(2026, 7, 11)));
    }

    #[test]
    fn event_ending_on_saturday_fills_one_week() {
        let dates = calendar_dates(&event(date(2026, 6, 28), 7));
        assert_eq!(dates.len(), 7);
    }

    #[test]
    fn summary_always_lists_every_slot_role() {
        let meal = Meal::new(Uuid::new_v4(), date(2026, 7, 1), MealKind::Dinner);
        let worker = Uuid::new_v4();
        let mut kp = Shift::new(meal.id, Role::Kp, 1);
        kp.worker = Some(worker);
        let names = HashMap::from([(worker, "Ada".to_string())]);

        let summary = summarize(meal, &[kp.clone()], &names, 12);

        let roles: Vec<Role> = summary.positions.iter().map(|p| p.role).collect();
        assert_eq!(roles, vec![Role::SousChef, Role::Kp, Role::Courier]);
        assert!(summary.positions[0].shifts.is_empty());
        let holder = summary.positions[1].shifts[0].worker.clone().unwrap();
        assert_eq!(holder.display_name.as_deref(), Some("Ada"));
        assert_eq!(summary.positions[1].open(), 0);
        assert_eq!(summary.num_served, 12);
        assert!(summary.chef.is_none());
    }
}
