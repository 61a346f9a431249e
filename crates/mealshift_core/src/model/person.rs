//! People and attendance records.
//!
//! The identity and attendance stores are external collaborators; these
//! records are the minimal shape the engine reads from them.

use crate::model::event::EventId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity reference for workers and chefs.
///
/// Exclusivity checks compare this value, never session state.
pub type PersonId = Uuid;

/// Identity as exposed by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub display_name: String,
}

impl Person {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
        }
    }
}

/// Planned presence of one person at one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub person_id: PersonId,
    pub event_id: EventId,
    pub arrival_day: Option<NaiveDate>,
    pub departure_day: Option<NaiveDate>,
}

impl Attendance {
    /// Whether the person is on site on `day`.
    ///
    /// Unconfirmed attendance (missing arrival or departure) never counts.
    pub fn is_present_on(&self, day: NaiveDate) -> bool {
        match (self.arrival_day, self.departure_day) {
            (Some(arrival), Some(departure)) => arrival <= day && day <= departure,
            _ => false,
        }
    }
}

/// Attendance transitions on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DayCounts {
    /// Arrival day is this day.
    pub arriving: usize,
    /// Departure day is this day.
    pub departing: usize,
    /// Confirmed and strictly between arrival and departure.
    pub staying: usize,
    /// Missing an arrival or departure day; the same on every day.
    pub unconfirmed: usize,
}

impl DayCounts {
    pub fn tally(attendance: &[Attendance], day: NaiveDate) -> Self {
        let mut counts = Self::default();
        for record in attendance {
            if record.arrival_day == Some(day) {
                counts.arriving += 1;
            }
            if record.departure_day == Some(day) {
                counts.departing += 1;
            }
            match (record.arrival_day, record.departure_day) {
                (Some(arrival), Some(departure)) => {
                    if arrival < day && day < departure {
                        counts.staying += 1;
                    }
                }
                _ => counts.unconfirmed += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::{Attendance, DayCounts};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn attendance(arrival: Option<u32>, departure: Option<u32>) -> Attendance {
        Attendance {
            person_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            arrival_day: arrival.map(date),
            departure_day: departure.map(date),
        }
    }

    #[test]
    fn present_inclusive_of_arrival_and_departure() {
        let stay = attendance(Some(3), Some(5));
        assert!(!stay.is_present_on(date(2)));
        assert!(stay.is_present_on(date(3)));
        assert!(stay.is_present_on(date(5)));
        assert!(!stay.is_present_on(date(6)));
    }

    #[test]
    fn unconfirmed_attendance_is_never_present() {
        assert!(!attendance(Some(3), None).is_present_on(date(3)));
        assert!(!attendance(None, Some(5)).is_present_on(date(4)));
        assert!(!attendance(None, None).is_present_on(date(4)));
    }

    #[test]
    fn day_counts_split_transitions_from_stays() {
        let records = vec![
            attendance(Some(3), Some(6)),
            attendance(Some(4), Some(4)),
            attendance(Some(4), None),
            attendance(None, None),
        ];

        assert_eq!(
            DayCounts::tally(&records, date(4)),
            DayCounts {
                arriving: 2,
                departing: 1,
                staying: 1,
                unconfirmed: 2,
            }
        );
        assert_eq!(
            DayCounts::tally(&records, date(6)),
            DayCounts {
                arriving: 0,
                departing: 1,
                staying: 0,
                unconfirmed: 2,
            }
        );
        assert_eq!(DayCounts::tally(&[], date(4)), DayCounts::default());
    }
}
