//! People and attendance repository.
//!
//! # Responsibility
//! - Stand in for the identity store (stable person ids, display names).
//! - Answer the attendance queries consumed by the staffing view.
//!
//! # Invariants
//! - Attendance rows are unique per (person, event); recording replaces.
//! - Attendance with a missing arrival or departure day never counts as present.

use crate::model::event::EventId;
use crate::model::person::{Attendance, Person, PersonId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

/// Attendance query consumed by the staffing view builder.
pub trait AttendanceSource {
    /// Returns everybody on site for `event_id` on `day`.
    fn attendees_present_on(
        &self,
        event_id: EventId,
        day: NaiveDate,
    ) -> RepoResult<BTreeSet<PersonId>>;

    /// Returns every attendance record of `event_id`, confirmed or not.
    fn event_attendance(&self, event_id: EventId) -> RepoResult<Vec<Attendance>>;
}

/// Repository interface for identities and attendance.
pub trait PersonRepository {
    /// Persists one person.
    fn create_person(&self, person: &Person) -> RepoResult<()>;
    /// Loads one person by id.
    fn get_person(&self, person_id: PersonId) -> RepoResult<Option<Person>>;
    /// Lists all people sorted by display name.
    fn list_people(&self) -> RepoResult<Vec<Person>>;
    /// Inserts or replaces attendance for (person, event).
    fn record_attendance(&self, attendance: &Attendance) -> RepoResult<()>;
}

/// SQLite-backed people/attendance repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["people", "attendance"])?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO people (uuid, display_name) VALUES (?1, ?2);",
            params![person.id.to_string(), person.display_name.as_str()],
        )?;
        Ok(())
    }

    fn get_person(&self, person_id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, display_name FROM people WHERE uuid = ?1;")?;
        let mut rows = stmt.query([person_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn list_people(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, display_name
             FROM people
             ORDER BY display_name COLLATE NOCASE ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }

    fn record_attendance(&self, attendance: &Attendance) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO attendance (person_uuid, event_uuid, arrival_day, departure_day)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (person_uuid, event_uuid) DO UPDATE
             SET arrival_day = excluded.arrival_day,
                 departure_day = excluded.departure_day;",
            params![
                attendance.person_id.to_string(),
                attendance.event_id.to_string(),
                attendance.arrival_day,
                attendance.departure_day,
            ],
        )?;
        Ok(())
    }
}

impl AttendanceSource for SqlitePersonRepository<'_> {
    fn attendees_present_on(
        &self,
        event_id: EventId,
        day: NaiveDate,
    ) -> RepoResult<BTreeSet<PersonId>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_uuid
             FROM attendance
             WHERE event_uuid = ?1
               AND arrival_day IS NOT NULL
               AND departure_day IS NOT NULL
               AND arrival_day <= ?2
               AND departure_day >= ?2;",
        )?;
        let mut rows = stmt.query(params![event_id.to_string(), day])?;
        let mut present = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            present.insert(parse_uuid(&value, "attendance.person_uuid")?);
        }
        Ok(present)
    }

    fn event_attendance(&self, event_id: EventId) -> RepoResult<Vec<Attendance>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_uuid, event_uuid, arrival_day, departure_day
             FROM attendance
             WHERE event_uuid = ?1
             ORDER BY person_uuid ASC;",
        )?;
        let mut rows = stmt.query([event_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Person {
        id: parse_uuid(&uuid_text, "people.uuid")?,
        display_name: row.get("display_name")?,
    })
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<Attendance> {
    let person_text: String = row.get("person_uuid")?;
    let event_text: String = row.get("event_uuid")?;
    Ok(Attendance {
        person_id: parse_uuid(&person_text, "attendance.person_uuid")?,
        event_id: parse_uuid(&event_text, "attendance.event_uuid")?,
        arrival_day: row.get("arrival_day")?,
        departure_day: row.get("departure_day")?,
    })
}
