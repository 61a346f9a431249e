//! Event setup and roster use-cases.
//!
//! # Responsibility
//! - Create an event with its breakfast/dinner meal grid.
//! - Register people and their planned attendance.
//!
//! # Invariants
//! - Event names are unique; replacing one requires an explicit overwrite.
//! - Every event day owns exactly one meal per `MealKind`.

use crate::config::EngineConfig;
use crate::db::tx::run_immediate;
use crate::model::event::{Event, EventId, Meal, MealKind};
use crate::model::person::{Attendance, Person, PersonId};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::service::error::StaffingError;
use chrono::{Datelike, NaiveDate};
use log::info;
use rusqlite::Connection;
use uuid::Uuid;

/// Input for creating an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSetupRequest {
    /// Name stem; the start year is appended.
    pub name_prefix: String,
    pub start_date: NaiveDate,
    pub num_days: u32,
    /// Replace an existing event with the same name.
    pub overwrite: bool,
}

impl EventSetupRequest {
    /// Full event name, e.g. `Camp 2026`.
    pub fn event_name(&self) -> String {
        format!("{} {}", self.name_prefix.trim(), self.start_date.year())
    }
}

/// Event and roster facade over one connection.
pub struct EventService<'conn> {
    conn: &'conn Connection,
    config: EngineConfig,
}

impl<'conn> EventService<'conn> {
    pub fn new(conn: &'conn Connection, config: EngineConfig) -> Self {
        Self { conn, config }
    }

    /// Creates an event and one meal per day and kind.
    ///
    /// # Errors
    /// - `InvalidEventRange` for zero days or a range past the calendar end.
    /// - `EventExists` when the name is taken and `overwrite` is false.
    pub fn setup_event(&self, request: &EventSetupRequest) -> Result<Event, StaffingError> {
        let end_date = Event::end_for(request.start_date, request.num_days).ok_or(
            StaffingError::InvalidEventRange {
                start_date: request.start_date,
                num_days: request.num_days,
            },
        )?;
        let name = request.event_name();

        let (event, replaced) = run_immediate(
            self.conn,
            self.config.max_tx_attempts,
            "setup_event",
            |tx| -> Result<(Event, bool), StaffingError> {
                let events = SqliteEventRepository::try_new(tx)?;

                let replaced = match events.find_event_by_name(&name)? {
                    Some(_) if !request.overwrite => {
                        return Err(StaffingError::EventExists(name.clone()));
                    }
                    Some(existing) => {
                        events.delete_event(existing.id)?;
                        true
                    }
                    None => false,
                };

                let event = Event {
                    id: Uuid::new_v4(),
                    name: name.clone(),
                    start_date: request.start_date,
                    end_date,
                };
                events.create_event(&event)?;
                for day in event.days() {
                    for kind in MealKind::ALL {
                        events.create_meal(&Meal::new(event.id, day, kind))?;
                    }
                }
                Ok((event, replaced))
            },
        )
        .map_err(|err| StaffingError::from_tx("setup_event", err))?;

        info!(
            "event=event_setup module=events status=ok event_id={} days={} replaced={}",
            event.id, request.num_days, replaced
        );
        Ok(event)
    }

    /// Loads one event.
    pub fn get_event(&self, event_id: EventId) -> Result<Event, StaffingError> {
        let events = SqliteEventRepository::try_new(self.conn)?;
        events
            .get_event(event_id)?
            .ok_or(StaffingError::EventNotFound(event_id))
    }

    /// Loads the event with the latest start date, if any exists.
    pub fn latest_event(&self) -> Result<Option<Event>, StaffingError> {
        let events = SqliteEventRepository::try_new(self.conn)?;
        Ok(events.latest_event()?)
    }

    /// Lists the meals of an event in serving order.
    pub fn list_meals(&self, event_id: EventId) -> Result<Vec<Meal>, StaffingError> {
        let events = SqliteEventRepository::try_new(self.conn)?;
        if events.get_event(event_id)?.is_none() {
            return Err(StaffingError::EventNotFound(event_id));
        }
        Ok(events.list_meals(event_id)?)
    }

    /// Registers a new identity.
    pub fn add_person(&self, display_name: &str) -> Result<Person, StaffingError> {
        let people = SqlitePersonRepository::try_new(self.conn)?;
        let person = Person::new(display_name.trim());
        people.create_person(&person)?;
        info!(
            "event=person_add module=events status=ok person_id={}",
            person.id
        );
        Ok(person)
    }

    /// Records (or replaces) when a person is on site for an event.
    pub fn record_attendance(
        &self,
        person_id: PersonId,
        event_id: EventId,
        arrival_day: Option<NaiveDate>,
        departure_day: Option<NaiveDate>,
    ) -> Result<Attendance, StaffingError> {
        let attendance = Attendance {
            person_id,
            event_id,
            arrival_day,
            departure_day,
        };

        run_immediate(
            self.conn,
            self.config.max_tx_attempts,
            "record_attendance",
            |tx| -> Result<(), StaffingError> {
                let events = SqliteEventRepository::try_new(tx)?;
                let people = SqlitePersonRepository::try_new(tx)?;
                if events.get_event(event_id)?.is_none() {
                    return Err(StaffingError::EventNotFound(event_id));
                }
                if people.get_person(person_id)?.is_none() {
                    return Err(StaffingError::PersonNotFound(person_id));
                }
                people.record_attendance(&attendance)?;
                Ok(())
            },
        )
        .map_err(|err| StaffingError::from_tx("record_attendance", err))?;

        Ok(attendance)
    }
}
