//! Event and meal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist events and the meals they own.
//! - Own the single-field chef binding and meal notes.
//!
//! # Invariants
//! - Meal listing is deterministic: `day ASC`, breakfast before dinner.
//! - Deleting an event cascades to its meals, shifts and requirements.

use crate::model::event::{Event, EventId, Meal, MealId, MealKind};
use crate::model::person::PersonId;
use crate::repo::{
    ensure_connection_ready, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    start_date,
    end_date
FROM events";

const MEAL_SELECT_SQL: &str = "SELECT
    uuid,
    event_uuid,
    day,
    kind,
    chef_uuid,
    public_notes,
    private_notes
FROM meals";

const MEAL_ORDER_SQL: &str =
    "ORDER BY day ASC, CASE kind WHEN 'breakfast' THEN 0 ELSE 1 END ASC, uuid ASC";

/// Repository interface for events and meals.
pub trait EventRepository {
    /// Persists one event row.
    fn create_event(&self, event: &Event) -> RepoResult<()>;
    /// Persists one meal row under an existing event.
    fn create_meal(&self, meal: &Meal) -> RepoResult<()>;
    /// Loads one event by id.
    fn get_event(&self, event_id: EventId) -> RepoResult<Option<Event>>;
    /// Loads one event by its unique name.
    fn find_event_by_name(&self, name: &str) -> RepoResult<Option<Event>>;
    /// Loads the event with the latest start date.
    fn latest_event(&self) -> RepoResult<Option<Event>>;
    /// Deletes one event and everything it owns.
    fn delete_event(&self, event_id: EventId) -> RepoResult<()>;
    /// Lists meals of one event in serving order.
    fn list_meals(&self, event_id: EventId) -> RepoResult<Vec<Meal>>;
    /// Loads one meal by id.
    fn get_meal(&self, meal_id: MealId) -> RepoResult<Option<Meal>>;
    /// Replaces the chef binding of one meal.
    fn set_chef(&self, meal_id: MealId, chef: Option<PersonId>) -> RepoResult<()>;
    /// Replaces both notes fields of one meal.
    fn set_notes(&self, meal_id: MealId, public_notes: &str, private_notes: &str)
        -> RepoResult<()>;
}

/// SQLite-backed event/meal repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["events", "meals"])?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO events (uuid, name, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                event.id.to_string(),
                event.name.as_str(),
                event.start_date,
                event.end_date,
            ],
        )?;
        Ok(())
    }

    fn create_meal(&self, meal: &Meal) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO meals (
                uuid,
                event_uuid,
                day,
                kind,
                chef_uuid,
                public_notes,
                private_notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                meal.id.to_string(),
                meal.event_id.to_string(),
                meal.day,
                meal.kind.as_str(),
                meal.chef.map(|value| value.to_string()),
                meal.public_notes.as_str(),
                meal.private_notes.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_event(&self, event_id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([event_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }
        Ok(None)
    }

    fn find_event_by_name(&self, name: &str) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }
        Ok(None)
    }

    fn latest_event(&self) -> RepoResult<Option<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL} ORDER BY start_date DESC, created_at DESC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }
        Ok(None)
    }

    fn delete_event(&self, event_id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE uuid = ?1;", [event_id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "event",
                id: event_id,
            });
        }
        Ok(())
    }

    fn list_meals(&self, event_id: EventId) -> RepoResult<Vec<Meal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEAL_SELECT_SQL} WHERE event_uuid = ?1 {MEAL_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([event_id.to_string()])?;
        let mut meals = Vec::new();
        while let Some(row) = rows.next()? {
            meals.push(parse_meal_row(row)?);
        }
        Ok(meals)
    }

    fn get_meal(&self, meal_id: MealId) -> RepoResult<Option<Meal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEAL_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([meal_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meal_row(row)?));
        }
        Ok(None)
    }

    fn set_chef(&self, meal_id: MealId, chef: Option<PersonId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE meals SET chef_uuid = ?2 WHERE uuid = ?1;",
            params![meal_id.to_string(), chef.map(|value| value.to_string())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "meal",
                id: meal_id,
            });
        }
        Ok(())
    }

    fn set_notes(
        &self,
        meal_id: MealId,
        public_notes: &str,
        private_notes: &str,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE meals
             SET public_notes = ?2,
                 private_notes = ?3
             WHERE uuid = ?1;",
            params![meal_id.to_string(), public_notes, private_notes],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "meal",
                id: meal_id,
            });
        }
        Ok(())
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Event {
        id: parse_uuid(&uuid_text, "events.uuid")?,
        name: row.get("name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
    })
}

fn parse_meal_row(row: &Row<'_>) -> RepoResult<Meal> {
    let uuid_text: String = row.get("uuid")?;
    let event_text: String = row.get("event_uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = MealKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid meal kind `{kind_text}` in meals.kind"))
    })?;

    Ok(Meal {
        id: parse_uuid(&uuid_text, "meals.uuid")?,
        event_id: parse_uuid(&event_text, "meals.event_uuid")?,
        day: row.get("day")?,
        kind,
        chef: parse_optional_uuid(row.get("chef_uuid")?, "meals.chef_uuid")?,
        public_notes: row.get("public_notes")?,
        private_notes: row.get("private_notes")?,
    })
}
