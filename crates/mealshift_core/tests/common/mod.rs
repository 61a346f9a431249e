#![allow(dead_code)]

use chrono::NaiveDate;
use mealshift_core::{
    open_db_in_memory, EngineConfig, Event, EventService, EventSetupRequest, Meal, MealKind,
    Person,
};
use rusqlite::Connection;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory database with one three-day event starting Wednesday 2026-07-01.
pub fn seeded() -> (Connection, Event) {
    let conn = open_db_in_memory().unwrap();
    let event = seed_event(&conn);
    (conn, event)
}

pub fn seed_event(conn: &Connection) -> Event {
    EventService::new(conn, EngineConfig::default())
        .setup_event(&EventSetupRequest {
            name_prefix: "Camp".to_string(),
            start_date: date(2026, 7, 1),
            num_days: 3,
            overwrite: false,
        })
        .unwrap()
}

pub fn person(conn: &Connection, name: &str) -> Person {
    EventService::new(conn, EngineConfig::default())
        .add_person(name)
        .unwrap()
}

pub fn first_meal(conn: &Connection, event: &Event, kind: MealKind) -> Meal {
    EventService::new(conn, EngineConfig::default())
        .list_meals(event.id)
        .unwrap()
        .into_iter()
        .find(|meal| meal.kind == kind)
        .unwrap()
}
