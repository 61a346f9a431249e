//! Shift and role-requirement repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the role requirement store: desired counts per (meal, role).
//! - Provide row-level shift operations used by the reconciler and the
//!   assignment service.
//!
//! # Invariants
//! - Shift listing is ordered by creation: `created_at ASC, rowid ASC`.
//! - Only slot roles are accepted; `Role::Chef` is rejected before SQL.
//! - At most one claimed shift per (meal, worker), backed by a unique index.

use crate::model::event::MealId;
use crate::model::person::PersonId;
use crate::model::shift::{Role, Shift, ShiftId};
use crate::repo::{
    ensure_connection_ready, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const SHIFT_SELECT_SQL: &str = "SELECT
    uuid,
    meal_uuid,
    role,
    worker_uuid,
    created_at
FROM shifts";

const SHIFT_ORDER_SQL: &str = "ORDER BY created_at ASC, rowid ASC";

/// Repository interface for shift rows and requirement bookkeeping.
pub trait ShiftRepository {
    /// Lists shifts of one meal, optionally restricted to one role.
    fn list_shifts(&self, meal_id: MealId, role: Option<Role>) -> RepoResult<Vec<Shift>>;
    /// Loads one shift by id.
    fn get_shift(&self, shift_id: ShiftId) -> RepoResult<Option<Shift>>;
    /// Persists one new shift row.
    fn insert_shift(&self, shift: &Shift) -> RepoResult<()>;
    /// Deletes the given shifts and returns how many rows were removed.
    fn delete_shifts(&self, shift_ids: &[ShiftId]) -> RepoResult<usize>;
    /// Replaces the worker of one shift.
    fn set_worker(&self, shift_id: ShiftId, worker: Option<PersonId>) -> RepoResult<()>;
    /// Clears every shift on `meal_id` held by `worker`; returns released ids.
    fn release_worker_on_meal(
        &self,
        meal_id: MealId,
        worker: PersonId,
    ) -> RepoResult<Vec<ShiftId>>;
    /// Records the desired count for (meal, role).
    fn set_requirement(&self, meal_id: MealId, role: Role, desired_count: u32) -> RepoResult<()>;
    /// Loads the recorded desired count for (meal, role).
    fn get_requirement(&self, meal_id: MealId, role: Role) -> RepoResult<Option<u32>>;
}

/// SQLite-backed shift repository.
pub struct SqliteShiftRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShiftRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["meals", "shifts", "role_requirements"])?;
        Ok(Self { conn })
    }
}

impl ShiftRepository for SqliteShiftRepository<'_> {
    fn list_shifts(&self, meal_id: MealId, role: Option<Role>) -> RepoResult<Vec<Shift>> {
        let mut sql = format!("{SHIFT_SELECT_SQL} WHERE meal_uuid = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(meal_id.to_string())];

        if let Some(role) = role {
            sql.push_str(" AND role = ?");
            bind_values.push(Value::Text(slot_role_to_db(role)?.to_string()));
        }
        sql.push(' ');
        sql.push_str(SHIFT_ORDER_SQL);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut shifts = Vec::new();
        while let Some(row) = rows.next()? {
            shifts.push(parse_shift_row(row)?);
        }
        Ok(shifts)
    }

    fn get_shift(&self, shift_id: ShiftId) -> RepoResult<Option<Shift>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SHIFT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([shift_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_shift_row(row)?));
        }
        Ok(None)
    }

    fn insert_shift(&self, shift: &Shift) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO shifts (uuid, meal_uuid, role, worker_uuid, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                shift.id.to_string(),
                shift.meal_id.to_string(),
                slot_role_to_db(shift.role)?,
                shift.worker.map(|value| value.to_string()),
                shift.created_at,
            ],
        )?;
        Ok(())
    }

    fn delete_shifts(&self, shift_ids: &[ShiftId]) -> RepoResult<usize> {
        let mut removed = 0;
        for shift_id in shift_ids {
            removed += self
                .conn
                .execute("DELETE FROM shifts WHERE uuid = ?1;", [shift_id.to_string()])?;
        }
        Ok(removed)
    }

    fn set_worker(&self, shift_id: ShiftId, worker: Option<PersonId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE shifts SET worker_uuid = ?2 WHERE uuid = ?1;",
            params![shift_id.to_string(), worker.map(|value| value.to_string())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "shift",
                id: shift_id,
            });
        }
        Ok(())
    }

    fn release_worker_on_meal(
        &self,
        meal_id: MealId,
        worker: PersonId,
    ) -> RepoResult<Vec<ShiftId>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid
             FROM shifts
             WHERE meal_uuid = ?1
               AND worker_uuid = ?2
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query(params![meal_id.to_string(), worker.to_string()])?;
        let mut released = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            released.push(parse_uuid(&value, "shifts.uuid")?);
        }

        self.conn.execute(
            "UPDATE shifts
             SET worker_uuid = NULL
             WHERE meal_uuid = ?1
               AND worker_uuid = ?2;",
            params![meal_id.to_string(), worker.to_string()],
        )?;
        Ok(released)
    }

    fn set_requirement(&self, meal_id: MealId, role: Role, desired_count: u32) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO role_requirements (meal_uuid, role, desired_count, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT (meal_uuid, role) DO UPDATE
             SET desired_count = excluded.desired_count,
                 updated_at = excluded.updated_at;",
            params![meal_id.to_string(), slot_role_to_db(role)?, desired_count],
        )?;
        Ok(())
    }

    fn get_requirement(&self, meal_id: MealId, role: Role) -> RepoResult<Option<u32>> {
        let value = self
            .conn
            .query_row(
                "SELECT desired_count
                 FROM role_requirements
                 WHERE meal_uuid = ?1
                   AND role = ?2;",
                params![meal_id.to_string(), slot_role_to_db(role)?],
                |row| row.get::<_, u32>(0),
            )
            .optional()?;
        Ok(value)
    }
}

fn parse_shift_row(row: &Row<'_>) -> RepoResult<Shift> {
    let uuid_text: String = row.get("uuid")?;
    let meal_text: String = row.get("meal_uuid")?;

    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text)
        .filter(|role| role.is_slot_role())
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid shift role `{role_text}` in shifts.role"))
        })?;

    Ok(Shift {
        id: parse_uuid(&uuid_text, "shifts.uuid")?,
        meal_id: parse_uuid(&meal_text, "shifts.meal_uuid")?,
        role,
        worker: parse_optional_uuid(row.get("worker_uuid")?, "shifts.worker_uuid")?,
        created_at: row.get("created_at")?,
    })
}

fn slot_role_to_db(role: Role) -> RepoResult<&'static str> {
    if !role.is_slot_role() {
        return Err(RepoError::InvalidData(format!(
            "role `{}` is not backed by shift records",
            role.as_str()
        )));
    }
    Ok(role.as_str())
}
