//! Shift reconciliation and assignment engine for volunteer meal staffing.
//! This crate is the single source of truth for staffing invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, EngineConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_config, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventId, Meal, MealId, MealKind};
pub use model::person::{Attendance, DayCounts, Person, PersonId};
pub use model::requirements::{RequirementsValidationError, RoleRequirements};
pub use model::shift::{Role, Shift, ShiftId, ShiftState};
pub use repo::person_repo::{AttendanceSource, SqlitePersonRepository};
pub use repo::{RepoError, RepoResult};
pub use service::assignment_service::{AssignmentService, ChefState, ShiftClaim};
pub use service::error::{ForbiddenReason, StaffingError};
pub use service::event_service::{EventService, EventSetupRequest};
pub use service::reconciler::{
    creation_stamp, plan_reconciliation, ReconcileOutcome, ReconcilePlan,
};
pub use service::requirement_service::{RequirementService, RequirementsUpdate};
pub use service::staffing_view::{
    CalendarDay, CalendarWeek, MealSummary, PersonRef, RolePositions, ShiftView,
    StaffingCalendar, StaffingViewBuilder,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
