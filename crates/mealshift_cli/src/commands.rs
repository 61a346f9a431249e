//! CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mealshift_core::{
    default_log_level, init_logging, open_db_with_config, AssignmentService, EngineConfig, Event,
    EventId, EventService, EventSetupRequest, MealId, PersonId, RequirementService,
    RoleRequirements, ShiftId, SqlitePersonRepository, StaffingViewBuilder,
};
use rusqlite::Connection;

use crate::output::print_json;

/// mealshift - plan who cooks, preps and cleans at each meal of an event.
#[derive(Debug, Parser)]
#[command(name = "mealshift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "MEALSHIFT_DB", default_value = "mealshift.db")]
    db: PathBuf,

    /// JSON file with engine settings; defaults apply when omitted.
    #[arg(long, global = true, env = "MEALSHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true, env = "MEALSHIFT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files; logging is off when omitted.
    #[arg(long, global = true, env = "MEALSHIFT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an event with breakfast and dinner on every day.
    NewEvent {
        /// Name stem; the start year is appended.
        #[arg(long)]
        prefix: String,
        /// First day (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        days: u32,
        /// Replace an existing event with the same name.
        #[arg(long)]
        overwrite: bool,
    },

    /// Register a person.
    AddPerson {
        display_name: String,
    },

    /// Record when a person is on site.
    Attend {
        #[arg(long)]
        person: PersonId,
        /// Defaults to the latest event.
        #[arg(long)]
        event: Option<EventId>,
        #[arg(long)]
        arrival: Option<NaiveDate>,
        #[arg(long)]
        departure: Option<NaiveDate>,
    },

    /// Step up as chef of a meal, or step down.
    ToggleChef {
        #[arg(long)]
        meal: MealId,
        #[arg(long)]
        person: PersonId,
    },

    /// Claim an open shift, or release your own.
    ToggleShift {
        #[arg(long)]
        shift: ShiftId,
        #[arg(long)]
        person: PersonId,
    },

    /// Set the crew a meal needs (chef only).
    SetRequirements {
        #[arg(long)]
        meal: MealId,
        /// The meal's chef.
        #[arg(long)]
        person: PersonId,
        #[arg(long)]
        courier: bool,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        sous: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        kp: i64,
        #[arg(long, default_value = "")]
        public_notes: String,
        #[arg(long, default_value = "")]
        private_notes: String,
    },

    /// Show the requirement values currently in effect for a meal.
    Requirements {
        #[arg(long)]
        meal: MealId,
    },

    /// List meal summaries in serving order.
    Schedule {
        /// Defaults to the latest event.
        #[arg(long)]
        event: Option<EventId>,
    },

    /// Show the event as Sunday-first calendar weeks.
    Calendar {
        /// Defaults to the latest event.
        #[arg(long)]
        event: Option<EventId>,
    },
}

impl Cli {
    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        if let Some(log_dir) = self.log_dir.as_deref() {
            let level = self.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, log_dir).context("failed to start logging")?;
        }

        let conn = open_db_with_config(&self.db, &config)
            .with_context(|| format!("failed to open database `{}`", self.db.display()))?;

        match self.command {
            Commands::NewEvent {
                prefix,
                start,
                days,
                overwrite,
            } => {
                let request = EventSetupRequest {
                    name_prefix: prefix,
                    start_date: start,
                    num_days: days,
                    overwrite,
                };
                let event = EventService::new(&conn, config).setup_event(&request)?;
                print_json(&event)
            }
            Commands::AddPerson { display_name } => {
                let person = EventService::new(&conn, config).add_person(&display_name)?;
                print_json(&person)
            }
            Commands::Attend {
                person,
                event,
                arrival,
                departure,
            } => {
                let event = resolve_event(&conn, &config, event)?;
                let attendance = EventService::new(&conn, config)
                    .record_attendance(person, event.id, arrival, departure)?;
                print_json(&attendance)
            }
            Commands::ToggleChef { meal, person } => {
                let state = AssignmentService::new(&conn, config).toggle_chef(meal, person)?;
                print_json(&state)
            }
            Commands::ToggleShift { shift, person } => {
                let claim = AssignmentService::new(&conn, config).toggle_shift(shift, person)?;
                print_json(&claim)
            }
            Commands::SetRequirements {
                meal,
                person,
                courier,
                sous,
                kp,
                public_notes,
                private_notes,
            } => {
                let requirements =
                    RoleRequirements::new(courier, sous, kp, config.max_slots_per_role)?
                        .with_notes(public_notes, private_notes);
                let update = RequirementService::new(&conn, config).set_role_requirements(
                    meal,
                    person,
                    &requirements,
                )?;
                print_json(&update)
            }
            Commands::Requirements { meal } => {
                let requirements =
                    RequirementService::new(&conn, config).current_requirements(meal)?;
                print_json(&requirements)
            }
            Commands::Schedule { event } => {
                let event = resolve_event(&conn, &config, event)?;
                let attendance = SqlitePersonRepository::try_new(&conn)?;
                let schedule = StaffingViewBuilder::new(&conn, &attendance).meal_schedule(&event)?;
                print_json(&schedule)
            }
            Commands::Calendar { event } => {
                let event = resolve_event(&conn, &config, event)?;
                let attendance = SqlitePersonRepository::try_new(&conn)?;
                let calendar = StaffingViewBuilder::new(&conn, &attendance).calendar(&event)?;
                print_json(&calendar)
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config `{}`", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config `{}`", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn resolve_event(
    conn: &Connection,
    config: &EngineConfig,
    event_id: Option<EventId>,
) -> Result<Event> {
    let events = EventService::new(conn, config.clone());
    match event_id {
        Some(id) => Ok(events.get_event(id)?),
        None => events
            .latest_event()?
            .ok_or_else(|| anyhow!("no event exists yet; create one with `new-event`")),
    }
}
