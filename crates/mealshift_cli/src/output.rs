//! Output formatting for CLI commands.

use mealshift_core::StaffingError;
use serde::Serialize;

/// Prints one value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Prints an error chain on stderr, with a hint for recoverable staffing errors.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    if let Some(staffing) = err.downcast_ref::<StaffingError>() {
        if staffing.is_recoverable() {
            eprintln!("hint: reload the schedule and try again");
        }
    }
}
