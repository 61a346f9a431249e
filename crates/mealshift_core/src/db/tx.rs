//! Retrying write-transaction runner.
//!
//! # Responsibility
//! - Run one logical write operation inside `BEGIN IMMEDIATE ... COMMIT`.
//! - Retry the whole operation when the writer lock cannot be acquired.
//!
//! # Invariants
//! - The body sees either a fresh transaction per attempt or nothing at all;
//!   a failed attempt is rolled back before the next one starts.
//! - Only lock contention is retried; every other error returns immediately.

use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Error types that can tell lock contention apart from real failures.
pub trait BusyAware {
    fn is_busy(&self) -> bool;
}

impl BusyAware for rusqlite::Error {
    fn is_busy(&self) -> bool {
        super::is_busy_error(self)
    }
}

/// Outcome of a retried transaction that never got to commit.
#[derive(Debug)]
pub enum TxError<E> {
    /// The body (or begin/commit) failed with a non-contention error.
    Failed(E),
    /// Every attempt hit lock contention.
    Exhausted { attempts: u32, last: E },
}

/// Runs `body` in an immediate transaction, retrying on lock contention.
///
/// `op` names the operation in diagnostics. `max_attempts` of zero is treated
/// as one.
pub fn run_immediate<T, E, F>(
    conn: &Connection,
    max_attempts: u32,
    op: &'static str,
    mut body: F,
) -> Result<T, TxError<E>>
where
    E: From<rusqlite::Error> + BusyAware,
    F: FnMut(&Transaction<'_>) -> Result<T, E>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match attempt_once(conn, &mut body) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_busy() => {
                if attempt >= max_attempts {
                    warn!(
                        "event=tx_retry module=db status=exhausted op={} attempts={}",
                        op, attempt
                    );
                    return Err(TxError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
                warn!(
                    "event=tx_retry module=db status=retry op={} attempt={}",
                    op, attempt
                );
                attempt += 1;
            }
            Err(err) => return Err(TxError::Failed(err)),
        }
    }
}

fn attempt_once<T, E, F>(conn: &Connection, body: &mut F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnMut(&Transaction<'_>) -> Result<T, E>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = body(&tx)?;
    tx.commit()?;
    Ok(value)
}
