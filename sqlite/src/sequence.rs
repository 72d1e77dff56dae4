//! Year-scoped counter persistence.
//!
//! Backs [`SequenceKind`] with the `counters` table. The increment is a
//! single conditional `UPDATE ... RETURNING`, so a value can never be
//! issued twice even if a future version relaxes the single-writer
//! assumption. Callers compose [`next_in_tx`] with the insert of the
//! owning entity inside one transaction; a crash in between skips a
//! value (tolerated) but never repeats one.

use rusqlite::{Connection, params};
use tubeledger_core::{Counter, MintedSerial, SequenceKind};

use crate::error::Result;

/// Issues the next identifier for `(kind, year)` on the given connection.
///
/// Inserts the zero row on first use of a `(kind, year)` pair, then
/// increments and reads back in one statement. The caller owns the
/// surrounding transaction.
pub(crate) fn next_in_tx(conn: &Connection, kind: SequenceKind, year: i32) -> Result<MintedSerial> {
    conn.execute(
        "INSERT OR IGNORE INTO counters (kind, year, value) VALUES (?1, ?2, 0)",
        params![kind.as_str(), year],
    )?;
    let number: i64 = conn.query_row(
        "UPDATE counters SET value = value + 1 WHERE kind = ?1 AND year = ?2 RETURNING value",
        params![kind.as_str(), year],
        |row| row.get(0),
    )?;
    Ok(MintedSerial {
        formatted: kind.format(year, number),
        year,
        number,
    })
}

/// Current counter value for `(kind, year)` without incrementing; 0 when
/// the pair has never issued.
pub(crate) fn peek(conn: &Connection, kind: SequenceKind, year: i32) -> Result<i64> {
    let value: i64 = conn.query_row(
        "SELECT COALESCE((SELECT value FROM counters WHERE kind = ?1 AND year = ?2), 0)",
        params![kind.as_str(), year],
        |row| row.get(0),
    )?;
    Ok(value)
}

/// All counter rows, for the logical snapshot.
pub(crate) fn all(conn: &Connection) -> Result<Vec<Counter>> {
    let mut stmt = conn.prepare("SELECT kind, year, value FROM counters ORDER BY kind, year")?;
    let counters = stmt
        .query_map([], |row| {
            Ok(Counter {
                kind: row.get(0)?,
                year: row.get(1)?,
                value: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(counters)
}
