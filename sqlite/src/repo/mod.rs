//! Typed CRUD and query operations over the entities.
//!
//! Each submodule owns one entity family and extends [`Store`] with its
//! operations plus the row-mapping helpers the snapshot module reuses.
//! Mutations that touch more than one row run inside a transaction;
//! identifier minting always shares the transaction of the owning
//! insert.

use rusqlite::Connection;

use crate::error::Result;

pub(crate) mod activity;
pub(crate) mod certificate;
pub(crate) mod contract;
pub(crate) mod customer;
pub(crate) mod price;
pub(crate) mod quote;
pub(crate) mod settings;
pub(crate) mod tube;

/// Maps a stored enum value that no variant matches to a rusqlite
/// conversion error, so row mappers stay `rusqlite::Result`.
pub(crate) fn bad_enum(index: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        format!("unknown enum value '{value}'").into(),
    )
}

/// Checks a customer row exists, shared by the owning-entity creates.
pub(crate) fn customer_exists(conn: &Connection, id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM customers WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Shared guard: typed not-found error when the customer is missing.
pub(crate) fn require_customer(conn: &Connection, id: i64) -> Result<()> {
    if customer_exists(conn, id)? {
        Ok(())
    } else {
        Err(crate::error::StoreError::not_found("customer", id))
    }
}
