//! Error types for store operations.
//!
//! One unified error type covers the taxonomy the store exposes: fatal
//! schema failures, best-effort migration failures, uniqueness violations
//! on minted identifiers, typed not-found results, and snapshot I/O.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failure not covered by a more specific variant.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Base schema creation failure. Fatal: the application cannot start.
    #[error("schema error: {0}")]
    Schema(String),

    /// Migration pass failure outside the best-effort statement handling.
    #[error("migration error: {0}")]
    Migration(String),

    /// Uniqueness violation on a minted identifier (serial, quote or
    /// contract number). The caller must not retry with the same value.
    #[error("duplicate {kind} identifier: {identifier}")]
    DuplicateIdentifier { kind: &'static str, identifier: String },

    /// The referenced row does not exist (e.g. a certificate for a
    /// deleted tube).
    #[error("{entity} not found: id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Snapshot serialization or deserialization failure.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The snapshot carries a format version this build does not know.
    #[error("unsupported snapshot format version: {0}")]
    SnapshotVersion(u32),

    /// Filesystem failure around the data directory or snapshot files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Maps a constraint-violation insert error to [`DuplicateIdentifier`],
    /// passing every other error through unchanged.
    ///
    /// [`DuplicateIdentifier`]: StoreError::DuplicateIdentifier
    pub(crate) fn on_unique<'a>(kind: &'static str, identifier: &'a str) -> impl FnOnce(rusqlite::Error) -> StoreError + 'a {
        move |e| match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => StoreError::DuplicateIdentifier {
                kind,
                identifier: identifier.to_string(),
            },
            _ => StoreError::Database(e),
        }
    }

    /// Shorthand for a typed not-found result.
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
