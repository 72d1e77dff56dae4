//! The store handle.
//!
//! [`Store`] owns the single process-wide connection for the lifetime of
//! the application: opened once at startup, passed to every consumer,
//! closed at shutdown. There is no implicit global. The embedded file is
//! opened with WAL journaling, enforced foreign keys, and a busy
//! timeout; all repository operations hang off this handle.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::migration::{self, MigrationReport};
use crate::schema;
use crate::sequence;
use tubeledger_core::{MintedSerial, SequenceKind};

/// File name of the embedded database inside the data directory.
pub const DB_FILE: &str = "tubeledger.db";

/// Artifact directories created next to the database file. Entity rows
/// reference generated files (QR codes, certificate and quote PDFs,
/// backups) by path inside these.
pub const ARTIFACT_DIRS: &[&str] = &["qr", "backups", "certificates", "quotes"];

/// Handle to the embedded store and its data directory.
///
/// # Examples
///
/// ```no_run
/// use tubeledger_sqlite::Store;
///
/// let mut store = Store::init("/var/lib/tubeledger").unwrap();
/// let customers = store.list_customers(&Default::default()).unwrap();
/// println!("{} customers", customers.len());
/// ```
pub struct Store {
    pub(crate) conn: Connection,
    data_dir: PathBuf,
}

impl Store {
    /// Opens (or creates) the database file under `data_dir` and lays out
    /// the artifact directories. Does not touch the schema; call
    /// [`ensure_schema`](Self::ensure_schema) and
    /// [`migrate`](Self::migrate), or use [`init`](Self::init).
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        for dir in ARTIFACT_DIRS {
            fs::create_dir_all(data_dir.join(dir))?;
        }

        let db_path = data_dir.join(DB_FILE);
        let conn = Connection::open(&db_path)?;
        configure(&conn)?;
        info!(path = %db_path.display(), "store opened");

        Ok(Self { conn, data_dir })
    }

    /// Opens an in-memory store, for tests and ephemeral use. No artifact
    /// directories are created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        Ok(Self {
            conn,
            data_dir: PathBuf::new(),
        })
    }

    /// Opens the store and brings the schema fully up to date: base
    /// schema, then the migration pass. The standard startup path.
    pub fn init(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::open(data_dir)?;
        store.ensure_schema()?;
        store.migrate()?;
        Ok(store)
    }

    /// Creates all tables and indexes if absent and seeds the settings
    /// singleton. Fatal on any DDL error.
    ///
    /// Returns `true` when the database was created from scratch.
    pub fn ensure_schema(&mut self) -> Result<bool> {
        schema::ensure_base_schema(&mut self.conn)
    }

    /// Runs the versioned migration pass. Best-effort per additive
    /// statement; never blocks startup for an individual failure.
    pub fn migrate(&mut self) -> Result<MigrationReport> {
        migration::migrate(&mut self.conn)
    }

    /// Issues the next identifier of `kind` for the current calendar
    /// year, in its own transaction.
    ///
    /// Entity creation does not go through here; `create_tube` and
    /// friends mint inside the same transaction as their insert.
    pub fn next_serial(&mut self, kind: SequenceKind) -> Result<MintedSerial> {
        let year = current_year();
        let tx = self.conn.transaction()?;
        let minted = sequence::next_in_tx(&tx, kind, year)?;
        tx.commit()?;
        Ok(minted)
    }

    /// Current counter value for `kind` in the current calendar year,
    /// without issuing. For display ("next serial will be ...") only.
    pub fn peek_serial(&self, kind: SequenceKind) -> Result<i64> {
        sequence::peek(&self.conn, kind, current_year())
    }

    /// Row counts and schema version, for the admin surface.
    pub fn status(&self) -> Result<StoreStatus> {
        Ok(StoreStatus {
            schema_version: migration::current_version(&self.conn)?,
            customers: self.count_rows("customers")?,
            tubes: self.count_rows("tubes")?,
            certificates: self.count_rows("certificates")?,
            quotes: self.count_rows("quotes")?,
            contracts: self.count_rows("contracts")?,
        })
    }

    /// The data directory this store was opened under. Empty for an
    /// in-memory store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Consumes the store and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

/// Snapshot of the store for `tubeledger status`.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub schema_version: i64,
    pub customers: usize,
    pub tubes: usize,
    pub certificates: usize,
    pub quotes: usize,
    pub contracts: usize,
}

/// Wall-clock calendar year, the scope for minted identifiers.
pub(crate) fn current_year() -> i32 {
    Local::now().year()
}

/// Wall-clock date for operations that default to "today".
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_lays_out_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();

        assert!(dir.path().join(DB_FILE).exists());
        for sub in ARTIFACT_DIRS {
            assert!(dir.path().join(sub).is_dir(), "missing {sub}/");
        }
        assert_eq!(store.status().unwrap().customers, 0);
    }

    #[test]
    fn reopening_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = Store::init(dir.path()).unwrap();
            store
                .create_customer(&tubeledger_core::NewCustomer::named("Ege Yangin"))
                .unwrap();
        }
        let store = Store::init(dir.path()).unwrap();
        assert_eq!(store.status().unwrap().customers, 1);
    }

    #[test]
    fn next_serial_commits_on_its_own() {
        let mut store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        let first = store.next_serial(SequenceKind::Tube).unwrap();
        let second = store.next_serial(SequenceKind::Tube).unwrap();
        assert_eq!(second.number, first.number + 1);
        assert_eq!(first.year, current_year());
    }
}
