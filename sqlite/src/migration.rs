//! Versioned, additive schema migrations.
//!
//! Evolves an existing database file to the current shape without data
//! loss. Steps form a fixed, ordered list; each applied step records its
//! version in the `schema_version` table, so a second pass over the same
//! file finds nothing to do. Databases created fresh by
//! [`crate::schema::ensure_base_schema`] are stamped at the latest
//! version and never see these steps.
//!
//! # Failure semantics
//!
//! Additive steps run statement by statement; an individual failure (for
//! example a column already present in a hand-migrated legacy file) is
//! logged and skipped, and startup continues. The one structural step,
//! relaxing the uniqueness constraint on certificate numbers, is
//! all-or-nothing inside a transaction and leaves its version unrecorded
//! on failure so it is retried on the next start.

use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::schema::{REPORTS_TABLE_DDL, certificates_table_ddl, table_exists};

/// An ordered migration unit.
struct Step {
    version: i64,
    name: &'static str,
    kind: StepKind,
}

enum StepKind {
    /// Additive statements, executed individually and best-effort.
    Statements(&'static [&'static str]),
    /// The certificate uniqueness-constraint relaxation; the only step
    /// permitted to rebuild a table.
    RebuildCertificates,
}

/// The fixed migration sequence. Later steps may depend on columns added
/// by earlier ones, so the order is part of the contract.
const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "settings-company-fields",
        kind: StepKind::Statements(&[
            "ALTER TABLE settings ADD COLUMN tax_office TEXT;",
            "ALTER TABLE settings ADD COLUMN bank_name TEXT;",
            "ALTER TABLE settings ADD COLUMN iban TEXT;",
            "ALTER TABLE settings ADD COLUMN logo_path TEXT;",
        ]),
    },
    Step {
        version: 2,
        name: "quotes-validity-notes",
        kind: StepKind::Statements(&[
            "ALTER TABLE quotes ADD COLUMN valid_until TEXT;",
            "ALTER TABLE quotes ADD COLUMN notes TEXT;",
        ]),
    },
    Step {
        version: 3,
        name: "prices-fill-components",
        kind: StepKind::Statements(&[
            "ALTER TABLE prices ADD COLUMN refill_price REAL;",
            "ALTER TABLE prices ADD COLUMN valve_price REAL;",
            "ALTER TABLE prices ADD COLUMN hose_price REAL;",
            "ALTER TABLE prices ADD COLUMN gauge_price REAL;",
        ]),
    },
    Step {
        version: 4,
        name: "certificates-drop-unique-number",
        kind: StepKind::RebuildCertificates,
    },
    Step {
        version: 5,
        name: "quotes-currency",
        kind: StepKind::Statements(&[
            "ALTER TABLE quotes ADD COLUMN currency TEXT NOT NULL DEFAULT 'TRY';",
        ]),
    },
    Step {
        version: 6,
        name: "tubes-field-inspection",
        kind: StepKind::Statements(&[
            "ALTER TABLE tubes ADD COLUMN location TEXT;",
            "ALTER TABLE tubes ADD COLUMN field_status TEXT;",
            "ALTER TABLE tubes ADD COLUMN field_note TEXT;",
            "ALTER TABLE tubes ADD COLUMN last_checked TEXT;",
        ]),
    },
    Step {
        version: 7,
        name: "reports-table",
        kind: StepKind::Statements(&[REPORTS_TABLE_DDL]),
    },
];

/// Outcome of a migration pass.
///
/// A second pass over the same database yields an empty report.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Names of the steps applied in this pass, in order.
    pub applied: Vec<&'static str>,
    /// Additive statements that failed and were skipped.
    pub skipped_statements: usize,
}

/// Runs every unapplied step in order.
///
/// Never fails for an individual additive statement; see the module
/// docs for the exact semantics.
pub(crate) fn migrate(conn: &mut Connection) -> Result<MigrationReport> {
    let applied_versions = applied_versions(conn)?;
    let mut report = MigrationReport::default();

    for step in STEPS {
        if applied_versions.contains(&step.version) {
            continue;
        }
        match &step.kind {
            StepKind::Statements(statements) => {
                for sql in *statements {
                    if let Err(e) = conn.execute_batch(sql) {
                        warn!(step = step.name, error = %e, "migration statement skipped");
                        report.skipped_statements += 1;
                    }
                }
                record_version(conn, step.version)?;
                info!(step = step.name, version = step.version, "migration applied");
                report.applied.push(step.name);
            }
            StepKind::RebuildCertificates => match rebuild_certificates(conn) {
                Ok(rebuilt) => {
                    record_version(conn, step.version)?;
                    if rebuilt {
                        info!(step = step.name, "certificate number constraint relaxed");
                    }
                    report.applied.push(step.name);
                }
                // Version stays unrecorded; the rebuild is retried on the
                // next startup.
                Err(e) => {
                    warn!(step = step.name, error = %e, "table rebuild failed, will retry");
                    report.skipped_statements += 1;
                }
            },
        }
    }

    Ok(report)
}

/// Stamps every known version, used when the base schema is created from
/// scratch at the current shape.
pub(crate) fn stamp_all(conn: &Connection) -> Result<()> {
    for step in STEPS {
        record_version(conn, step.version)?;
    }
    Ok(())
}

/// Highest recorded schema version, 0 for a legacy file without markers.
pub(crate) fn current_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn applied_versions(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_version ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(versions)
}

fn record_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Relaxes the uniqueness constraint on `certificates.number`.
///
/// Earlier releases declared the number column `UNIQUE`, which broke
/// re-certifying a tube. SQLite cannot drop a table constraint in place,
/// so this copies all rows out, recreates the table from the current
/// definition, and copies them back, the whole unit inside one
/// transaction. When the constraint is already absent the step is a
/// no-op.
///
/// Only columns shared between the old and current shape are carried
/// over; anything the legacy table lacked takes the current defaults.
///
/// Returns `true` when a rebuild actually happened.
fn rebuild_certificates(conn: &mut Connection) -> Result<bool> {
    if !table_exists(conn, "certificates")? {
        // Pre-certificate database; the base schema pass creates the
        // current shape.
        return Ok(false);
    }

    let table_sql: String = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'certificates'",
        [],
        |row| row.get(0),
    )?;
    if !table_sql.to_uppercase().contains("UNIQUE") {
        return Ok(false);
    }

    let current_columns: Vec<String> = certificate_columns();
    let existing_columns = table_columns(conn, "certificates")?;
    let shared: Vec<&str> = current_columns
        .iter()
        .map(String::as_str)
        .filter(|c| existing_columns.iter().any(|e| e == c))
        .collect();
    if shared.is_empty() {
        return Err(StoreError::Migration(
            "legacy certificates table shares no columns with the current shape".into(),
        ));
    }
    let column_list = shared.join(", ");

    let tx = conn.transaction()?;
    tx.execute_batch(&certificates_table_ddl("certificates_migrating"))?;
    tx.execute(
        &format!(
            "INSERT INTO certificates_migrating ({column_list}) \
             SELECT {column_list} FROM certificates"
        ),
        [],
    )?;
    tx.execute_batch(
        "DROP TABLE certificates;
         ALTER TABLE certificates_migrating RENAME TO certificates;
         CREATE INDEX IF NOT EXISTS idx_certificates_tube ON certificates(tube_id);
         CREATE INDEX IF NOT EXISTS idx_certificates_customer ON certificates(customer_id);",
    )?;
    tx.commit()?;
    Ok(true)
}

/// Column names of the current certificate shape, in declaration order.
fn certificate_columns() -> Vec<String> {
    vec![
        "id".into(),
        "tube_id".into(),
        "customer_id".into(),
        "number".into(),
        "issue_date".into(),
        "issuer".into(),
        "pdf_path".into(),
        "vessel_name".into(),
        "imo_number".into(),
        "created_at".into(),
    ]
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_base_schema;

    /// Builds a database shaped like a legacy release: no version
    /// markers, certificate numbers still UNIQUE, none of the later
    /// columns present.
    fn legacy_database() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE schema_version (
                 version INTEGER PRIMARY KEY,
                 applied_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             CREATE TABLE customers (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL,
                 contact_name TEXT, phone TEXT, email TEXT, address TEXT, notes TEXT,
                 status TEXT NOT NULL DEFAULT 'active',
                 created_at TEXT NOT NULL DEFAULT (datetime('now')),
                 updated_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             CREATE TABLE tubes (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 customer_id INTEGER NOT NULL,
                 type_code TEXT NOT NULL,
                 weight_kg REAL,
                 serial TEXT NOT NULL UNIQUE,
                 year INTEGER NOT NULL,
                 seq_no INTEGER NOT NULL,
                 fill_date TEXT, expiry_date TEXT, qr_path TEXT,
                 created_at TEXT NOT NULL DEFAULT (datetime('now')),
                 FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
             );
             CREATE TABLE certificates (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 tube_id INTEGER NOT NULL,
                 customer_id INTEGER NOT NULL,
                 number TEXT NOT NULL UNIQUE,
                 issue_date TEXT NOT NULL,
                 issuer TEXT,
                 created_at TEXT NOT NULL DEFAULT (datetime('now')),
                 FOREIGN KEY (tube_id) REFERENCES tubes(id) ON DELETE CASCADE,
                 FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
             );
             CREATE TABLE prices (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 type_code TEXT NOT NULL,
                 weight_kg REAL,
                 category TEXT NOT NULL,
                 unit_price REAL NOT NULL
             );
             CREATE TABLE quotes (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 customer_id INTEGER NOT NULL,
                 number TEXT NOT NULL UNIQUE,
                 status TEXT NOT NULL DEFAULT 'draft',
                 subtotal REAL NOT NULL DEFAULT 0,
                 tax_rate REAL NOT NULL DEFAULT 0,
                 tax_amount REAL NOT NULL DEFAULT 0,
                 total REAL NOT NULL DEFAULT 0,
                 created_at TEXT NOT NULL DEFAULT (datetime('now')),
                 updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                 FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
             );
             CREATE TABLE settings (
                 id INTEGER PRIMARY KEY CHECK (id = 1),
                 company_name TEXT NOT NULL DEFAULT '',
                 phone TEXT, email TEXT, address TEXT, tax_number TEXT,
                 default_tax_rate REAL NOT NULL DEFAULT 20.0
             );",
        )
        .unwrap();
        conn
    }

    fn has_column(conn: &Connection, table: &str, column: &str) -> bool {
        table_columns(conn, table).unwrap().iter().any(|c| c == column)
    }

    #[test]
    fn migrates_legacy_database_in_order() {
        let mut conn = legacy_database();
        let report = migrate(&mut conn).unwrap();

        assert_eq!(report.applied.len(), STEPS.len());
        assert_eq!(report.applied[0], "settings-company-fields");
        assert_eq!(report.applied[3], "certificates-drop-unique-number");
        assert_eq!(report.skipped_statements, 0);

        assert!(has_column(&conn, "settings", "iban"));
        assert!(has_column(&conn, "quotes", "currency"));
        assert!(has_column(&conn, "tubes", "field_status"));
        assert!(table_exists(&conn, "reports").unwrap());
        assert_eq!(current_version(&conn).unwrap(), 7);
    }

    #[test]
    fn second_pass_is_empty() {
        let mut conn = legacy_database();
        migrate(&mut conn).unwrap();
        let second = migrate(&mut conn).unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped_statements, 0);
    }

    #[test]
    fn fresh_database_needs_no_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_base_schema(&mut conn).unwrap();
        let report = migrate(&mut conn).unwrap();
        assert!(report.applied.is_empty());
    }

    #[test]
    fn certificate_rebuild_preserves_rows_and_relaxes_constraint() {
        let mut conn = legacy_database();
        conn.execute_batch(
            "INSERT INTO customers (name) VALUES ('Liman Denizcilik');
             INSERT INTO tubes (customer_id, type_code, serial, year, seq_no)
                 VALUES (1, 'KKT', '2024-0001', 2024, 1);
             INSERT INTO certificates (tube_id, customer_id, number, issue_date, issuer)
                 VALUES (1, 1, 'CERT-2024-00001', '2024-03-01', 'A. Demir');
             INSERT INTO certificates (tube_id, customer_id, number, issue_date, issuer)
                 VALUES (1, 1, 'CERT-2024-00002', '2024-06-01', 'A. Demir');
             INSERT INTO certificates (tube_id, customer_id, number, issue_date, issuer)
                 VALUES (1, 1, 'CERT-2024-00003', '2024-09-01', 'B. Kaya');",
        )
        .unwrap();

        migrate(&mut conn).unwrap();

        let rows: Vec<(String, String, Option<String>)> = conn
            .prepare("SELECT number, issue_date, issuer FROM certificates ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, "CERT-2024-00001");
        assert_eq!(rows[2].2.as_deref(), Some("B. Kaya"));

        // The relaxation is the point: a duplicate number must now insert.
        conn.execute(
            "INSERT INTO certificates (tube_id, customer_id, number, issue_date)
             VALUES (1, 1, 'CERT-2024-00001', '2024-12-01')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn rebuild_skips_when_constraint_already_absent() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_base_schema(&mut conn).unwrap();
        assert!(!rebuild_certificates(&mut conn).unwrap());
    }

    #[test]
    fn duplicate_columns_are_skipped_not_fatal() {
        let mut conn = legacy_database();
        // Simulate a hand-migrated file that already has one of the v6
        // columns.
        conn.execute_batch("ALTER TABLE tubes ADD COLUMN location TEXT;")
            .unwrap();

        let report = migrate(&mut conn).unwrap();
        assert_eq!(report.skipped_statements, 1);
        assert!(report.applied.contains(&"tubes-field-inspection"));
        assert!(has_column(&conn, "tubes", "field_note"));
    }
}
