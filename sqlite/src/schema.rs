//! Base schema definition.
//!
//! Generates the `CREATE TABLE` and `CREATE INDEX` statements for the
//! twelve business tables plus the `schema_version` marker table, and
//! brings a database file up from nothing. Everything here is
//! `IF NOT EXISTS`: this module only ever creates, it never alters.
//! Evolving an existing file is the migration engine's job.
//!
//! # Cascade layout
//!
//! A customer owns its tubes, quotes, call logs, and contracts directly,
//! and certificates both via the tube and via the snapshotted customer id;
//! all of those cascade on delete. Generic activity logs are detached
//! (`ON DELETE SET NULL`) so the audit trail outlives the customer.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::migration;

/// Current certificate table shape, parameterized by table name so the
/// constraint-relaxation rebuild can create its staging copy from the
/// same definition.
pub(crate) fn certificates_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tube_id INTEGER NOT NULL,
    customer_id INTEGER NOT NULL,
    number TEXT NOT NULL,
    issue_date TEXT NOT NULL,
    issuer TEXT,
    pdf_path TEXT,
    vessel_name TEXT,
    imo_number TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (tube_id) REFERENCES tubes(id) ON DELETE CASCADE,
    FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
);"
    )
}

/// Reports table, shared with the migration step that adds it to
/// pre-report databases.
pub(crate) const REPORTS_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

/// Generates the complete base schema.
pub(crate) fn base_schema_sql() -> String {
    let certificates = certificates_table_ddl("certificates");
    format!(
        r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    contact_name TEXT,
    phone TEXT,
    email TEXT,
    address TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tubes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL,
    type_code TEXT NOT NULL,
    weight_kg REAL,
    serial TEXT NOT NULL UNIQUE,
    year INTEGER NOT NULL,
    seq_no INTEGER NOT NULL,
    fill_date TEXT,
    expiry_date TEXT,
    qr_path TEXT,
    location TEXT,
    field_status TEXT,
    field_note TEXT,
    last_checked TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
);

{certificates}

CREATE TABLE IF NOT EXISTS prices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type_code TEXT NOT NULL,
    weight_kg REAL,
    category TEXT NOT NULL,
    unit_price REAL NOT NULL,
    refill_price REAL,
    valve_price REAL,
    hose_price REAL,
    gauge_price REAL
);

CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL,
    number TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'draft',
    subtotal REAL NOT NULL DEFAULT 0,
    tax_rate REAL NOT NULL DEFAULT 0,
    tax_amount REAL NOT NULL DEFAULT 0,
    total REAL NOT NULL DEFAULT 0,
    currency TEXT NOT NULL DEFAULT 'TRY',
    valid_until TEXT,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS quote_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    quote_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit_price REAL NOT NULL,
    line_total REAL NOT NULL,
    FOREIGN KEY (quote_id) REFERENCES quotes(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS contracts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    quote_id INTEGER REFERENCES quotes(id) ON DELETE SET NULL,
    customer_id INTEGER NOT NULL,
    number TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    starts_on TEXT NOT NULL,
    ends_on TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    company_name TEXT NOT NULL DEFAULT '',
    phone TEXT,
    email TEXT,
    address TEXT,
    tax_office TEXT,
    tax_number TEXT,
    bank_name TEXT,
    iban TEXT,
    default_tax_rate REAL NOT NULL DEFAULT 20.0,
    logo_path TEXT
);

CREATE TABLE IF NOT EXISTS call_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL,
    called_at TEXT NOT NULL DEFAULT (datetime('now')),
    subject TEXT NOT NULL,
    notes TEXT,
    FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER REFERENCES customers(id) ON DELETE SET NULL,
    action TEXT NOT NULL,
    detail TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

{REPORTS_TABLE_DDL}

CREATE TABLE IF NOT EXISTS counters (
    kind TEXT NOT NULL,
    year INTEGER NOT NULL,
    value INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (kind, year)
);

CREATE INDEX IF NOT EXISTS idx_tubes_customer ON tubes(customer_id);
CREATE INDEX IF NOT EXISTS idx_tubes_expiry ON tubes(expiry_date);
CREATE INDEX IF NOT EXISTS idx_certificates_tube ON certificates(tube_id);
CREATE INDEX IF NOT EXISTS idx_certificates_customer ON certificates(customer_id);
CREATE INDEX IF NOT EXISTS idx_quotes_customer ON quotes(customer_id);
CREATE INDEX IF NOT EXISTS idx_quote_items_quote ON quote_items(quote_id);
CREATE INDEX IF NOT EXISTS idx_contracts_customer ON contracts(customer_id);
CREATE INDEX IF NOT EXISTS idx_call_logs_customer ON call_logs(customer_id);
CREATE INDEX IF NOT EXISTS idx_logs_customer ON logs(customer_id);
"#
    )
}

/// Creates every table and index if absent and seeds the settings
/// singleton.
///
/// A freshly created database is stamped at the latest schema version so
/// the migration pass has nothing to do; an existing file keeps whatever
/// versions it has recorded and is evolved by [`crate::migration`].
///
/// Returns `true` when the database was created from scratch.
///
/// # Errors
///
/// Any DDL failure here is fatal and surfaces as [`StoreError::Schema`];
/// the application cannot run without its base schema.
pub(crate) fn ensure_base_schema(conn: &mut Connection) -> Result<bool> {
    let fresh = !table_exists(conn, "customers")?;

    let tx = conn.transaction()?;
    tx.execute_batch(&base_schema_sql())
        .map_err(|e| StoreError::Schema(format!("failed to create base schema: {e}")))?;

    if fresh {
        migration::stamp_all(&tx)?;
    }

    // Settings singleton: fixed id 1, defaults from the column definitions.
    tx.execute("INSERT OR IGNORE INTO settings (id) VALUES (1)", [])?;

    tx.commit()?;

    if fresh {
        info!("base schema created");
    }
    Ok(fresh)
}

/// Checks whether a table exists in the database.
pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_schema_contains_all_tables() {
        let sql = base_schema_sql();
        for table in [
            "customers",
            "tubes",
            "certificates",
            "prices",
            "quotes",
            "quote_items",
            "contracts",
            "settings",
            "call_logs",
            "logs",
            "reports",
            "counters",
            "schema_version",
        ] {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn current_certificates_shape_has_no_unique_number() {
        assert!(!certificates_table_ddl("certificates").contains("UNIQUE"));
    }

    #[test]
    fn ensure_creates_schema_and_settings_row() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        assert!(ensure_base_schema(&mut conn).unwrap());

        assert!(table_exists(&conn, "tubes").unwrap());
        let settings_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(settings_rows, 1);
    }

    #[test]
    fn ensure_is_idempotent_and_keeps_settings() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(ensure_base_schema(&mut conn).unwrap());
        conn.execute("UPDATE settings SET company_name = 'Acme' WHERE id = 1", [])
            .unwrap();

        assert!(!ensure_base_schema(&mut conn).unwrap());
        let name: String = conn
            .query_row("SELECT company_name FROM settings WHERE id = 1", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(name, "Acme");
    }
}
