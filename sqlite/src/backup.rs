//! Logical backup and restore.
//!
//! A snapshot is a self-describing JSON dump of every table, ids and
//! counters included. Restoring the counters along with the rows keeps
//! already-issued serials from ever being reissued against restored
//! data.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;
use tubeledger_core::{
    ActivityLog, CallLog, Certificate, Contract, Counter, Customer, Price, Quote, QuoteItem,
    Report, Settings, Tube,
};

use crate::error::{Result, StoreError};
use crate::repo::{activity, certificate, contract, customer, price, quote, settings, tube};
use crate::sequence;
use crate::store::Store;

/// Format marker written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full logical dump of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub created_at: String,
    pub settings: Settings,
    pub customers: Vec<Customer>,
    pub tubes: Vec<Tube>,
    pub certificates: Vec<Certificate>,
    pub prices: Vec<Price>,
    pub quotes: Vec<Quote>,
    pub quote_items: Vec<QuoteItem>,
    pub contracts: Vec<Contract>,
    pub call_logs: Vec<CallLog>,
    pub logs: Vec<ActivityLog>,
    pub reports: Vec<Report>,
    pub counters: Vec<Counter>,
}

impl Store {
    /// Dumps every table into a [`Snapshot`].
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            format_version: SNAPSHOT_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            settings: self.settings()?,
            customers: self.list_customers(&Default::default())?,
            tubes: self.list_tubes(&Default::default())?,
            certificates: self.list_certificates(None, None)?,
            prices: self.list_prices()?,
            quotes: self.list_quotes(None)?,
            quote_items: self.all_rows(
                &format!("SELECT {} FROM quote_items ORDER BY id", quote::ITEM_COLUMNS),
                quote::item_from_row,
            )?,
            contracts: self.list_contracts(None)?,
            call_logs: self.all_rows(
                &format!("SELECT {} FROM call_logs ORDER BY id", activity::CALL_LOG_COLUMNS),
                activity::call_log_from_row,
            )?,
            logs: self.all_rows(
                &format!("SELECT {} FROM logs ORDER BY id", activity::LOG_COLUMNS),
                activity::log_from_row,
            )?,
            reports: self.all_rows(
                &format!("SELECT {} FROM reports ORDER BY id", activity::REPORT_COLUMNS),
                activity::report_from_row,
            )?,
            counters: sequence::all(&self.conn)?,
        })
    }

    /// Writes a snapshot of the whole store to `path`.
    pub fn export_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = self.snapshot()?;
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)?;
        info!(path = %path.as_ref().display(), "snapshot exported");
        Ok(())
    }

    /// Replaces every current row with the contents of the snapshot at
    /// `path`. All-or-nothing: a failure rolls the store back untouched.
    pub fn restore_snapshot(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref())?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        self.restore(&snapshot)?;
        info!(path = %path.as_ref().display(), "snapshot restored");
        Ok(())
    }

    /// Applies a snapshot, replacing all current rows.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.format_version != SNAPSHOT_VERSION {
            return Err(StoreError::SnapshotVersion(snapshot.format_version));
        }
        let tx = self.conn.transaction()?;

        // Children first, so the deletes never trip a foreign key.
        for table in [
            "quote_items",
            "certificates",
            "call_logs",
            "logs",
            "reports",
            "contracts",
            "quotes",
            "tubes",
            "customers",
            "counters",
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }

        for c in &snapshot.customers {
            tx.execute(
                &format!(
                    "INSERT INTO customers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    customer::COLUMNS
                ),
                params![
                    c.id,
                    c.name,
                    c.contact_name,
                    c.phone,
                    c.email,
                    c.address,
                    c.notes,
                    c.status.as_str(),
                    c.created_at,
                    c.updated_at,
                ],
            )?;
        }
        for t in &snapshot.tubes {
            tx.execute(
                &format!(
                    "INSERT INTO tubes ({}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    tube::COLUMNS
                ),
                params![
                    t.id,
                    t.customer_id,
                    t.type_code,
                    t.weight_kg,
                    t.serial,
                    t.year,
                    t.seq_no,
                    t.fill_date,
                    t.expiry_date,
                    t.qr_path,
                    t.location,
                    t.field_status,
                    t.field_note,
                    t.last_checked,
                    t.created_at,
                ],
            )?;
        }
        for c in &snapshot.certificates {
            tx.execute(
                &format!(
                    "INSERT INTO certificates ({}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    certificate::COLUMNS
                ),
                params![
                    c.id,
                    c.tube_id,
                    c.customer_id,
                    c.number,
                    c.issue_date,
                    c.issuer,
                    c.pdf_path,
                    c.vessel_name,
                    c.imo_number,
                    c.created_at,
                ],
            )?;
        }
        for p in &snapshot.prices {
            tx.execute(
                &format!(
                    "INSERT INTO prices ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    price::COLUMNS
                ),
                params![
                    p.id,
                    p.type_code,
                    p.weight_kg,
                    p.category,
                    p.unit_price,
                    p.refill_price,
                    p.valve_price,
                    p.hose_price,
                    p.gauge_price,
                ],
            )?;
        }
        for q in &snapshot.quotes {
            tx.execute(
                &format!(
                    "INSERT INTO quotes ({}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    quote::COLUMNS
                ),
                params![
                    q.id,
                    q.customer_id,
                    q.number,
                    q.status.as_str(),
                    q.subtotal,
                    q.tax_rate,
                    q.tax_amount,
                    q.total,
                    q.currency,
                    q.valid_until,
                    q.notes,
                    q.created_at,
                    q.updated_at,
                ],
            )?;
        }
        for i in &snapshot.quote_items {
            tx.execute(
                &format!(
                    "INSERT INTO quote_items ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    quote::ITEM_COLUMNS
                ),
                params![
                    i.id,
                    i.quote_id,
                    i.description,
                    i.quantity,
                    i.unit_price,
                    i.line_total,
                ],
            )?;
        }
        for c in &snapshot.contracts {
            tx.execute(
                &format!(
                    "INSERT INTO contracts ({}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    contract::COLUMNS
                ),
                params![
                    c.id,
                    c.quote_id,
                    c.customer_id,
                    c.number,
                    c.content,
                    c.starts_on,
                    c.ends_on,
                    c.status.as_str(),
                    c.created_at,
                    c.updated_at,
                ],
            )?;
        }
        for c in &snapshot.call_logs {
            tx.execute(
                &format!(
                    "INSERT INTO call_logs ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                    activity::CALL_LOG_COLUMNS
                ),
                params![c.id, c.customer_id, c.called_at, c.subject, c.notes],
            )?;
        }
        for l in &snapshot.logs {
            tx.execute(
                &format!(
                    "INSERT INTO logs ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                    activity::LOG_COLUMNS
                ),
                params![l.id, l.customer_id, l.action, l.detail, l.created_at],
            )?;
        }
        for r in &snapshot.reports {
            tx.execute(
                &format!(
                    "INSERT INTO reports ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                    activity::REPORT_COLUMNS
                ),
                params![r.id, r.title, r.kind, r.payload, r.created_at],
            )?;
        }
        for c in &snapshot.counters {
            tx.execute(
                "INSERT INTO counters (kind, year, value) VALUES (?1, ?2, ?3)",
                params![c.kind, c.year, c.value],
            )?;
        }

        settings::write(&tx, &snapshot.settings)?;
        tx.commit()?;
        Ok(())
    }

    fn all_rows<T>(
        &self,
        sql: &str,
        map: impl Fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| map(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
