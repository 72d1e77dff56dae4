//! Activity records: audit log entries, call logs, and saved reports.

use rusqlite::{Connection, Row, params};
use tubeledger_core::{ActivityLog, CallLog, Report};

use crate::error::{Result, StoreError};
use crate::repo::require_customer;
use crate::store::Store;

pub(crate) const LOG_COLUMNS: &str = "id, customer_id, action, detail, created_at";
pub(crate) const CALL_LOG_COLUMNS: &str = "id, customer_id, called_at, subject, notes";
pub(crate) const REPORT_COLUMNS: &str = "id, title, kind, payload, created_at";

pub(crate) fn log_from_row(row: &Row) -> rusqlite::Result<ActivityLog> {
    Ok(ActivityLog {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        action: row.get(2)?,
        detail: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn call_log_from_row(row: &Row) -> rusqlite::Result<CallLog> {
    Ok(CallLog {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        called_at: row.get(2)?,
        subject: row.get(3)?,
        notes: row.get(4)?,
    })
}

pub(crate) fn report_from_row(row: &Row) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: row.get(2)?,
        payload: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Appends an audit entry. Used internally by mutating operations and
/// exposed through [`Store::log_action`].
pub(crate) fn record(
    conn: &Connection,
    customer_id: Option<i64>,
    action: &str,
    detail: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO logs (customer_id, action, detail) VALUES (?1, ?2, ?3)",
        params![customer_id, action, detail],
    )?;
    Ok(())
}

impl Store {
    /// Appends an audit entry on behalf of the caller.
    pub fn log_action(
        &mut self,
        customer_id: Option<i64>,
        action: &str,
        detail: Option<&str>,
    ) -> Result<()> {
        record(&self.conn, customer_id, action, detail)
    }

    /// Most recent audit entries, newest first.
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<ActivityLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM logs ORDER BY id DESC LIMIT ?1"
        ))?;
        let logs = stmt
            .query_map([limit as i64], log_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Records a phone call for a customer.
    pub fn add_call_log(
        &mut self,
        customer_id: i64,
        subject: &str,
        notes: Option<&str>,
    ) -> Result<CallLog> {
        require_customer(&self.conn, customer_id)?;
        self.conn.execute(
            "INSERT INTO call_logs (customer_id, subject, notes) VALUES (?1, ?2, ?3)",
            params![customer_id, subject, notes],
        )?;
        let id = self.conn.last_insert_rowid();
        let call = self.conn.query_row(
            &format!("SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE id = ?1"),
            [id],
            call_log_from_row,
        )?;
        Ok(call)
    }

    /// Call history for one customer, newest first.
    pub fn call_logs_for(&self, customer_id: i64) -> Result<Vec<CallLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE customer_id = ?1 ORDER BY id DESC"
        ))?;
        let calls = stmt
            .query_map([customer_id], call_log_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(calls)
    }

    /// Persists a rendered report document.
    pub fn save_report(&mut self, title: &str, kind: &str, payload: &str) -> Result<Report> {
        self.conn.execute(
            "INSERT INTO reports (title, kind, payload) VALUES (?1, ?2, ?3)",
            params![title, kind, payload],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
                [id],
                report_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("report", id),
                other => other.into(),
            })
    }

    pub fn list_reports(&self) -> Result<Vec<Report>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY id DESC"
        ))?;
        let reports = stmt
            .query_map([], report_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }
}
