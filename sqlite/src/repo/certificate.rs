//! Certificate operations.
//!
//! A certificate belongs to a tube and carries a snapshot of that tube's
//! customer id taken at creation time; the snapshot is deliberate and is
//! not resynchronized later. Numbers are minted per issue year and are
//! not unique; re-certifying a tube is a normal event.

use chrono::Datelike;
use rusqlite::{Row, params};
use tubeledger_core::{Certificate, NewCertificate, SequenceKind};

use crate::error::{Result, StoreError};
use crate::sequence;
use crate::store::Store;

pub(crate) const COLUMNS: &str = "id, tube_id, customer_id, number, issue_date, issuer, \
     pdf_path, vessel_name, imo_number, created_at";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Certificate> {
    Ok(Certificate {
        id: row.get(0)?,
        tube_id: row.get(1)?,
        customer_id: row.get(2)?,
        number: row.get(3)?,
        issue_date: row.get(4)?,
        issuer: row.get(5)?,
        pdf_path: row.get(6)?,
        vessel_name: row.get(7)?,
        imo_number: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl Store {
    /// Issues a certificate for a tube. The number is minted for the
    /// issue date's year in the same transaction as the insert.
    pub fn create_certificate(&mut self, draft: &NewCertificate) -> Result<Certificate> {
        let tx = self.conn.transaction()?;

        let customer_id: i64 = tx
            .query_row(
                "SELECT customer_id FROM tubes WHERE id = ?1",
                [draft.tube_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::not_found("tube", draft.tube_id)
                }
                other => other.into(),
            })?;

        let minted =
            sequence::next_in_tx(&tx, SequenceKind::Certificate, draft.issue_date.year())?;
        tx.execute(
            "INSERT INTO certificates (tube_id, customer_id, number, issue_date, issuer,
                                       pdf_path, vessel_name, imo_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                draft.tube_id,
                customer_id,
                minted.formatted,
                draft.issue_date,
                draft.issuer,
                draft.pdf_path,
                draft.vessel_name,
                draft.imo_number,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.get_certificate(id)
    }

    pub fn get_certificate(&self, id: i64) -> Result<Certificate> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM certificates WHERE id = ?1"),
                [id],
                from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("certificate", id),
                other => other.into(),
            })
    }

    /// Lists certificates, optionally scoped to a customer and/or a
    /// tube.
    pub fn list_certificates(
        &self,
        customer_id: Option<i64>,
        tube_id: Option<i64>,
    ) -> Result<Vec<Certificate>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM certificates
             WHERE (?1 IS NULL OR customer_id = ?1)
               AND (?2 IS NULL OR tube_id = ?2)
             ORDER BY issue_date DESC, id DESC"
        ))?;
        let certificates = stmt
            .query_map(params![customer_id, tube_id], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(certificates)
    }

    pub fn delete_certificate(&mut self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM certificates WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StoreError::not_found("certificate", id));
        }
        Ok(())
    }
}
