//! Tube operations.
//!
//! Serials are minted by the sequence service inside the same
//! transaction as the insert, so a crash can skip a number but can never
//! hand the same serial to two tubes.

use chrono::{Datelike, Months, NaiveDate};
use rusqlite::{Row, params};
use tracing::{info, warn};
use tubeledger_core::{BulkOutcome, ExpiringTube, NewTube, SequenceKind, Tube, TubeFilter};

use crate::error::{Result, StoreError};
use crate::repo::{self, require_customer};
use crate::sequence;
use crate::store::{Store, today};

pub(crate) const COLUMNS: &str = "id, customer_id, type_code, weight_kg, serial, year, seq_no, \
     fill_date, expiry_date, qr_path, location, field_status, field_note, last_checked, created_at";

/// Same list with a `t.` prefix, for joined queries.
const COLUMNS_T: &str = "t.id, t.customer_id, t.type_code, t.weight_kg, t.serial, t.year, \
     t.seq_no, t.fill_date, t.expiry_date, t.qr_path, t.location, t.field_status, t.field_note, \
     t.last_checked, t.created_at";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Tube> {
    Ok(Tube {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        type_code: row.get(2)?,
        weight_kg: row.get(3)?,
        serial: row.get(4)?,
        year: row.get(5)?,
        seq_no: row.get(6)?,
        fill_date: row.get(7)?,
        expiry_date: row.get(8)?,
        qr_path: row.get(9)?,
        location: row.get(10)?,
        field_status: row.get(11)?,
        field_note: row.get(12)?,
        last_checked: row.get(13)?,
        created_at: row.get(14)?,
    })
}

impl Store {
    /// Creates a tube with a freshly minted serial, scoped to the
    /// current calendar year.
    pub fn create_tube(&mut self, draft: &NewTube) -> Result<Tube> {
        self.create_tube_on(draft, today())
    }

    /// Creates a tube minting its serial for `today`'s year. The
    /// counter increment and the insert commit together.
    pub fn create_tube_on(&mut self, draft: &NewTube, today: NaiveDate) -> Result<Tube> {
        let year = today.year();
        let tx = self.conn.transaction()?;
        require_customer(&tx, draft.customer_id)?;

        let minted = sequence::next_in_tx(&tx, SequenceKind::Tube, year)?;
        tx.execute(
            "INSERT INTO tubes (customer_id, type_code, weight_kg, serial, year, seq_no,
                                fill_date, expiry_date, qr_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                draft.customer_id,
                draft.type_code,
                draft.weight_kg,
                minted.formatted,
                minted.year,
                minted.number,
                draft.fill_date,
                draft.expiry_date,
                draft.qr_path,
            ],
        )
        .map_err(StoreError::on_unique("serial", &minted.formatted))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.get_tube(id)
    }

    pub fn get_tube(&self, id: i64) -> Result<Tube> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM tubes WHERE id = ?1"),
                [id],
                from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("tube", id),
                other => other.into(),
            })
    }

    /// Lists tubes, optionally scoped to a customer and filtered by a
    /// free-text search over serial, type code, and customer name.
    pub fn list_tubes(&self, filter: &TubeFilter) -> Result<Vec<Tube>> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS_T} FROM tubes t
             JOIN customers c ON c.id = t.customer_id
             WHERE (?1 IS NULL OR t.customer_id = ?1)
               AND (?2 IS NULL OR t.serial LIKE ?2 OR t.type_code LIKE ?2 OR c.name LIKE ?2)
             ORDER BY t.serial"
        ))?;
        let tubes = stmt
            .query_map(params![filter.customer_id, pattern], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tubes)
    }

    pub fn tubes_by_customer(&self, customer_id: i64) -> Result<Vec<Tube>> {
        self.list_tubes(&TubeFilter {
            customer_id: Some(customer_id),
            search: None,
        })
    }

    /// Updates a tube's descriptive fields. The serial, year, and
    /// sequence number are immutable once minted.
    pub fn update_tube(&mut self, id: i64, draft: &NewTube) -> Result<Tube> {
        require_customer(&self.conn, draft.customer_id)?;
        let rows = self.conn.execute(
            "UPDATE tubes
             SET customer_id = ?1, type_code = ?2, weight_kg = ?3, fill_date = ?4,
                 expiry_date = ?5, qr_path = ?6
             WHERE id = ?7",
            params![
                draft.customer_id,
                draft.type_code,
                draft.weight_kg,
                draft.fill_date,
                draft.expiry_date,
                draft.qr_path,
                id,
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("tube", id));
        }
        self.get_tube(id)
    }

    /// Records a field-inspection update: where the tube is, how it
    /// looked, and when it was checked.
    pub fn update_tube_location(
        &mut self,
        id: i64,
        location: Option<&str>,
        field_status: Option<&str>,
        field_note: Option<&str>,
        checked_on: NaiveDate,
    ) -> Result<Tube> {
        let rows = self.conn.execute(
            "UPDATE tubes
             SET location = ?1, field_status = ?2, field_note = ?3, last_checked = ?4
             WHERE id = ?5",
            params![location, field_status, field_note, checked_on, id],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("tube", id));
        }
        self.get_tube(id)
    }

    /// Deletes a tube and, by cascade, its certificates.
    pub fn delete_tube(&mut self, id: i64) -> Result<()> {
        let rows = self.conn.execute("DELETE FROM tubes WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StoreError::not_found("tube", id));
        }
        Ok(())
    }

    /// Deletes tubes one by one, reporting a per-item outcome instead of
    /// aborting the batch.
    pub fn bulk_delete_tubes(&mut self, ids: &[i64]) -> Result<Vec<BulkOutcome>> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let outcome = match self.delete_tube(id) {
                Ok(()) => BulkOutcome::ok(id),
                Err(e) => BulkOutcome::failed(id, e.to_string()),
            };
            outcomes.push(outcome);
        }
        info!(total = ids.len(), "bulk tube delete finished");
        // The deletes are already committed; the audit entry is best-effort.
        let detail = format!("{} tubes", ids.len());
        if let Err(e) =
            repo::activity::record(&self.conn, None, "tube.bulk_delete", Some(detail.as_str()))
        {
            warn!(error = %e, "audit entry for bulk delete skipped");
        }
        Ok(outcomes)
    }

    /// Refills tubes: each gets the given fill date and a fresh expiry
    /// `valid_months` later. Per-item outcomes, batch never aborts.
    pub fn bulk_refill_tubes(
        &mut self,
        ids: &[i64],
        fill_date: NaiveDate,
        valid_months: u32,
    ) -> Result<Vec<BulkOutcome>> {
        let Some(expiry) = fill_date.checked_add_months(Months::new(valid_months)) else {
            return Ok(ids
                .iter()
                .map(|&id| BulkOutcome::failed(id, "refill period out of range"))
                .collect());
        };

        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = self.conn.execute(
                "UPDATE tubes SET fill_date = ?1, expiry_date = ?2 WHERE id = ?3",
                params![fill_date, expiry, id],
            );
            let outcome = match result {
                Ok(0) => BulkOutcome::failed(id, format!("tube not found: id {id}")),
                Ok(_) => BulkOutcome::ok(id),
                Err(e) => BulkOutcome::failed(id, e.to_string()),
            };
            outcomes.push(outcome);
        }
        let detail = format!("{} tubes, filled {fill_date}", ids.len());
        if let Err(e) =
            repo::activity::record(&self.conn, None, "tube.bulk_refill", Some(detail.as_str()))
        {
            warn!(error = %e, "audit entry for bulk refill skipped");
        }
        Ok(outcomes)
    }

    /// Tubes whose expiry falls within `within_days` of `today`,
    /// including already-expired ones. `days_remaining` is derived at
    /// query time and never stored.
    pub fn expiring_tubes(&self, today: NaiveDate, within_days: i64) -> Result<Vec<ExpiringTube>> {
        let cutoff = today + chrono::Duration::days(within_days);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS_T}, c.name FROM tubes t
             JOIN customers c ON c.id = t.customer_id
             WHERE t.expiry_date IS NOT NULL AND date(t.expiry_date) <= date(?1)
             ORDER BY t.expiry_date"
        ))?;
        let rows = stmt
            .query_map(params![cutoff], |row| {
                let tube = from_row(row)?;
                let customer_name: String = row.get(15)?;
                Ok((tube, customer_name))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(tube, customer_name)| {
                let days_remaining = tube
                    .expiry_date
                    .map(|d| (d - today).num_days())
                    .unwrap_or_default();
                ExpiringTube {
                    tube,
                    customer_name,
                    days_remaining,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubeledger_core::NewCustomer;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bulk_delete_outcomes_survive_a_failed_audit_entry() {
        let mut store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        let customer = store
            .create_customer(&NewCustomer::named("ABC Otomotiv"))
            .unwrap();
        let tube = store
            .create_tube_on(
                &NewTube {
                    customer_id: customer.id,
                    type_code: "KKT".to_string(),
                    ..Default::default()
                },
                date(2026, 1, 10),
            )
            .unwrap();

        // The batch commits per item; losing the audit table afterwards
        // must not turn the finished batch into an error.
        store.conn.execute_batch("DROP TABLE logs").unwrap();

        let outcomes = store.bulk_delete_tubes(&[tube.id]).unwrap();
        assert!(outcomes[0].ok);
        assert!(store.tubes_by_customer(customer.id).unwrap().is_empty());
    }
}
