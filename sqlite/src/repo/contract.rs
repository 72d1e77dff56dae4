//! Contract operations.
//!
//! A contract derives from an accepted quote: the customer is resolved
//! through the quote at creation and the rendered content is stored
//! verbatim. Numbers are minted like every other document identifier.

use chrono::{Datelike, NaiveDate};
use rusqlite::{Row, params};
use tubeledger_core::{Contract, ContractDraft, ContractStatus, SequenceKind};

use crate::error::{Result, StoreError};
use crate::repo::bad_enum;
use crate::sequence;
use crate::store::{Store, today};

pub(crate) const COLUMNS: &str = "id, quote_id, customer_id, number, content, starts_on, \
     ends_on, status, created_at, updated_at";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Contract> {
    let status_raw: String = row.get(7)?;
    let status = ContractStatus::parse(&status_raw).ok_or_else(|| bad_enum(7, &status_raw))?;
    Ok(Contract {
        id: row.get(0)?,
        quote_id: row.get(1)?,
        customer_id: row.get(2)?,
        number: row.get(3)?,
        content: row.get(4)?,
        starts_on: row.get(5)?,
        ends_on: row.get(6)?,
        status,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Store {
    /// Creates a contract from a quote, minting the number for the
    /// current calendar year.
    pub fn create_contract(&mut self, draft: &ContractDraft) -> Result<Contract> {
        self.create_contract_on(draft, today())
    }

    /// Creates a contract minting its number for `today`'s year.
    pub fn create_contract_on(&mut self, draft: &ContractDraft, today: NaiveDate) -> Result<Contract> {
        let tx = self.conn.transaction()?;

        let customer_id: i64 = tx
            .query_row(
                "SELECT customer_id FROM quotes WHERE id = ?1",
                [draft.quote_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::not_found("quote", draft.quote_id)
                }
                other => other.into(),
            })?;

        let minted = sequence::next_in_tx(&tx, SequenceKind::Contract, today.year())?;
        tx.execute(
            "INSERT INTO contracts (quote_id, customer_id, number, content, starts_on, ends_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.quote_id,
                customer_id,
                minted.formatted,
                draft.content,
                draft.starts_on,
                draft.ends_on,
            ],
        )
        .map_err(StoreError::on_unique("contract number", &minted.formatted))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.get_contract(id)
    }

    pub fn get_contract(&self, id: i64) -> Result<Contract> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM contracts WHERE id = ?1"),
                [id],
                from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("contract", id),
                other => other.into(),
            })
    }

    pub fn list_contracts(&self, customer_id: Option<i64>) -> Result<Vec<Contract>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM contracts
             WHERE (?1 IS NULL OR customer_id = ?1)
             ORDER BY id DESC"
        ))?;
        let contracts = stmt
            .query_map(params![customer_id], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(contracts)
    }

    /// Updates the contract body and validity window.
    pub fn update_contract(
        &mut self,
        id: i64,
        content: &str,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> Result<Contract> {
        let rows = self.conn.execute(
            "UPDATE contracts
             SET content = ?1, starts_on = ?2, ends_on = ?3, updated_at = datetime('now')
             WHERE id = ?4",
            params![content, starts_on, ends_on, id],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("contract", id));
        }
        self.get_contract(id)
    }

    pub fn update_contract_status(&mut self, id: i64, status: ContractStatus) -> Result<Contract> {
        let rows = self.conn.execute(
            "UPDATE contracts SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("contract", id));
        }
        self.get_contract(id)
    }

    pub fn delete_contract(&mut self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM contracts WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StoreError::not_found("contract", id));
        }
        Ok(())
    }
}
