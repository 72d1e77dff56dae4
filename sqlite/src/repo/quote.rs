//! Quote operations.
//!
//! Totals are computed here once, at write time, and persisted with the
//! quote; reads never recompute them from the items. The quote number is
//! minted in the same transaction that inserts the quote and its items.

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, Row, params};
use tubeledger_core::{Quote, QuoteDraft, QuoteItem, QuoteStatus, SequenceKind};

use crate::error::{Result, StoreError};
use crate::repo::{bad_enum, require_customer};
use crate::sequence;
use crate::store::{Store, today};

pub(crate) const COLUMNS: &str = "id, customer_id, number, status, subtotal, tax_rate, \
     tax_amount, total, currency, valid_until, notes, created_at, updated_at";

pub(crate) const ITEM_COLUMNS: &str = "id, quote_id, description, quantity, unit_price, line_total";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Quote> {
    let status_raw: String = row.get(3)?;
    let status = QuoteStatus::parse(&status_raw).ok_or_else(|| bad_enum(3, &status_raw))?;
    Ok(Quote {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        number: row.get(2)?,
        status,
        subtotal: row.get(4)?,
        tax_rate: row.get(5)?,
        tax_amount: row.get(6)?,
        total: row.get(7)?,
        currency: row.get(8)?,
        valid_until: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

pub(crate) fn item_from_row(row: &Row) -> rusqlite::Result<QuoteItem> {
    Ok(QuoteItem {
        id: row.get(0)?,
        quote_id: row.get(1)?,
        description: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: row.get(4)?,
        line_total: row.get(5)?,
    })
}

/// Currency rounding to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

struct Totals {
    subtotal: f64,
    tax_amount: f64,
    total: f64,
}

fn compute_totals(draft: &QuoteDraft) -> Totals {
    let subtotal = round2(
        draft
            .items
            .iter()
            .map(|i| i.quantity * i.unit_price)
            .sum(),
    );
    let tax_amount = round2(subtotal * draft.tax_rate / 100.0);
    Totals {
        subtotal,
        tax_amount,
        total: round2(subtotal + tax_amount),
    }
}

fn insert_items(conn: &Connection, quote_id: i64, draft: &QuoteDraft) -> Result<()> {
    for item in &draft.items {
        conn.execute(
            "INSERT INTO quote_items (quote_id, description, quantity, unit_price, line_total)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                quote_id,
                item.description,
                item.quantity,
                item.unit_price,
                round2(item.quantity * item.unit_price),
            ],
        )?;
    }
    Ok(())
}

impl Store {
    /// Creates a quote with its items, minting the number for the
    /// current calendar year.
    pub fn create_quote(&mut self, draft: &QuoteDraft) -> Result<Quote> {
        self.create_quote_on(draft, today())
    }

    /// Creates a quote minting its number for `today`'s year.
    pub fn create_quote_on(&mut self, draft: &QuoteDraft, today: NaiveDate) -> Result<Quote> {
        let totals = compute_totals(draft);
        let tx = self.conn.transaction()?;
        require_customer(&tx, draft.customer_id)?;

        let minted = sequence::next_in_tx(&tx, SequenceKind::Quote, today.year())?;
        tx.execute(
            "INSERT INTO quotes (customer_id, number, subtotal, tax_rate, tax_amount, total,
                                 currency, valid_until, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                draft.customer_id,
                minted.formatted,
                totals.subtotal,
                draft.tax_rate,
                totals.tax_amount,
                totals.total,
                draft.currency,
                draft.valid_until,
                draft.notes,
            ],
        )
        .map_err(StoreError::on_unique("quote number", &minted.formatted))?;
        let id = tx.last_insert_rowid();
        insert_items(&tx, id, draft)?;
        tx.commit()?;
        self.get_quote(id)
    }

    /// Replaces a quote's fields and items and recomputes the totals.
    /// The number and status are kept.
    pub fn update_quote(&mut self, id: i64, draft: &QuoteDraft) -> Result<Quote> {
        let totals = compute_totals(draft);
        let tx = self.conn.transaction()?;
        require_customer(&tx, draft.customer_id)?;
        let rows = tx.execute(
            "UPDATE quotes
             SET customer_id = ?1, subtotal = ?2, tax_rate = ?3, tax_amount = ?4, total = ?5,
                 currency = ?6, valid_until = ?7, notes = ?8, updated_at = datetime('now')
             WHERE id = ?9",
            params![
                draft.customer_id,
                totals.subtotal,
                draft.tax_rate,
                totals.tax_amount,
                totals.total,
                draft.currency,
                draft.valid_until,
                draft.notes,
                id,
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("quote", id));
        }
        tx.execute("DELETE FROM quote_items WHERE quote_id = ?1", [id])?;
        insert_items(&tx, id, draft)?;
        tx.commit()?;
        self.get_quote(id)
    }

    pub fn get_quote(&self, id: i64) -> Result<Quote> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM quotes WHERE id = ?1"),
                [id],
                from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("quote", id),
                other => other.into(),
            })
    }

    pub fn list_quotes(&self, customer_id: Option<i64>) -> Result<Vec<Quote>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM quotes
             WHERE (?1 IS NULL OR customer_id = ?1)
             ORDER BY id DESC"
        ))?;
        let quotes = stmt
            .query_map(params![customer_id], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(quotes)
    }

    pub fn quote_items(&self, quote_id: i64) -> Result<Vec<QuoteItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM quote_items WHERE quote_id = ?1 ORDER BY id"
        ))?;
        let items = stmt
            .query_map([quote_id], item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn update_quote_status(&mut self, id: i64, status: QuoteStatus) -> Result<Quote> {
        let rows = self.conn.execute(
            "UPDATE quotes SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("quote", id));
        }
        self.get_quote(id)
    }

    /// Deletes a quote and its items; contracts derived from it keep
    /// their copy of the content and lose only the back-reference.
    pub fn delete_quote(&mut self, id: i64) -> Result<()> {
        let rows = self.conn.execute("DELETE FROM quotes WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StoreError::not_found("quote", id));
        }
        Ok(())
    }
}
