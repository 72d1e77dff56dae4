//! Price-list operations.
//!
//! Prices have no foreign keys; uniqueness on (type, weight, category)
//! is enforced at this layer by upserting rather than by a constraint,
//! matching how the rest of the application treats the price list.

use rusqlite::{OptionalExtension, Row, params};
use tubeledger_core::{BulkOutcome, Price, PriceInput};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub(crate) const COLUMNS: &str = "id, type_code, weight_kg, category, unit_price, \
     refill_price, valve_price, hose_price, gauge_price";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Price> {
    Ok(Price {
        id: row.get(0)?,
        type_code: row.get(1)?,
        weight_kg: row.get(2)?,
        category: row.get(3)?,
        unit_price: row.get(4)?,
        refill_price: row.get(5)?,
        valve_price: row.get(6)?,
        hose_price: row.get(7)?,
        gauge_price: row.get(8)?,
    })
}

impl Store {
    /// Inserts or updates the row for (type, weight, category).
    /// `weight_kg` matches with NULL semantics, so a weightless entry is
    /// its own key.
    pub fn save_price(&mut self, input: &PriceInput) -> Result<Price> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM prices
                 WHERE type_code = ?1 AND category = ?2 AND weight_kg IS ?3",
                params![input.type_code, input.category, input.weight_kg],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                self.conn.execute(
                    "UPDATE prices
                     SET unit_price = ?1, refill_price = ?2, valve_price = ?3,
                         hose_price = ?4, gauge_price = ?5
                     WHERE id = ?6",
                    params![
                        input.unit_price,
                        input.refill_price,
                        input.valve_price,
                        input.hose_price,
                        input.gauge_price,
                        id,
                    ],
                )?;
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO prices (type_code, weight_kg, category, unit_price,
                                         refill_price, valve_price, hose_price, gauge_price)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        input.type_code,
                        input.weight_kg,
                        input.category,
                        input.unit_price,
                        input.refill_price,
                        input.valve_price,
                        input.hose_price,
                        input.gauge_price,
                    ],
                )?;
                self.conn.last_insert_rowid()
            }
        };
        self.get_price(id)
    }

    pub fn get_price(&self, id: i64) -> Result<Price> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM prices WHERE id = ?1"),
                [id],
                from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("price", id),
                other => other.into(),
            })
    }

    pub fn list_prices(&self) -> Result<Vec<Price>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM prices ORDER BY type_code, category, weight_kg"
        ))?;
        let prices = stmt
            .query_map([], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(prices)
    }

    pub fn delete_price(&mut self, id: i64) -> Result<()> {
        let rows = self.conn.execute("DELETE FROM prices WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StoreError::not_found("price", id));
        }
        Ok(())
    }

    /// Upserts a batch of price rows, one outcome per input. The
    /// outcome id is the saved row's id, or 0 when the save failed.
    pub fn bulk_update_prices(&mut self, inputs: &[PriceInput]) -> Result<Vec<BulkOutcome>> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            let outcome = match self.save_price(input) {
                Ok(price) => BulkOutcome::ok(price.id),
                Err(e) => BulkOutcome::failed(0, e.to_string()),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
