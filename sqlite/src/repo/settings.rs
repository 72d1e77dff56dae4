//! Settings singleton.
//!
//! Company-wide configuration lives in a single row with fixed id 1,
//! created with defaults by the base schema pass.

use rusqlite::{Connection, Row, params};
use tubeledger_core::Settings;

use crate::error::Result;
use crate::store::Store;

pub(crate) const COLUMNS: &str = "company_name, phone, email, address, tax_office, tax_number, \
     bank_name, iban, default_tax_rate, logo_path";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Settings> {
    Ok(Settings {
        company_name: row.get(0)?,
        phone: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        tax_office: row.get(4)?,
        tax_number: row.get(5)?,
        bank_name: row.get(6)?,
        iban: row.get(7)?,
        default_tax_rate: row.get(8)?,
        logo_path: row.get(9)?,
    })
}

impl Store {
    /// Current company settings; defaults when the row has somehow not
    /// been seeded yet.
    pub fn settings(&self) -> Result<Settings> {
        let loaded = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM settings WHERE id = 1"),
                [],
                from_row,
            );
        match loaded {
            Ok(settings) => Ok(settings),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the settings row.
    pub fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        write(&self.conn, settings)
    }
}

pub(crate) fn write(conn: &Connection, settings: &Settings) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings
             (id, company_name, phone, email, address, tax_office, tax_number,
              bank_name, iban, default_tax_rate, logo_path)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            settings.company_name,
            settings.phone,
            settings.email,
            settings.address,
            settings.tax_office,
            settings.tax_number,
            settings.bank_name,
            settings.iban,
            settings.default_tax_rate,
            settings.logo_path,
        ],
    )?;
    Ok(())
}
