//! Customer operations.

use rusqlite::{Row, params};
use tubeledger_core::{Customer, CustomerDetails, CustomerFilter, CustomerStatus, NewCustomer};

use crate::error::{Result, StoreError};
use crate::repo::{self, bad_enum};
use crate::store::Store;

pub(crate) const COLUMNS: &str =
    "id, name, contact_name, phone, email, address, notes, status, created_at, updated_at";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Customer> {
    let status_raw: String = row.get(7)?;
    let status = CustomerStatus::parse(&status_raw).ok_or_else(|| bad_enum(7, &status_raw))?;
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        notes: row.get(6)?,
        status,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Store {
    /// Creates a customer from the draft. Status starts as `active`.
    pub fn create_customer(&mut self, draft: &NewCustomer) -> Result<Customer> {
        self.conn.execute(
            "INSERT INTO customers (name, contact_name, phone, email, address, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.name,
                draft.contact_name,
                draft.phone,
                draft.email,
                draft.address,
                draft.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        repo::activity::record(&self.conn, Some(id), "customer.created", Some(draft.name.as_str()))?;
        self.get_customer(id)
    }

    /// Loads a single customer.
    pub fn get_customer(&self, id: i64) -> Result<Customer> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"),
                [id],
                from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("customer", id),
                other => other.into(),
            })
    }

    /// Lists customers, optionally filtered by status and a free-text
    /// search over name, contact name, and phone.
    pub fn list_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM customers
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR name LIKE ?2 OR contact_name LIKE ?2 OR phone LIKE ?2)
             ORDER BY name"
        ))?;
        let customers = stmt
            .query_map(
                params![filter.status.map(|s| s.as_str()), pattern],
                from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(customers)
    }

    /// Updates a customer's fields and status.
    pub fn update_customer(
        &mut self,
        id: i64,
        draft: &NewCustomer,
        status: CustomerStatus,
    ) -> Result<Customer> {
        let rows = self.conn.execute(
            "UPDATE customers
             SET name = ?1, contact_name = ?2, phone = ?3, email = ?4, address = ?5,
                 notes = ?6, status = ?7, updated_at = datetime('now')
             WHERE id = ?8",
            params![
                draft.name,
                draft.contact_name,
                draft.phone,
                draft.email,
                draft.address,
                draft.notes,
                status.as_str(),
                id,
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("customer", id));
        }
        self.get_customer(id)
    }

    /// Deletes a customer; tubes, certificates, quotes, call logs, and
    /// contracts cascade with it.
    pub fn delete_customer(&mut self, id: i64) -> Result<()> {
        let name = self.get_customer(id)?.name;
        self.conn
            .execute("DELETE FROM customers WHERE id = ?1", [id])?;
        repo::activity::record(&self.conn, None, "customer.deleted", Some(name.as_str()))?;
        Ok(())
    }

    /// The customer together with everything it owns, for the detail
    /// view.
    pub fn customer_details(&self, id: i64) -> Result<CustomerDetails> {
        let customer = self.get_customer(id)?;
        Ok(CustomerDetails {
            tubes: self.tubes_by_customer(id)?,
            quotes: self.list_quotes(Some(id))?,
            contracts: self.list_contracts(Some(id))?,
            call_logs: self.call_logs_for(id)?,
            customer,
        })
    }
}
