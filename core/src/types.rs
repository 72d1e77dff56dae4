//! Entity definitions for the back-office data model.
//!
//! These types mirror the rows of the SQLite store one-to-one and are
//! designed for serialization with [`serde`], so they round-trip through
//! JSON snapshots and the IPC boundary unchanged. Draft types (`New*`,
//! `*Draft`) carry caller-supplied fields only; identifiers, serial
//! numbers, and timestamps are always assigned by the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a customer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CustomerStatus {
    /// Customer is actively serviced (the default).
    #[default]
    Active,
    /// Customer retained for history but no longer serviced.
    Passive,
}

impl CustomerStatus {
    /// String form used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Passive => "passive",
        }
    }

    /// Parses the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CustomerStatus::Active),
            "passive" => Some(CustomerStatus::Passive),
            _ => None,
        }
    }
}

/// A serviced company. Owns tubes, quotes, certificates, call logs, and
/// contracts; deleting a customer cascades to all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    /// Company name (required, the only mandatory field).
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: CustomerStatus,
    /// RFC 3339 creation timestamp, assigned by the store.
    pub created_at: String,
    pub updated_at: String,
}

/// Caller-supplied fields for creating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl NewCustomer {
    /// Creates a draft with the given company name and no optional fields.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A physical extinguisher tube.
///
/// The serial number is globally unique across all years and types and is
/// minted by the sequence service in the same transaction as the insert.
/// The field-inspection columns (`location`, `field_status`, `field_note`,
/// `last_checked`) are filled in by on-site check updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tube {
    pub id: i64,
    pub customer_id: i64,
    /// Extinguisher type code (e.g. `KKT` for dry powder, `CO2`).
    pub type_code: String,
    pub weight_kg: Option<f64>,
    /// Globally unique serial, formatted `YYYY-NNNN`.
    pub serial: String,
    /// Issue year the serial was minted in.
    pub year: i32,
    /// Within-year sequence number behind the serial.
    pub seq_no: i64,
    pub fill_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    /// Path of the generated QR artifact, relative to the data directory.
    pub qr_path: Option<String>,
    pub location: Option<String>,
    pub field_status: Option<String>,
    pub field_note: Option<String>,
    pub last_checked: Option<NaiveDate>,
    pub created_at: String,
}

/// Caller-supplied fields for creating a tube.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTube {
    pub customer_id: i64,
    pub type_code: String,
    pub weight_kg: Option<f64>,
    pub fill_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub qr_path: Option<String>,
}

/// A tube approaching its expiry date, with the remaining days computed
/// at query time against the caller's reference date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringTube {
    pub tube: Tube,
    pub customer_name: String,
    /// Days until expiry; negative when already expired.
    pub days_remaining: i64,
}

/// An inspection/refill certificate issued for a tube.
///
/// `customer_id` is a deliberate point-in-time snapshot of the tube's
/// owner at creation; it is not resynchronized if the tube later moves.
/// Certificate numbers are not unique; a tube accumulates one per
/// inspection over its life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: i64,
    pub tube_id: i64,
    pub customer_id: i64,
    /// Minted number, formatted `CERT-YYYY-NNNNN`.
    pub number: String,
    pub issue_date: NaiveDate,
    pub issuer: Option<String>,
    pub pdf_path: Option<String>,
    pub vessel_name: Option<String>,
    pub imo_number: Option<String>,
    pub created_at: String,
}

/// Caller-supplied fields for issuing a certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCertificate {
    pub tube_id: i64,
    pub issue_date: NaiveDate,
    pub issuer: Option<String>,
    pub pdf_path: Option<String>,
    pub vessel_name: Option<String>,
    pub imo_number: Option<String>,
}

/// A price-list row, keyed informally by (type, weight, category).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: i64,
    pub type_code: String,
    pub weight_kg: Option<f64>,
    pub category: String,
    pub unit_price: f64,
    pub refill_price: Option<f64>,
    pub valve_price: Option<f64>,
    pub hose_price: Option<f64>,
    pub gauge_price: Option<f64>,
}

/// Upsert input for a price-list row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceInput {
    pub type_code: String,
    pub weight_kg: Option<f64>,
    pub category: String,
    pub unit_price: f64,
    pub refill_price: Option<f64>,
    pub valve_price: Option<f64>,
    pub hose_price: Option<f64>,
    pub gauge_price: Option<f64>,
}

/// Workflow status of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(QuoteStatus::Draft),
            "sent" => Some(QuoteStatus::Sent),
            "accepted" => Some(QuoteStatus::Accepted),
            "rejected" => Some(QuoteStatus::Rejected),
            "expired" => Some(QuoteStatus::Expired),
            _ => None,
        }
    }
}

/// A priced offer for a customer.
///
/// Totals are computed once at write time from the items and persisted;
/// reads never recompute them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub customer_id: i64,
    /// Minted number, formatted `QT-YYYY-NNNN`.
    pub number: String,
    pub status: QuoteStatus,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub currency: String,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A single line of a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteItem {
    pub id: i64,
    pub quote_id: i64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Caller-supplied line for a new quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteItemDraft {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Caller-supplied fields for creating a quote. The number, totals, and
/// timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub customer_id: i64,
    pub items: Vec<QuoteItemDraft>,
    pub tax_rate: f64,
    pub currency: String,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Workflow status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContractStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Expired => "expired",
            ContractStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ContractStatus::Active),
            "expired" => Some(ContractStatus::Expired),
            "cancelled" => Some(ContractStatus::Cancelled),
            _ => None,
        }
    }
}

/// A service contract derived from an accepted quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    /// Originating quote; kept when the quote is later deleted.
    pub quote_id: Option<i64>,
    pub customer_id: i64,
    /// Minted number, formatted `CN-YYYY-NNNN`.
    pub number: String,
    /// Rendered contract body, stored verbatim.
    pub content: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub status: ContractStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Caller-supplied fields for creating a contract from a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDraft {
    pub quote_id: i64,
    pub content: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

/// Company-wide configuration, stored as a singleton row with id 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub company_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub bank_name: Option<String>,
    pub iban: Option<String>,
    pub default_tax_rate: f64,
    pub logo_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            phone: None,
            email: None,
            address: None,
            tax_office: None,
            tax_number: None,
            bank_name: None,
            iban: None,
            default_tax_rate: 20.0,
            logo_path: None,
        }
    }
}

/// A phone-call note attached to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: i64,
    pub customer_id: i64,
    pub called_at: String,
    pub subject: String,
    pub notes: Option<String>,
}

/// An append-only activity record, optionally scoped to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: String,
}

/// A saved report document (JSON payload, rendered elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub kind: String,
    pub payload: String,
    pub created_at: String,
}

/// A raw sequence counter row, exposed only to backup/restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    pub kind: String,
    pub year: i32,
    pub value: i64,
}

/// Per-item result of a bulk operation. Bulk operations never abort the
/// whole batch; the caller inspects these instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub id: i64,
    pub ok: bool,
    pub error: Option<String>,
}

impl BulkOutcome {
    pub fn ok(id: i64) -> Self {
        Self {
            id,
            ok: true,
            error: None,
        }
    }

    pub fn failed(id: i64, error: impl Into<String>) -> Self {
        Self {
            id,
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// A customer together with everything it owns, for the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub customer: Customer,
    pub tubes: Vec<Tube>,
    pub quotes: Vec<Quote>,
    pub contracts: Vec<Contract>,
    pub call_logs: Vec<CallLog>,
}

/// Filter for customer listings.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub status: Option<CustomerStatus>,
    /// Matches name, contact name, or phone (substring, case-insensitive).
    pub search: Option<String>,
}

/// Filter for tube listings.
#[derive(Debug, Clone, Default)]
pub struct TubeFilter {
    pub customer_id: Option<i64>,
    /// Matches serial, type code, or owning customer name.
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in [CustomerStatus::Active, CustomerStatus::Passive] {
            assert_eq!(CustomerStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            QuoteStatus::Draft,
            QuoteStatus::Sent,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
            QuoteStatus::Expired,
        ] {
            assert_eq!(QuoteStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            ContractStatus::Active,
            ContractStatus::Expired,
            ContractStatus::Cancelled,
        ] {
            assert_eq!(ContractStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CustomerStatus::parse("archived"), None);
    }

    #[test]
    fn new_customer_named_sets_only_name() {
        let draft = NewCustomer::named("ABC Otomotiv");
        assert_eq!(draft.name, "ABC Otomotiv");
        assert!(draft.phone.is_none());
        assert!(draft.notes.is_none());
    }

    #[test]
    fn entities_serialize_to_json() {
        let customer = Customer {
            id: 1,
            name: "ABC Otomotiv".to_string(),
            contact_name: None,
            phone: Some("05551112233".to_string()),
            email: None,
            address: None,
            notes: None,
            status: CustomerStatus::Active,
            created_at: "2026-01-05T09:00:00+03:00".to_string(),
            updated_at: "2026-01-05T09:00:00+03:00".to_string(),
        };
        let json = serde_json::to_string(&customer).unwrap();
        let back: Customer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, customer.name);
        assert_eq!(back.status, CustomerStatus::Active);
    }
}
