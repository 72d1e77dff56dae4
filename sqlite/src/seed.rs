//! Demo seed data.
//!
//! Populates an empty store with representative rows for demos and
//! manual testing. Runs only when the customer table is empty, is fully
//! deterministic for a fixed `today`, and goes exclusively through the
//! repository layer, so every serial and document number is minted by the
//! sequence service, never inserted directly.

use chrono::{Datelike, Months, NaiveDate};
use tracing::info;
use tubeledger_core::{
    NewCertificate, NewCustomer, NewTube, PriceInput, QuoteDraft, QuoteItemDraft,
};

use crate::error::Result;
use crate::store::Store;

/// Counts of rows created by a seed pass.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    /// Whether the pass ran at all (false when customers already exist).
    pub seeded: bool,
    pub customers: usize,
    pub tubes: usize,
    pub certificates: usize,
    pub prices: usize,
    pub quotes: usize,
}

/// Seeds demo data when the store is empty.
pub fn seed_demo(store: &mut Store, today: NaiveDate) -> Result<SeedReport> {
    let existing = store.list_customers(&Default::default())?;
    if !existing.is_empty() {
        return Ok(SeedReport::default());
    }

    let mut report = SeedReport {
        seeded: true,
        ..SeedReport::default()
    };

    let companies = [
        (
            "ABC Otomotiv",
            Some("Murat Aydin"),
            Some("0555 111 22 33"),
            Some("Sanayi Mah. 12. Sok. No:4"),
        ),
        (
            "Liman Denizcilik",
            Some("Elif Kaya"),
            Some("0532 444 55 66"),
            Some("Rihtim Cad. No:18"),
        ),
        (
            "Yildiz Tekstil",
            None,
            Some("0212 333 00 99"),
            None,
        ),
    ];

    let mut customer_ids = Vec::new();
    for (name, contact, phone, address) in companies {
        let customer = store.create_customer(&NewCustomer {
            name: name.to_string(),
            contact_name: contact.map(String::from),
            phone: phone.map(String::from),
            email: None,
            address: address.map(String::from),
            notes: None,
        })?;
        customer_ids.push(customer.id);
        report.customers += 1;
    }

    let fill = today;
    let expiry = fill + Months::new(12);
    let tube_specs: [(usize, &str, f64); 5] = [
        (0, "KKT", 6.0),
        (0, "KKT", 12.0),
        (1, "CO2", 5.0),
        (1, "KKT", 6.0),
        (2, "KOPUK", 9.0),
    ];

    let mut first_tube_id = None;
    for (owner, type_code, weight) in tube_specs {
        let tube = store.create_tube_on(
            &NewTube {
                customer_id: customer_ids[owner],
                type_code: type_code.to_string(),
                weight_kg: Some(weight),
                fill_date: Some(fill),
                expiry_date: Some(expiry),
                qr_path: None,
            },
            today,
        )?;
        first_tube_id.get_or_insert(tube.id);
        report.tubes += 1;
    }

    if let Some(tube_id) = first_tube_id {
        store.create_certificate(&NewCertificate {
            tube_id,
            issue_date: today,
            issuer: Some("Servis Teknisyeni".to_string()),
            pdf_path: None,
            vessel_name: None,
            imo_number: None,
        })?;
        report.certificates += 1;
    }

    for (type_code, weight, unit, refill) in [
        ("KKT", Some(6.0), 450.0, Some(180.0)),
        ("KKT", Some(12.0), 700.0, Some(260.0)),
        ("CO2", Some(5.0), 950.0, Some(400.0)),
    ] {
        store.save_price(&PriceInput {
            type_code: type_code.to_string(),
            weight_kg: weight,
            category: "standart".to_string(),
            unit_price: unit,
            refill_price: refill,
            valve_price: None,
            hose_price: None,
            gauge_price: None,
        })?;
        report.prices += 1;
    }

    store.create_quote_on(
        &QuoteDraft {
            customer_id: customer_ids[0],
            items: vec![
                QuoteItemDraft {
                    description: "6 kg KKT dolum".to_string(),
                    quantity: 2.0,
                    unit_price: 180.0,
                },
                QuoteItemDraft {
                    description: "Yillik bakim".to_string(),
                    quantity: 1.0,
                    unit_price: 350.0,
                },
            ],
            tax_rate: 20.0,
            currency: "TRY".to_string(),
            valid_until: Some(today + Months::new(1)),
            notes: None,
        },
        today,
    )?;
    report.quotes += 1;

    info!(
        year = today.year(),
        customers = report.customers,
        tubes = report.tubes,
        "demo data seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubeledger_core::TubeFilter;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn empty_store() -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn seeds_only_when_empty() {
        let mut store = empty_store();
        let first = seed_demo(&mut store, fixed_today()).unwrap();
        assert!(first.seeded);
        assert_eq!(first.customers, 3);
        assert_eq!(first.tubes, 5);

        let second = seed_demo(&mut store, fixed_today()).unwrap();
        assert!(!second.seeded);
        assert_eq!(store.list_customers(&Default::default()).unwrap().len(), 3);
    }

    #[test]
    fn seeded_serials_come_from_the_sequence_service() {
        let mut store = empty_store();
        seed_demo(&mut store, fixed_today()).unwrap();

        let tubes = store.list_tubes(&TubeFilter::default()).unwrap();
        let serials: Vec<&str> = tubes.iter().map(|t| t.serial.as_str()).collect();
        assert!(serials.contains(&"2026-0001"));
        assert!(serials.contains(&"2026-0005"));

        let certificates = store.list_certificates(None, None).unwrap();
        assert_eq!(certificates.len(), 1);
        assert_eq!(certificates[0].number, "CERT-2026-00001");
    }

    #[test]
    fn seed_is_deterministic_for_a_fixed_date() {
        let mut a = empty_store();
        let mut b = empty_store();
        seed_demo(&mut a, fixed_today()).unwrap();
        seed_demo(&mut b, fixed_today()).unwrap();

        let quotes_a = a.list_quotes(None).unwrap();
        let quotes_b = b.list_quotes(None).unwrap();
        assert_eq!(quotes_a.len(), quotes_b.len());
        assert_eq!(quotes_a[0].number, quotes_b[0].number);
        assert_eq!(quotes_a[0].total, quotes_b[0].total);
    }
}
