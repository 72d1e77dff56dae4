//! Year-scoped sequence identifiers.
//!
//! Every serial and document number in the system is minted from a
//! per-(kind, year) counter and rendered through a fixed, kind-specific
//! template. The formatting lives here so the store and its callers agree
//! on the external form without touching the database.
//!
//! # Examples
//!
//! ```
//! use tubeledger_core::SequenceKind;
//!
//! assert_eq!(SequenceKind::Tube.format(2026, 1), "2026-0001");
//! assert_eq!(SequenceKind::Certificate.format(2026, 1), "CERT-2026-00001");
//! ```

use serde::{Deserialize, Serialize};

/// The counter families the sequence service maintains.
///
/// Counters are scoped by `(kind, year)`; a new year starts every kind
/// fresh at 1 while prior years' counters are retained for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Tube serial numbers: `YYYY-0001`.
    Tube,
    /// Certificate numbers: `CERT-YYYY-00001`.
    Certificate,
    /// Quote numbers: `QT-YYYY-0001`.
    Quote,
    /// Contract numbers: `CN-YYYY-0001`.
    Contract,
}

impl SequenceKind {
    /// Storage key for the counter row.
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceKind::Tube => "tube",
            SequenceKind::Certificate => "certificate",
            SequenceKind::Quote => "quote",
            SequenceKind::Contract => "contract",
        }
    }

    /// Parses the stored key back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tube" => Some(SequenceKind::Tube),
            "certificate" => Some(SequenceKind::Certificate),
            "quote" => Some(SequenceKind::Quote),
            "contract" => Some(SequenceKind::Contract),
            _ => None,
        }
    }

    /// Renders the external identifier for a `(year, number)` pair.
    pub fn format(&self, year: i32, number: i64) -> String {
        match self {
            SequenceKind::Tube => format!("{year}-{number:04}"),
            SequenceKind::Certificate => format!("CERT-{year}-{number:05}"),
            SequenceKind::Quote => format!("QT-{year}-{number:04}"),
            SequenceKind::Contract => format!("CN-{year}-{number:04}"),
        }
    }
}

/// A freshly issued identifier, as returned by the sequence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedSerial {
    /// The external, human-readable form.
    pub formatted: String,
    /// Calendar year the counter was scoped to.
    pub year: i32,
    /// Raw within-year sequence number.
    pub number: i64,
}
