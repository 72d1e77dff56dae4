//! Data model for the tubeledger service back office.
//!
//! This crate defines the entities managed by the persistence layer:
//! customers, tubes, certificates, prices, quotes, contracts, settings,
//! and activity records, together with the year-scoped sequence
//! identifier formats used for tube serials and document numbers.
//!
//! The types carry no database logic; the `tubeledger-sqlite` crate maps
//! them to and from the embedded store. Everything derives [`serde`]
//! traits so entities flow unchanged through JSON snapshots and the IPC
//! boundary to the desktop shell.
//!
//! # Quick start
//!
//! ```
//! use tubeledger_core::{NewCustomer, SequenceKind};
//!
//! let draft = NewCustomer::named("ABC Otomotiv");
//! assert_eq!(draft.name, "ABC Otomotiv");
//!
//! // Serial formats are fixed per kind and year-scoped.
//! assert_eq!(SequenceKind::Tube.format(2026, 2), "2026-0002");
//! ```

mod sequence;
mod types;

pub use sequence::{MintedSerial, SequenceKind};
pub use types::{
    ActivityLog, BulkOutcome, CallLog, Certificate, Contract, ContractDraft, ContractStatus,
    Counter, Customer, CustomerDetails, CustomerFilter, CustomerStatus, ExpiringTube, NewCertificate,
    NewCustomer, NewTube, Price, PriceInput, Quote, QuoteDraft, QuoteItem, QuoteItemDraft,
    QuoteStatus, Report, Settings, Tube, TubeFilter,
};
