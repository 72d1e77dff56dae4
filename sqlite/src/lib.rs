//! Embedded SQLite store for the tubeledger back office.
//!
//! This crate is the persistence core everything else depends on: the
//! schema and its additive migration engine, the year-scoped sequence
//! service that mints tube serials and document numbers, and the typed
//! repositories the desktop shell calls through a narrow CRUD/query
//! surface.
//!
//! # Architecture
//!
//! - **`store`**: the [`Store`] handle owning the single connection
//! - **`schema`**: base DDL, created on first use, never altered here
//! - **`migration`**: versioned additive steps with a persisted marker
//! - **`sequence`**: per-(kind, year) counters behind [`SequenceKind`]
//! - **`repo`**: CRUD and filtered queries per entity
//! - **`backup`**: logical JSON snapshot export/restore
//! - **`seed`**: deterministic demo data for an empty store
//!
//! # Quick start
//!
//! ```no_run
//! use tubeledger_core::{NewCustomer, NewTube};
//! use tubeledger_sqlite::Store;
//!
//! let mut store = Store::init("./data").unwrap();
//!
//! let customer = store
//!     .create_customer(&NewCustomer::named("ABC Otomotiv"))
//!     .unwrap();
//! let tube = store
//!     .create_tube(&NewTube {
//!         customer_id: customer.id,
//!         type_code: "KKT".into(),
//!         weight_kg: Some(6.0),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! println!("minted serial {}", tube.serial);
//! ```
//!
//! # Concurrency model
//!
//! Single process, single writer: the file is opened exclusively by one
//! local application instance and all access is serialized through the
//! [`Store`] handle. Counter increments commit together with the insert
//! they serve; a crash in between can skip a value but never repeats
//! one.

mod backup;
mod error;
mod migration;
mod repo;
mod schema;
mod seed;
mod sequence;
mod store;

pub use backup::{SNAPSHOT_VERSION, Snapshot};
pub use error::{Result, StoreError};
pub use migration::MigrationReport;
pub use seed::{SeedReport, seed_demo};
pub use store::{ARTIFACT_DIRS, DB_FILE, Store, StoreStatus};

pub use tubeledger_core::SequenceKind;
