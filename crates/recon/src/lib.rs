//! `clubfund-recon` — contribution/fee reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded sheet grids, returns an updated
//! workbook model plus run counters. No CLI or file-format dependencies.

pub mod aggregate;
pub mod config;
pub mod donor;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fiscal;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod money;
pub mod refs;
pub mod review;
pub mod store;
#[cfg(test)]
pub(crate) mod testutil;
pub mod workbook;

pub use config::ReconConfig;
pub use engine::{run, RunInput};
pub use error::ReconError;
pub use model::{AggregatedTransaction, ReconciledEntry, RunOutput, RunSummary};
pub use store::{EntryStore, MemoryStore, StoreError, StoredEntry};
pub use workbook::{Cell, Sheet, Workbook};
