//! `concilia-recon`: bank statement reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables (bank statement, payables,
//! receivables, payment complements), returns annotated tables plus a
//! summary. CSV helpers on [`Table`] are the only I/O it offers.

pub mod annotate;
pub mod complements;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod followup;
pub mod ledger;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod ordering;
pub mod rules;
pub mod schema;
pub mod similarity;
pub mod statement;
pub mod summary;
pub mod table;

pub use config::{Mode, ReconConfig};
pub use engine::run;
pub use error::ReconError;
pub use model::{ReconInput, ReconResult, Status};
pub use summary::ReconSummary;
pub use table::{Table, Value};
