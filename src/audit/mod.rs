//! Audit logging for MendozaContas
//!
//! Every create, update and delete on the ledger is appended to
//! `audit.log` as one JSON object per line, with the record's state before
//! and after the change.
//!
//! - `AuditEntry`: one logged operation.
//! - `AuditLogger`: appends entries to the JSONL file and reads them back.
//! - `generate_diff`: short summary of the fields an update changed.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
