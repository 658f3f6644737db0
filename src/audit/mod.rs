//! Audit log of book-level operations
//!
//! Creating, activating, backing up, restoring, importing, exporting and
//! deleting books each append one [`AuditEntry`] to `audit.log`, a
//! line-delimited JSON file read back by `gnucash-books audit`.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
