//! Book backups
//!
//! - `BackupManager`: creates per-book backups and prunes them
//! - `RestoreManager`: validates and restores them
//!
//! # Backup Format
//!
//! A backup is a JSON [`BookArchive`]:
//! - `schema_version`: version for migration support
//! - `created_at`: when the backup was taken
//! - `book`: the registry record
//! - `accounts`, `transactions`: the ledger
//! - `preferences`: the book's preference store
//!
//! # Retention Policy
//!
//! Per book, the defaults keep:
//! - 30 daily backups
//! - 12 monthly backups (first backup of each month)

mod archive;
mod manager;
mod restore;

pub use archive::{BookArchive, ARCHIVE_SCHEMA_VERSION};
pub use manager::{BackupInfo, BackupManager};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
