//! Exporting the active book
//!
//! Formats:
//! - JSON / YAML: a full [`BookArchive`], importable again
//! - CSV: the account tree, or the transactions one row per split
//!
//! Files are generated under `exports/<bookUID>/` and then moved to the
//! target: a local directory or Dropbox.

pub mod csv;
pub mod dropbox;

pub use dropbox::{DropboxClient, DropboxHelper};

use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::{AuditEntry, Operation};
use crate::backup::BookArchive;
use crate::error::{BooksError, BooksResult};
use crate::models::{Book, BookUid};
use crate::preferences::keys;
use crate::repository::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Json,
    Yaml,
    CsvAccounts,
    CsvTransactions,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::CsvAccounts | Self::CsvTransactions => "csv",
        }
    }

    fn file_suffix(&self) -> &'static str {
        match self {
            Self::Json | Self::Yaml => "",
            Self::CsvAccounts => "_accounts",
            Self::CsvTransactions => "_transactions",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::CsvAccounts => "csv-accounts",
            Self::CsvTransactions => "csv-transactions",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = BooksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv-accounts" | "csva" => Ok(Self::CsvAccounts),
            "csv-transactions" | "csvt" | "csv" => Ok(Self::CsvTransactions),
            other => Err(BooksError::Validation(format!(
                "Unknown export format '{}'. Use json, yaml, csv-accounts or csv-transactions",
                other
            ))),
        }
    }
}

/// Where exported files end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Directory(PathBuf),
    Dropbox,
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Dropbox => f.write_str("Dropbox"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportParams {
    pub format: ExportFormat,
    pub target: ExportTarget,
    /// Back up, then delete the exported transactions
    pub delete_transactions_after_export: bool,
}

impl ExportParams {
    pub fn new(format: ExportFormat, target: ExportTarget) -> Self {
        Self {
            format,
            target,
            delete_transactions_after_export: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub book_uid: BookUid,
    /// Final locations: local paths, or Dropbox paths such as `/book.json`
    pub destinations: Vec<String>,
    pub transactions_deleted: Option<usize>,
}

/// Generates exports of the active book and delivers them
pub struct Exporter {
    repository: Arc<Repository>,
    dropbox: Arc<DropboxHelper>,
}

impl Exporter {
    pub fn new(repository: Arc<Repository>, dropbox: Arc<DropboxHelper>) -> Self {
        Self {
            repository,
            dropbox,
        }
    }

    pub fn export(&self, params: &ExportParams) -> BooksResult<ExportResult> {
        let storage = self.repository.storage();
        let book = storage.books().active_book()?;
        let ledger = storage.ledger()?;

        let nothing = match params.format {
            ExportFormat::Json | ExportFormat::Yaml => ledger.is_empty()?,
            ExportFormat::CsvAccounts => ledger.accounts.count()? == 0,
            ExportFormat::CsvTransactions => ledger.transactions.count()? == 0,
        };
        if nothing {
            return Err(BooksError::Export(format!(
                "Nothing to export from '{}'",
                book.display_name
            )));
        }

        let staging_dir = storage.paths().export_dir(book.uid.as_str());
        fs::create_dir_all(&staging_dir)
            .map_err(|e| BooksError::Export(format!("Failed to create export directory: {}", e)))?;
        let staged = staging_dir.join(export_filename(&book, params.format));

        match params.format {
            ExportFormat::Json | ExportFormat::Yaml => {
                let prefs = self
                    .repository
                    .preferences()
                    .get_book_shared_preferences(&book.uid)?
                    .all()?;
                let archive = BookArchive::capture(&book, &ledger, prefs)?;
                if params.format == ExportFormat::Json {
                    archive.write_json(&staged)?;
                } else {
                    archive.write_yaml(&staged)?;
                }
            }
            ExportFormat::CsvAccounts => {
                csv::write_accounts_csv(&ledger.accounts.get_all()?, create_file(&staged)?)?;
            }
            ExportFormat::CsvTransactions => {
                csv::write_transactions_csv(
                    &ledger.transactions.get_all()?,
                    &ledger.accounts.get_all()?,
                    create_file(&staged)?,
                )?;
            }
        }

        let destinations = vec![self.move_to_target(&staged, &params.target)?];
        info!(
            book = %book.uid,
            format = %params.format,
            target = %params.target,
            "Exported book"
        );

        self.repository
            .preferences()
            .get_book_shared_preferences(&book.uid)?
            .edit()
            .put_i64(keys::LAST_EXPORT_TIME, Utc::now().timestamp())
            .apply()?;

        let transactions_deleted = if params.delete_transactions_after_export {
            let preserve = self.repository.preferences().should_save_opening_balances()?;
            Some(self.repository.delete_all_transactions(preserve)?)
        } else {
            None
        };

        self.repository.audit().record(
            AuditEntry::for_book(Operation::Export, &book).with_details(&serde_json::json!({
                "format": params.format,
                "destinations": destinations,
                "transactions_deleted": transactions_deleted,
            })),
        );

        Ok(ExportResult {
            book_uid: book.uid,
            destinations,
            transactions_deleted,
        })
    }

    fn move_to_target(&self, staged: &Path, target: &ExportTarget) -> BooksResult<String> {
        let filename = staged
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BooksError::Export("Export file has no name".into()))?;

        match target {
            ExportTarget::Directory(dir) => {
                fs::create_dir_all(dir).map_err(|e| {
                    BooksError::Export(format!("Failed to create {}: {}", dir.display(), e))
                })?;
                let destination = dir.join(&filename);
                move_file(staged, &destination)?;
                Ok(destination.display().to_string())
            }
            ExportTarget::Dropbox => {
                let remote = format!("/{}", filename);
                self.dropbox.client()?.upload(staged, &remote)?;
                if let Err(e) = fs::remove_file(staged) {
                    warn!(path = %staged.display(), error = %e, "Failed to remove staged export");
                }
                Ok(remote)
            }
        }
    }
}

/// `20250314_093000_gnucash_export_Household_accounts.csv`
fn export_filename(book: &Book, format: ExportFormat) -> String {
    let name: String = book
        .display_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "{}_gnucash_export_{}{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        name,
        format.file_suffix(),
        format.extension()
    )
}

fn create_file(path: &Path) -> BooksResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| BooksError::Export(format!("Failed to create {}: {}", path.display(), e)))
}

/// Rename, falling back to copy + delete across file systems
fn move_file(from: &Path, to: &Path) -> BooksResult<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(|e| {
        BooksError::Export(format!("Failed to copy export to {}: {}", to.display(), e))
    })?;
    if let Err(e) = fs::remove_file(from) {
        warn!(path = %from.display(), error = %e, "Failed to remove staged export");
    }
    Ok(())
}
