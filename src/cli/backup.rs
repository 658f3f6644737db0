//! Backup CLI commands
//!
//! Backups are per book; commands act on the active book unless `--book`
//! names another one.

use clap::Subcommand;
use std::path::PathBuf;

use crate::display::backup::{format_backup_list, format_size};
use crate::error::{BooksError, BooksResult};
use crate::models::BookUid;
use crate::repository::Repository;

use super::book::resolve_book;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup
    Create {
        /// Book to back up (defaults to the active book)
        #[arg(short, long, conflicts_with_all = ["all", "due"])]
        book: Option<String>,
        /// Back up every book
        #[arg(long)]
        all: bool,
        /// Only back up books whose newest backup is older than the interval
        #[arg(long, conflicts_with = "all")]
        due: bool,
    },

    /// List available backups
    List {
        /// Book whose backups to list (defaults to the active book)
        #[arg(short, long)]
        book: Option<String>,
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore a book from a backup
    Restore {
        /// Backup filename or path (use 'latest' for most recent)
        backup: String,
        /// Book to look the backup up for (defaults to the active book)
        #[arg(short, long)]
        book: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show information about a specific backup
    Info {
        /// Backup filename or path
        backup: String,
        #[arg(short, long)]
        book: Option<String>,
    },

    /// Delete old backups according to retention policy
    Prune {
        #[arg(short, long)]
        book: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(repository: &Repository, cmd: BackupCommands) -> BooksResult<()> {
    match cmd {
        BackupCommands::Create { book, all, due } => {
            if due {
                let created = repository.schedule_periodic_backups()?;
                if created.is_empty() {
                    println!("No backups due.");
                }
                for path in created {
                    println!("Backup created: {}", path.display());
                }
                return Ok(());
            }

            if all {
                let created = repository.backup_all_books()?;
                for path in &created {
                    println!("Backup created: {}", path.display());
                }
                println!("Backed up {} book(s).", created.len());
                return Ok(());
            }

            let uid = target_book(repository, book.as_deref())?;
            println!("Creating backup...");
            let backup_path = repository.backup_book(&uid)?;
            let filename = backup_path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| backup_path.display().to_string());
            println!("Backup created: {}", filename);
            println!("Location: {}", backup_path.display());
        }

        BackupCommands::List { book, verbose } => {
            let uid = target_book(repository, book.as_deref())?;
            print!("{}", format_backup_list(&repository.get_backup_list(&uid)?, verbose));
        }

        BackupCommands::Restore {
            backup,
            book,
            force,
        } => {
            let uid = target_book(repository, book.as_deref())?;
            let backup_path = resolve_backup_path(repository, &uid, &backup)?;
            let validation = repository.validate_backup(&backup_path)?;

            println!("Backup Information");
            println!("==================");
            println!("File: {}", backup_path.display());
            println!(
                "Created: {}",
                validation.backup_date.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Schema version: {}", validation.schema_version);
            println!("Contents: {}", validation.summary());
            for problem in &validation.problems {
                println!("  Problem: {}", problem);
            }
            println!();

            if !validation.is_valid() {
                return Err(BooksError::Backup(format!(
                    "Backup has {} problem(s); not restoring",
                    validation.problems.len()
                )));
            }

            if !force {
                println!(
                    "WARNING: This will overwrite all data of '{}'!",
                    validation.book.display_name
                );
                println!("To proceed, run again with --force flag:");
                println!("  gnucash-books backup restore {} --force", backup);
                return Ok(());
            }

            if validation.registered {
                println!("Creating backup of current data before restore...");
                let pre_restore = repository.backup_book(&validation.book.uid)?;
                println!("Pre-restore backup saved: {}", pre_restore.display());
                println!();
            }

            println!("Restoring from backup...");
            let result = repository.restore_book(&backup_path)?;
            println!("Restore complete!");
            println!("{}", result.summary());
            if result.re_registered {
                println!(
                    "\nThe book was not registered and has been added back. Open it with:\n  gnucash-books book open {}",
                    result.book_uid.short()
                );
            }
        }

        BackupCommands::Info { backup, book } => {
            let uid = target_book(repository, book.as_deref())?;
            let backup_path = resolve_backup_path(repository, &uid, &backup)?;
            let validation = repository.validate_backup(&backup_path)?;
            let metadata = std::fs::metadata(&backup_path)?;

            println!("Backup Details");
            println!("==============");
            println!("File: {}", backup_path.display());
            println!("Size: {}", format_size(metadata.len()));
            println!(
                "Created: {}",
                validation.backup_date.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Schema version: {}", validation.schema_version);
            println!();
            println!("Book: {} ({})", validation.book.display_name, validation.book.uid);
            println!(
                "  Registered:   {}",
                if validation.registered { "Yes" } else { "No" }
            );
            println!("  Accounts:     {}", validation.account_count);
            println!("  Transactions: {}", validation.transaction_count);
            println!("  Preferences:  {}", validation.preference_count);
            println!();
            println!(
                "Status: {}",
                if validation.is_valid() { "Valid" } else { "Invalid" }
            );
            for problem in &validation.problems {
                println!("  {}", problem);
            }
        }

        BackupCommands::Prune { book, force } => {
            let uid = target_book(repository, book.as_deref())?;
            let backups = repository.get_backup_list(&uid)?;
            let retention = repository.backup_manager().retention().clone();

            let (monthly, daily): (Vec<_>, Vec<_>) = backups.iter().partition(|b| b.is_monthly);
            let daily_to_delete = daily.len().saturating_sub(retention.daily_count as usize);
            let monthly_to_delete = monthly
                .len()
                .saturating_sub(retention.monthly_count as usize);
            let total_to_delete = daily_to_delete + monthly_to_delete;

            if total_to_delete == 0 {
                println!("No backups to prune.");
                println!(
                    "Current retention policy: {} daily, {} monthly",
                    retention.daily_count, retention.monthly_count
                );
                println!(
                    "You have {} daily and {} monthly backups.",
                    daily.len(),
                    monthly.len()
                );
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!(
                "Retention policy: {} daily, {} monthly",
                retention.daily_count, retention.monthly_count
            );
            println!(
                "To be deleted: {} daily, {} monthly ({} total)",
                daily_to_delete, monthly_to_delete, total_to_delete
            );
            println!();

            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  gnucash-books backup prune --force");
                return Ok(());
            }

            let deleted = repository.backup_manager().enforce_retention(&uid)?;
            println!("Deleted {} backup(s).", deleted.len());
        }
    }

    Ok(())
}

fn target_book(repository: &Repository, book: Option<&str>) -> BooksResult<BookUid> {
    match book {
        Some(identifier) => Ok(resolve_book(repository, identifier)?.uid),
        None => repository.storage().books().active_book_uid(),
    }
}

/// Resolve a backup identifier to a full path
fn resolve_backup_path(
    repository: &Repository,
    book_uid: &BookUid,
    backup: &str,
) -> BooksResult<PathBuf> {
    if backup.eq_ignore_ascii_case("latest") {
        return repository
            .get_book_backup_file_path(book_uid)?
            .ok_or_else(|| BooksError::backup_not_found("latest"));
    }

    let path = PathBuf::from(backup);
    if path.is_file() {
        return Ok(path);
    }

    let manager = repository.backup_manager();
    if let Some(info) = manager.get_backup(book_uid, backup)? {
        return Ok(info.path);
    }
    if let Some(info) = manager.get_backup(book_uid, &format!("{}.json", backup))? {
        return Ok(info.path);
    }

    Err(BooksError::backup_not_found(backup))
}
