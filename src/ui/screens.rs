//! Built-in preference screens

use crate::error::BooksResult;
use crate::preferences::keys;
use crate::repository::Repository;

use super::settings::{PreferenceItem, PreferenceScreen};

pub struct GeneralPreferences;

impl GeneralPreferences {
    pub const NAME: &'static str = "general";
}

impl PreferenceScreen for GeneralPreferences {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Settings"
    }

    fn items(&self, repository: &Repository) -> BooksResult<Vec<PreferenceItem>> {
        let active = repository.storage().books().active_book()?;
        Ok(vec![
            PreferenceItem::new(BookManager::NAME, "Manage books", active.display_name),
            PreferenceItem::new(AccountPreferences::NAME, "Accounts", "Currency, import, export"),
            PreferenceItem::new(
                TransactionPreferences::NAME,
                "Transactions",
                "Double entry, opening balances",
            ),
            PreferenceItem::new(BackupPreferences::NAME, "Backup & export", "Backups, Dropbox"),
        ])
    }
}

/// Every book, the active one marked
pub struct BookManager;

impl BookManager {
    pub const NAME: &'static str = "book_manager";
}

impl PreferenceScreen for BookManager {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Manage books"
    }

    fn items(&self, repository: &Repository) -> BooksResult<Vec<PreferenceItem>> {
        repository
            .storage()
            .books()
            .get_all()?
            .into_iter()
            .map(|book| {
                let opened = book
                    .last_opened_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".into());
                let summary = if book.active {
                    format!("Active, last opened {}", opened)
                } else {
                    format!("Last opened {}", opened)
                };
                Ok(PreferenceItem::new(book.uid.as_str(), &book.display_name, summary))
            })
            .collect()
    }
}

pub struct AccountPreferences;

impl AccountPreferences {
    pub const NAME: &'static str = "accounts";
}

impl PreferenceScreen for AccountPreferences {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Account settings"
    }

    fn items(&self, repository: &Repository) -> BooksResult<Vec<PreferenceItem>> {
        let accounts = repository.storage().ledger()?.accounts.count()?;
        Ok(vec![
            PreferenceItem::new(
                keys::DEFAULT_CURRENCY,
                "Default currency",
                repository.preferences().default_currency()?,
            ),
            PreferenceItem::new("import_accounts", "Import accounts", "gnucash-books import <FILE>"),
            PreferenceItem::new(
                "export_accounts_csv",
                "Export accounts as CSV",
                "gnucash-books export --format csv-accounts",
            ),
            PreferenceItem::new(
                "create_default_accounts",
                "Create default accounts",
                "gnucash-books account defaults",
            ),
            PreferenceItem::new(
                "delete_all_accounts",
                "Delete all accounts",
                format!("{} accounts in this book", accounts),
            ),
        ])
    }
}

pub struct TransactionPreferences;

impl TransactionPreferences {
    pub const NAME: &'static str = "transactions";
}

impl PreferenceScreen for TransactionPreferences {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Transaction settings"
    }

    fn items(&self, repository: &Repository) -> BooksResult<Vec<PreferenceItem>> {
        let prefs = repository.preferences();
        let transactions = repository.storage().ledger()?.transactions.count()?;
        Ok(vec![
            PreferenceItem::new(
                keys::USE_DOUBLE_ENTRY,
                "Use double entry",
                on_off(prefs.is_double_entry_enabled()?),
            ),
            PreferenceItem::new(
                keys::SAVE_OPENING_BALANCES,
                "Save opening balances",
                on_off(prefs.should_save_opening_balances()?),
            ),
            PreferenceItem::new(
                "delete_all_transactions",
                "Delete all transactions",
                format!("{} transactions in this book", transactions),
            ),
        ])
    }
}

pub struct BackupPreferences;

impl BackupPreferences {
    pub const NAME: &'static str = "backup";
}

impl PreferenceScreen for BackupPreferences {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Backup & export"
    }

    fn items(&self, repository: &Repository) -> BooksResult<Vec<PreferenceItem>> {
        let active = repository.storage().books().active_book_uid()?;
        let backups = repository.get_backup_list(&active)?;
        let latest = backups
            .first()
            .map(|b| b.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "No backups yet".into());
        let last_export = repository
            .preferences()
            .get_active_book_shared_preferences()?
            .get_i64(keys::LAST_EXPORT_TIME, 0)?;
        let last_export = chrono::DateTime::from_timestamp(last_export, 0)
            .filter(|_| last_export > 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Never".into());

        Ok(vec![
            PreferenceItem::new("create_backup", "Create backup", latest),
            PreferenceItem::new(
                "restore_backup",
                "Restore backup",
                format!("{} backups available", backups.len()),
            ),
            PreferenceItem::new(keys::LAST_EXPORT_TIME, "Last export", last_export),
        ])
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "On"
    } else {
        "Off"
    }
}
