//! Facade over the books registry, the active ledger and backups
//!
//! Front ends talk to books through [`Repository`]. Backup calls are plain
//! delegations; activation rebinds the ledger adapters; imports run on a
//! worker thread and report back through a [`UiHandle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditLogger, EntityType, Operation};
use crate::backup::{BackupInfo, BackupManager, RestoreManager, RestoreResult, ValidationResult};
use crate::error::{BooksError, BooksResult};
use crate::importer::{BookImporter, ImportOutcome, PendingImport};
use crate::models::{Account, Book, BookUid, Transaction};
use crate::preferences::PreferencesManager;
use crate::storage::{self, Storage};

/// The user-facing side of long-running operations
///
/// Every method is called on the thread that started the operation.
pub trait UiHandle {
    fn show_progress(&mut self, title: &str);
    fn dismiss_progress(&mut self);
    fn notify(&mut self, message: &str);
    /// Switch to the ledger (accounts) view of `book`
    fn open_ledger(&mut self, book: &Book);
}

pub struct Repository {
    storage: Arc<Storage>,
    preferences: Arc<PreferencesManager>,
    backups: BackupManager,
    restore: RestoreManager,
    importer: Arc<dyn BookImporter>,
    audit: AuditLogger,
    backup_interval: Duration,
}

impl Repository {
    pub fn new(
        storage: Arc<Storage>,
        preferences: Arc<PreferencesManager>,
        backups: BackupManager,
        restore: RestoreManager,
        importer: Arc<dyn BookImporter>,
        backup_interval: Duration,
    ) -> Self {
        let audit = AuditLogger::new(storage.paths().audit_log());
        Self {
            storage,
            preferences,
            backups,
            restore,
            importer,
            audit,
            backup_interval,
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn preferences(&self) -> &Arc<PreferencesManager> {
        &self.preferences
    }

    pub fn backup_manager(&self) -> &BackupManager {
        &self.backups
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn backup_all_books(&self) -> BooksResult<Vec<PathBuf>> {
        let paths = self.backups.backup_all_books()?;
        self.audit.record(
            AuditEntry::new(Operation::Backup, EntityType::Book, "*")
                .with_details(&serde_json::json!({ "files": display_paths(&paths) })),
        );
        Ok(paths)
    }

    pub fn backup_active_book(&self) -> BooksResult<PathBuf> {
        let active = self.storage.books().active_book_uid()?;
        self.backup_book(&active)
    }

    pub fn backup_book(&self, book_uid: &BookUid) -> BooksResult<PathBuf> {
        let path = self.backups.backup_book(book_uid)?;
        self.audit.record(
            AuditEntry::new(Operation::Backup, EntityType::Book, book_uid.as_str())
                .with_details(&serde_json::json!({ "file": path.display().to_string() })),
        );
        Ok(path)
    }

    /// Newest backup file of a book, if it has any
    pub fn get_book_backup_file_path(&self, book_uid: &BookUid) -> BooksResult<Option<PathBuf>> {
        Ok(self.backups.latest_backup(book_uid)?.map(|b| b.path))
    }

    /// Backups of a book, newest first
    pub fn get_backup_list(&self, book_uid: &BookUid) -> BooksResult<Vec<BackupInfo>> {
        self.backups.list_backups(book_uid)
    }

    /// Back up every book whose newest backup is older than the configured
    /// interval; returns the backups created
    pub fn schedule_periodic_backups(&self) -> BooksResult<Vec<PathBuf>> {
        let mut created = Vec::new();
        for uid in self.storage.books().get_all_book_uids()? {
            if let Some(path) = self.backups.backup_if_due(&uid, self.backup_interval)? {
                created.push(path);
            }
        }
        info!(created = created.len(), "Periodic backup check finished");
        Ok(created)
    }

    /// Restore a book from a backup file
    pub fn restore_book(&self, backup_path: &Path) -> BooksResult<RestoreResult> {
        let result = self.restore.restore_from_file(backup_path)?;

        let active = match self.storage.books().active_book_uid() {
            Ok(uid) => Some(uid),
            Err(BooksError::NoActiveBook) => None,
            Err(e) => return Err(e),
        };
        if active.as_ref() == Some(&result.book_uid) {
            self.storage.initialize_database_adapters()?;
        }

        self.audit.record(
            AuditEntry::new(Operation::Restore, EntityType::Book, result.book_uid.as_str())
                .with_name(result.display_name.clone())
                .with_details(&serde_json::json!({ "file": backup_path.display().to_string() })),
        );
        Ok(result)
    }

    /// Read a backup file without restoring it
    pub fn validate_backup(&self, backup_path: &Path) -> BooksResult<ValidationResult> {
        self.restore.validate_backup(backup_path)
    }

    /// Make `book_uid` the active book and rebind the ledger adapters to it
    pub fn activate_book(&self, book_uid: &BookUid) -> BooksResult<Book> {
        let book = self.storage.books().set_active(book_uid)?;
        self.storage.initialize_database_adapters()?;
        self.audit.record(AuditEntry::for_book(Operation::Activate, &book));
        Ok(book)
    }

    /// Activate a book and show its ledger
    pub fn load_book(&self, book_uid: &BookUid, ui: &mut dyn UiHandle) -> BooksResult<Book> {
        let book = self.activate_book(book_uid)?;
        ui.open_ledger(&book);
        Ok(book)
    }

    /// Import `source` as a new book
    ///
    /// The active book is backed up first. The import itself runs on a
    /// worker thread while `ui` shows progress. On success the new book is
    /// loaded and `on_finish` runs; on failure the user is told why. Either
    /// way the outcome is returned.
    pub fn import_book_file(
        &self,
        source: &Path,
        ui: &mut dyn UiHandle,
        on_finish: Option<Box<dyn FnOnce() + '_>>,
    ) -> BooksResult<ImportOutcome> {
        match self.backup_active_book() {
            Ok(_) | Err(BooksError::NoActiveBook) => {}
            Err(e) => return Err(e),
        }

        let pending = PendingImport::spawn(
            Arc::clone(&self.importer),
            Arc::clone(&self.storage),
            source.to_path_buf(),
        )?;
        ui.show_progress("Importing accounts");
        let outcome = pending.wait();
        ui.dismiss_progress();

        match &outcome {
            ImportOutcome::Succeeded { book_uid } => {
                ui.notify("Accounts successfully imported");
                let book = self.load_book(book_uid, ui)?;
                self.audit.record(
                    AuditEntry::for_book(Operation::Import, &book)
                        .with_details(&serde_json::json!({ "source": source.display().to_string() })),
                );
                if let Some(on_finish) = on_finish {
                    on_finish();
                }
            }
            ImportOutcome::Failed { message } => {
                warn!(source = %source.display(), "Import failed: {}", message);
                ui.notify(&format!("Could not import accounts: {}", message));
            }
        }

        Ok(outcome)
    }

    /// Register a new, empty book
    pub fn create_book(&self, display_name: &str) -> BooksResult<Book> {
        let book = self.storage.create_book(display_name)?;
        self.audit.record(AuditEntry::for_book(Operation::Create, &book));
        Ok(book)
    }

    pub fn rename_book(&self, book_uid: &BookUid, display_name: &str) -> BooksResult<Book> {
        let name = display_name.trim().to_string();
        let book = self
            .storage
            .books()
            .update_record(book_uid, |book| book.display_name = name)?;
        self.audit.record(AuditEntry::for_book(Operation::Update, &book));
        Ok(book)
    }

    /// Delete a book and its ledger; its backups and preferences are kept
    pub fn delete_book(&self, book_uid: &BookUid) -> BooksResult<Book> {
        let book = self.storage.delete_book(book_uid)?;
        self.audit.record(AuditEntry::for_book(Operation::Delete, &book));
        Ok(book)
    }

    /// Back up the active book, then delete all its accounts and transactions
    ///
    /// Returns the number of accounts and transactions deleted.
    pub fn delete_all_accounts(&self) -> BooksResult<(usize, usize)> {
        self.backup_active_book()?;
        let ledger = self.storage.ledger()?;

        let accounts = ledger.accounts.delete_all()?;
        let transactions = ledger.transactions.delete_all()?;
        ledger.save()?;

        self.audit.record(
            AuditEntry::new(Operation::Delete, EntityType::Account, "*")
                .with_name(ledger.book_uid().to_string())
                .with_details(&serde_json::json!({
                    "accounts": accounts,
                    "transactions": transactions,
                })),
        );
        info!(book = %ledger.book_uid(), accounts, transactions, "Deleted all accounts");
        Ok((accounts, transactions))
    }

    /// Back up the active book, then delete every non-template transaction
    ///
    /// With `preserve_opening_balances` the opening-balance transactions are
    /// put back afterwards. Returns the number of transactions removed for
    /// good.
    pub fn delete_all_transactions(&self, preserve_opening_balances: bool) -> BooksResult<usize> {
        self.backup_active_book()?;
        let ledger = self.storage.ledger()?;

        let opening_balances = if preserve_opening_balances {
            ledger.transactions.get_opening_balances()?
        } else {
            Vec::new()
        };

        let deleted = ledger.transactions.delete_all_non_template()?;
        let restored = ledger.transactions.bulk_add(opening_balances)?;
        ledger.save()?;

        let removed = deleted - restored;
        self.audit.record(
            AuditEntry::new(Operation::Delete, EntityType::Transaction, "*")
                .with_name(ledger.book_uid().to_string())
                .with_details(&serde_json::json!({
                    "deleted": removed,
                    "opening_balances_kept": restored,
                })),
        );
        info!(book = %ledger.book_uid(), removed, kept = restored, "Deleted all transactions");
        Ok(removed)
    }

    /// Create the default account tree in the active book
    ///
    /// `currency` defaults to the book's `default_currency` preference.
    pub fn create_default_accounts(&self, currency: Option<&str>) -> BooksResult<Vec<Account>> {
        let currency = match currency {
            Some(c) => c.to_ascii_uppercase(),
            None => self.preferences.default_currency()?,
        };
        let ledger = self.storage.ledger()?;
        storage::create_default_accounts(&ledger, &currency)
    }

    /// Record a transaction in the active book
    ///
    /// Splits must reference existing accounts. When double-entry is enabled
    /// for the book the splits must also sum to zero.
    pub fn add_transaction(&self, transaction: Transaction) -> BooksResult<Transaction> {
        transaction
            .validate()
            .map_err(|e| BooksError::Validation(e.to_string()))?;

        let ledger = self.storage.ledger()?;
        for split in &transaction.splits {
            if ledger.accounts.get(split.account_id)?.is_none() {
                return Err(BooksError::account_not_found(split.account_id.to_string()));
            }
        }

        if self.preferences.is_double_entry_enabled()? && !transaction.is_balanced() {
            return Err(BooksError::Unbalanced {
                description: transaction.description.clone(),
                imbalance: transaction.imbalance().minor(),
            });
        }

        ledger.transactions.upsert(transaction.clone())?;
        ledger.save()?;
        Ok(transaction)
    }
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BookPaths;
    use crate::context::AppContext;
    use crate::models::{AccountType, Money, Split};
    use crate::preferences::keys;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingUi {
        events: Vec<String>,
    }

    impl UiHandle for RecordingUi {
        fn show_progress(&mut self, title: &str) {
            self.events.push(format!("progress:{}", title));
        }
        fn dismiss_progress(&mut self) {
            self.events.push("dismiss".into());
        }
        fn notify(&mut self, message: &str) {
            self.events.push(format!("notify:{}", message));
        }
        fn open_ledger(&mut self, book: &Book) {
            self.events.push(format!("open:{}", book.uid));
        }
    }

    fn context() -> (AppContext, TempDir) {
        let temp = TempDir::new().unwrap();
        let ctx = AppContext::initialize(BookPaths::with_base_dir(temp.path().join("data"))).unwrap();
        (ctx, temp)
    }

    fn export_archive(repo: &Repository, dir: &Path) -> PathBuf {
        repo.create_default_accounts(Some("EUR")).unwrap();
        let path = repo.backup_active_book().unwrap();
        let target = dir.join("household.json");
        std::fs::copy(&path, &target).unwrap();
        target
    }

    fn split_pair(repo: &Repository, amount: i64, other: i64) -> Transaction {
        let ledger = repo.storage().ledger().unwrap();
        let cash = ledger.accounts.get_by_name("Cash in Wallet").unwrap().unwrap();
        let food = ledger.accounts.get_by_name("Groceries").unwrap().unwrap();
        Transaction::new("Lunch", NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(), "USD")
            .with_split(Split::new(food.id, Money::from_minor(amount)))
            .with_split(Split::new(cash.id, Money::from_minor(other)))
    }

    #[test]
    fn test_activate_rebinds_ledger() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let second = repo.create_book("Second").unwrap();

        repo.activate_book(&second.uid).unwrap();

        assert_eq!(repo.storage().ledger().unwrap().book_uid(), &second.uid);
        let prefs = repo.preferences().get_active_book_shared_preferences().unwrap();
        assert_eq!(prefs.name(), second.uid.as_str());
    }

    #[test]
    fn test_load_book_opens_ledger_view() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let second = repo.create_book("Second").unwrap();
        let mut ui = RecordingUi::default();

        repo.load_book(&second.uid, &mut ui).unwrap();

        assert_eq!(ui.events, vec![format!("open:{}", second.uid)]);
    }

    #[test]
    fn test_activate_unknown_book_keeps_active() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let before = repo.storage().books().active_book_uid().unwrap();

        assert!(repo.activate_book(&BookUid::from("missing")).is_err());
        assert_eq!(repo.storage().books().active_book_uid().unwrap(), before);
    }

    #[test]
    fn test_successful_import_activates_new_book_after_backup() {
        let (ctx, temp) = context();
        let repo = ctx.repository();
        let source = export_archive(&repo, temp.path());
        let original = repo.storage().books().active_book_uid().unwrap();
        let backups_before = repo.get_backup_list(&original).unwrap().len();
        let finished = Cell::new(false);
        let mut ui = RecordingUi::default();

        let outcome = repo
            .import_book_file(&source, &mut ui, Some(Box::new(|| finished.set(true))))
            .unwrap();

        let imported = outcome.book_uid().unwrap().clone();
        assert_ne!(imported, original);
        assert_eq!(repo.storage().books().active_book_uid().unwrap(), imported);
        assert_eq!(repo.storage().ledger().unwrap().book_uid(), &imported);
        assert_eq!(repo.get_backup_list(&original).unwrap().len(), backups_before + 1);
        assert!(finished.get());
        assert_eq!(
            ui.events,
            vec![
                "progress:Importing accounts".to_string(),
                "dismiss".to_string(),
                "notify:Accounts successfully imported".to_string(),
                format!("open:{}", imported),
            ]
        );
        let book = repo.storage().books().get_record(&imported).unwrap().unwrap();
        assert_eq!(book.display_name, "household");
    }

    /// Counts the active book's backups at the moment the import starts
    struct BackupCountingImporter {
        inner: crate::importer::ArchiveImporter,
        backup_dir: PathBuf,
        seen: std::sync::Mutex<Option<usize>>,
    }

    impl BookImporter for BackupCountingImporter {
        fn import_book(&self, storage: &Storage, source: &Path) -> BooksResult<BookUid> {
            let count = std::fs::read_dir(&self.backup_dir).map(|d| d.count()).unwrap_or(0);
            *self.seen.lock().unwrap() = Some(count);
            self.inner.import_book(storage, source)
        }
    }

    #[test]
    fn test_backup_is_written_before_import_starts() {
        let (ctx, temp) = context();
        let source = export_archive(&ctx.repository(), temp.path());
        let original = ctx.storage().books().active_book_uid().unwrap();
        let backup_dir = ctx.paths().book_backup_dir(original.as_str());
        let backups_before = std::fs::read_dir(&backup_dir).unwrap().count();

        let importer = Arc::new(BackupCountingImporter {
            inner: crate::importer::ArchiveImporter::new(Arc::clone(ctx.preferences())),
            backup_dir,
            seen: std::sync::Mutex::new(None),
        });
        let books = Arc::clone(ctx.storage().books());
        let repo = Repository::new(
            Arc::clone(ctx.storage()),
            Arc::clone(ctx.preferences()),
            BackupManager::new(
                ctx.paths().clone(),
                Arc::clone(&books),
                Arc::clone(ctx.preferences()),
                ctx.settings().backup_retention.clone(),
            ),
            RestoreManager::new(ctx.paths().clone(), books, Arc::clone(ctx.preferences())),
            Arc::clone(&importer) as Arc<dyn BookImporter>,
            Duration::hours(24),
        );
        let mut ui = RecordingUi::default();

        let outcome = repo.import_book_file(&source, &mut ui, None).unwrap();

        assert!(outcome.book_uid().is_some());
        assert_eq!(*importer.seen.lock().unwrap(), Some(backups_before + 1));
    }

    #[test]
    fn test_failed_import_keeps_active_book() {
        let (ctx, temp) = context();
        let repo = ctx.repository();
        let original = repo.storage().books().active_book_uid().unwrap();
        let source = temp.path().join("broken.json");
        std::fs::write(&source, "not an archive").unwrap();
        let finished = Cell::new(false);
        let mut ui = RecordingUi::default();

        let outcome = repo
            .import_book_file(&source, &mut ui, Some(Box::new(|| finished.set(true))))
            .unwrap();

        assert!(matches!(outcome, ImportOutcome::Failed { .. }));
        assert_eq!(repo.storage().books().active_book_uid().unwrap(), original);
        assert_eq!(repo.storage().books().count().unwrap(), 1);
        assert!(!finished.get());
        assert!(ui.events.last().unwrap().starts_with("notify:Could not import"));
    }

    #[test]
    fn test_unbalanced_rejected_only_in_double_entry() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        repo.create_default_accounts(None).unwrap();

        let err = repo.add_transaction(split_pair(&repo, 500, -400)).unwrap_err();
        assert!(matches!(err, BooksError::Unbalanced { imbalance: 100, .. }));

        repo.preferences()
            .get_active_book_shared_preferences()
            .unwrap()
            .edit()
            .put_bool(keys::USE_DOUBLE_ENTRY, false)
            .apply()
            .unwrap();
        assert!(repo.add_transaction(split_pair(&repo, 500, -400)).is_ok());
    }

    #[test]
    fn test_split_must_reference_known_account() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let stray = Account::new("Elsewhere", AccountType::Asset, None, "USD");
        let txn = Transaction::new("Ghost", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), "USD")
            .with_split(Split::new(stray.id, Money::zero()));

        assert!(repo.add_transaction(txn).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_all_transactions_keeps_opening_balances() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        repo.create_default_accounts(None).unwrap();
        repo.add_transaction(split_pair(&repo, 100, -100)).unwrap();
        let mut opening = split_pair(&repo, 5000, -5000);
        opening.is_opening_balance = true;
        repo.add_transaction(opening).unwrap();

        let removed = repo.delete_all_transactions(true).unwrap();

        assert_eq!(removed, 1);
        let ledger = repo.storage().ledger().unwrap();
        assert_eq!(ledger.transactions.count().unwrap(), 1);
        assert_eq!(ledger.transactions.get_opening_balances().unwrap().len(), 1);

        assert_eq!(repo.delete_all_transactions(false).unwrap(), 1);
    }

    #[test]
    fn test_delete_all_accounts_backs_up_first() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let accounts = repo.create_default_accounts(None).unwrap();
        let uid = repo.storage().books().active_book_uid().unwrap();

        let (deleted, _) = repo.delete_all_accounts().unwrap();

        assert_eq!(deleted, accounts.len());
        assert_eq!(repo.storage().ledger().unwrap().accounts.count().unwrap(), 0);
        let latest = repo.get_book_backup_file_path(&uid).unwrap().unwrap();
        let archive = crate::backup::BookArchive::read_from(&latest).unwrap();
        assert_eq!(archive.accounts.len(), accounts.len());
    }

    #[test]
    fn test_restore_active_book_refreshes_ledger() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let accounts = repo.create_default_accounts(None).unwrap();
        let uid = repo.storage().books().active_book_uid().unwrap();
        let backup = repo.backup_book(&uid).unwrap();
        repo.delete_all_accounts().unwrap();

        repo.restore_book(&backup).unwrap();

        assert_eq!(
            repo.storage().ledger().unwrap().accounts.count().unwrap(),
            accounts.len()
        );
    }

    #[test]
    fn test_periodic_backups_only_when_due() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        repo.create_book("Second").unwrap();

        assert_eq!(repo.schedule_periodic_backups().unwrap().len(), 2);
        assert!(repo.schedule_periodic_backups().unwrap().is_empty());
    }

    #[test]
    fn test_operations_are_audited() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let book = repo.create_book("Audited").unwrap();
        repo.activate_book(&book.uid).unwrap();

        let ops: Vec<_> = repo
            .audit()
            .read_all()
            .unwrap()
            .into_iter()
            .map(|e| e.operation)
            .collect();
        assert!(ops.ends_with(&[Operation::Create, Operation::Activate]));
    }

    #[test]
    fn test_rename_and_delete_book() {
        let (ctx, _temp) = context();
        let repo = ctx.repository();
        let other = repo.create_book("Other").unwrap();

        let renamed = repo.rename_book(&other.uid, "  Savings ").unwrap();
        assert_eq!(renamed.display_name, "Savings");

        repo.delete_book(&other.uid).unwrap();
        assert!(repo.storage().books().get_record(&other.uid).unwrap().is_none());
        assert!(!ctx.paths().book_dir(other.uid.as_str()).exists());

        let active = repo.storage().books().active_book_uid().unwrap();
        assert!(repo.delete_book(&active).unwrap_err().is_validation());
    }
}
