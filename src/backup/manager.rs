//! Per-book backup creation and retention
//!
//! Each book has its own directory under `backups/`, holding timestamped
//! [`BookArchive`] files named `backup-YYYYMMDD-HHMMSS-mmm.json`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::paths::BookPaths;
use crate::config::settings::BackupRetention;
use crate::error::{BooksError, BooksResult};
use crate::models::BookUid;
use crate::preferences::PreferencesManager;
use crate::storage::{BooksDbAdapter, Ledger};

use super::archive::BookArchive;

/// Metadata about a backup file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    pub book_uid: BookUid,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// First backup of its calendar month (kept under the monthly quota)
    pub is_monthly: bool,
}

/// Creates backups of books and prunes old ones
pub struct BackupManager {
    paths: BookPaths,
    books: Arc<BooksDbAdapter>,
    preferences: Arc<PreferencesManager>,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(
        paths: BookPaths,
        books: Arc<BooksDbAdapter>,
        preferences: Arc<PreferencesManager>,
        retention: BackupRetention,
    ) -> Self {
        Self {
            paths,
            books,
            preferences,
            retention,
        }
    }

    /// Back up one book, then apply the retention policy to its backups
    ///
    /// Returns the path of the new backup file.
    pub fn backup_book(&self, book_uid: &BookUid) -> BooksResult<PathBuf> {
        let book = self
            .books
            .get_record(book_uid)?
            .ok_or_else(|| BooksError::book_not_found(book_uid.as_str()))?;

        let ledger = Ledger::open(&self.paths, book_uid)?;
        let preferences = self
            .preferences
            .get_book_shared_preferences(book_uid)?
            .all()?;
        let archive = BookArchive::capture(&book, &ledger, preferences)?;

        let dir = self.paths.book_backup_dir(book_uid.as_str());
        fs::create_dir_all(&dir)
            .map_err(|e| BooksError::Backup(format!("Failed to create backup directory: {}", e)))?;

        let path = unused_backup_path(&dir, archive.created_at);
        archive
            .write_json(&path)
            .map_err(|e| BooksError::Backup(format!("Failed to write backup: {}", e)))?;
        info!(book = %book_uid, path = %path.display(), "Created backup");

        let pruned = self.enforce_retention(book_uid)?;
        if !pruned.is_empty() {
            debug!(book = %book_uid, pruned = pruned.len(), "Pruned old backups");
        }

        Ok(path)
    }

    pub fn backup_active_book(&self) -> BooksResult<PathBuf> {
        let active = self.books.active_book_uid()?;
        self.backup_book(&active)
    }

    /// Back up every registered book, returning the created paths
    pub fn backup_all_books(&self) -> BooksResult<Vec<PathBuf>> {
        self.books
            .get_all_book_uids()?
            .iter()
            .map(|uid| self.backup_book(uid))
            .collect()
    }

    /// Backups of a book, newest first
    pub fn list_backups(&self, book_uid: &BookUid) -> BooksResult<Vec<BackupInfo>> {
        let dir = self.paths.book_backup_dir(book_uid.as_str());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        let entries = fs::read_dir(&dir)
            .map_err(|e| BooksError::Io(format!("Failed to read backup directory: {}", e)))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| BooksError::Io(format!("Failed to read directory entry: {}", e)))?;
            if let Some(info) = parse_backup_info(&entry.path(), book_uid) {
                backups.push(info);
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mark_monthly(&mut backups);
        Ok(backups)
    }

    pub fn latest_backup(&self, book_uid: &BookUid) -> BooksResult<Option<BackupInfo>> {
        Ok(self.list_backups(book_uid)?.into_iter().next())
    }

    /// Look a backup up by file name
    pub fn get_backup(&self, book_uid: &BookUid, filename: &str) -> BooksResult<Option<BackupInfo>> {
        Ok(self
            .list_backups(book_uid)?
            .into_iter()
            .find(|b| b.filename == filename))
    }

    /// Delete backups beyond the daily and monthly quotas, oldest first
    pub fn enforce_retention(&self, book_uid: &BookUid) -> BooksResult<Vec<PathBuf>> {
        let (monthly, daily): (Vec<_>, Vec<_>) = self
            .list_backups(book_uid)?
            .into_iter()
            .partition(|b| b.is_monthly);

        let expired = daily
            .into_iter()
            .skip(self.retention.daily_count as usize)
            .chain(monthly.into_iter().skip(self.retention.monthly_count as usize));

        let mut deleted = Vec::new();
        for backup in expired {
            fs::remove_file(&backup.path)
                .map_err(|e| BooksError::Backup(format!("Failed to delete old backup: {}", e)))?;
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Back up `book_uid` when its newest backup is older than `interval`
    pub fn backup_if_due(&self, book_uid: &BookUid, interval: Duration) -> BooksResult<Option<PathBuf>> {
        let due = match self.latest_backup(book_uid)? {
            Some(latest) => Utc::now() - latest.created_at >= interval,
            None => true,
        };

        if due {
            self.backup_book(book_uid).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn retention(&self) -> &BackupRetention {
        &self.retention
    }
}

fn backup_filename(timestamp: DateTime<Utc>) -> String {
    format!(
        "backup-{}-{:03}.json",
        timestamp.format("%Y%m%d-%H%M%S"),
        timestamp.timestamp_subsec_millis()
    )
}

/// Two backups in the same millisecond get distinct names
fn unused_backup_path(dir: &Path, mut timestamp: DateTime<Utc>) -> PathBuf {
    loop {
        let path = dir.join(backup_filename(timestamp));
        if !path.exists() {
            return path;
        }
        timestamp += Duration::milliseconds(1);
    }
}

fn parse_backup_info(path: &Path, book_uid: &BookUid) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_str()?.to_string();
    let stamp = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        book_uid: book_uid.clone(),
        created_at,
        size_bytes,
        is_monthly: false,
    })
}

/// Flag the oldest backup of every month; `backups` is newest first
fn mark_monthly(backups: &mut [BackupInfo]) {
    let mut seen = HashSet::new();
    for backup in backups.iter_mut().rev() {
        let month = (backup.created_at.year(), backup.created_at.month());
        backup.is_monthly = seen.insert(month);
    }
}

/// Parse `YYYYMMDD-HHMMSS` or `YYYYMMDD-HHMMSS-mmm`
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = stamp.split('-').collect();
    let (date_part, time_part, millis) = match parts.as_slice() {
        [date, time] => (*date, *time, "000"),
        [date, time, millis] => (*date, *time, *millis),
        _ => return None,
    };

    // Byte slicing below is only sound on ASCII digits
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if date_part.len() != 8
        || time_part.len() != 6
        || millis.len() != 3
        || !all_digits(date_part)
        || !all_digits(time_part)
        || !all_digits(millis)
    {
        return None;
    }
    let millis: u32 = millis.parse().ok()?;

    let date = NaiveDate::from_ymd_opt(
        date_part[0..4].parse().ok()?,
        date_part[4..6].parse().ok()?,
        date_part[6..8].parse().ok()?,
    )?;
    let time = chrono::NaiveTime::from_hms_milli_opt(
        time_part[0..2].parse().ok()?,
        time_part[2..4].parse().ok()?,
        time_part[4..6].parse().ok()?,
        millis,
    )?;

    Some(DateTime::from_naive_utc_and_offset(
        chrono::NaiveDateTime::new(date, time),
        Utc,
    ))
}
