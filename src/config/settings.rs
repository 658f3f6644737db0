//! Application settings for gnucash-books
//!
//! Global (not per-book) settings: backup retention, periodic backup
//! interval, the Dropbox access token and logging preferences. Per-book
//! settings live in the preference stores, see [`crate::preferences`].

use serde::{Deserialize, Serialize};

use super::paths::BookPaths;
use crate::error::BooksError;

/// Backup retention settings, applied per book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of daily backups to keep
    pub daily_count: u32,
    /// Number of monthly backups to keep
    pub monthly_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            daily_count: 30,
            monthly_count: 12,
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Hours between periodic backups of each book
    #[serde(default = "default_backup_interval_hours")]
    pub backup_interval_hours: u32,

    /// Dropbox OAuth2 access token, once retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropbox_access_token: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_schema_version() -> u32 {
    1
}

fn default_backup_interval_hours() -> u32 {
    24
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_retention: BackupRetention::default(),
            backup_interval_hours: default_backup_interval_hours(),
            dropbox_access_token: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &BookPaths) -> Result<Self, BooksError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Not persisted until the caller saves
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| BooksError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| BooksError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BookPaths) -> Result<(), BooksError> {
        paths.ensure_directories()?;
        crate::storage::write_json_atomic(paths.settings_file(), self)
    }

    /// Periodic backup interval as a chrono duration
    pub fn backup_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.backup_interval_hours.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.backup_retention.daily_count, 30);
        assert_eq!(settings.backup_retention.monthly_count, 12);
        assert_eq!(settings.backup_interval(), chrono::Duration::hours(24));
        assert!(settings.dropbox_access_token.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.backup_interval_hours = 6;
        settings.dropbox_access_token = Some("sl.token".into());
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backup_interval_hours, 6);
        assert_eq!(loaded.dropbox_access_token.as_deref(), Some("sl.token"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"log_format":"json"}"#).unwrap();
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.backup_interval_hours, 24);
    }
}
