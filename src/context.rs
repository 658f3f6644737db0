//! Composition root
//!
//! [`AppContext`] owns the one books registry of the process and wires every
//! service to it. `repository()` and `dropbox_helper()` return the same
//! instance on every call.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::backup::{BackupManager, RestoreManager};
use crate::config::paths::BookPaths;
use crate::config::settings::Settings;
use crate::error::BooksResult;
use crate::export::{DropboxHelper, Exporter};
use crate::importer::ArchiveImporter;
use crate::preferences::PreferencesManager;
use crate::repository::Repository;
use crate::storage::{initialize_storage, Storage};
use crate::ui::settings::{ScreenRegistry, SettingsHost};

pub struct AppContext {
    paths: BookPaths,
    settings: Settings,
    storage: Arc<Storage>,
    preferences: Arc<PreferencesManager>,
    repository: OnceLock<Arc<Repository>>,
    dropbox: OnceLock<Arc<DropboxHelper>>,
}

impl AppContext {
    /// Open existing data under `paths` without creating a first book
    pub fn open(paths: BookPaths) -> BooksResult<Self> {
        let settings = Settings::load_or_create(&paths)?;
        let storage = Arc::new(Storage::open(paths.clone())?);
        let preferences = Arc::new(PreferencesManager::new(
            paths.clone(),
            Arc::clone(storage.books()),
        ));

        Ok(Self {
            paths,
            settings,
            storage,
            preferences,
            repository: OnceLock::new(),
            dropbox: OnceLock::new(),
        })
    }

    /// Open data under `paths`, creating and activating a first book when
    /// there is none
    pub fn initialize(paths: BookPaths) -> BooksResult<Self> {
        let ctx = Self::open(paths)?;
        if let Some(book) = initialize_storage(&ctx.storage)? {
            info!(book = %book, "Initialized data directory");
        }
        Ok(ctx)
    }

    pub fn paths(&self) -> &BookPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn preferences(&self) -> &Arc<PreferencesManager> {
        &self.preferences
    }

    pub fn repository(&self) -> Arc<Repository> {
        Arc::clone(self.repository.get_or_init(|| {
            let books = Arc::clone(self.storage.books());
            let backups = BackupManager::new(
                self.paths.clone(),
                Arc::clone(&books),
                Arc::clone(&self.preferences),
                self.settings.backup_retention.clone(),
            );
            let restore = RestoreManager::new(
                self.paths.clone(),
                books,
                Arc::clone(&self.preferences),
            );
            let importer = Arc::new(ArchiveImporter::new(Arc::clone(&self.preferences)));

            Arc::new(Repository::new(
                Arc::clone(&self.storage),
                Arc::clone(&self.preferences),
                backups,
                restore,
                importer,
                self.settings.backup_interval(),
            ))
        }))
    }

    pub fn dropbox_helper(&self) -> Arc<DropboxHelper> {
        Arc::clone(
            self.dropbox
                .get_or_init(|| Arc::new(DropboxHelper::new(self.paths.clone()))),
        )
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::new(self.repository(), self.dropbox_helper())
    }

    pub fn settings_host(&self) -> SettingsHost {
        SettingsHost::new(ScreenRegistry::with_defaults(), self.repository())
    }
}
