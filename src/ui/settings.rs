//! Settings host: a stack of preference screens
//!
//! Screens are looked up by name in a [`ScreenRegistry`]. The host starts on
//! the general screen, or on the book manager when started with
//! [`ACTION_MANAGE_BOOKS`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::BooksResult;
use crate::repository::Repository;

use super::screens::{
    AccountPreferences, BackupPreferences, BookManager, GeneralPreferences, TransactionPreferences,
};

/// Start action that opens the book manager directly
pub const ACTION_MANAGE_BOOKS: &str = "org.gnucash.android.intent.action.MANAGE_BOOKS";

/// One row of a preference screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceItem {
    pub key: String,
    pub title: String,
    pub summary: String,
}

impl PreferenceItem {
    pub fn new(key: &str, title: &str, summary: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            summary: summary.into(),
        }
    }
}

pub trait PreferenceScreen {
    /// Registry name, e.g. `accounts`
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn items(&self, repository: &Repository) -> BooksResult<Vec<PreferenceItem>>;
}

pub type ScreenFactory = fn() -> Box<dyn PreferenceScreen>;

/// Screen name to constructor
#[derive(Default)]
pub struct ScreenRegistry {
    factories: BTreeMap<&'static str, ScreenFactory>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in screen
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GeneralPreferences::NAME, || Box::new(GeneralPreferences));
        registry.register(BookManager::NAME, || Box::new(BookManager));
        registry.register(AccountPreferences::NAME, || Box::new(AccountPreferences));
        registry.register(TransactionPreferences::NAME, || Box::new(TransactionPreferences));
        registry.register(BackupPreferences::NAME, || Box::new(BackupPreferences));
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: ScreenFactory) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn PreferenceScreen>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

/// Result of the "up" action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateUp {
    /// Went back to the previous screen
    Popped,
    /// Nothing to go back to; the host is done
    Finished,
}

pub struct SettingsHost {
    registry: ScreenRegistry,
    repository: Arc<Repository>,
    current: Option<Box<dyn PreferenceScreen>>,
    back_stack: Vec<Box<dyn PreferenceScreen>>,
    finished: bool,
}

impl SettingsHost {
    pub fn new(registry: ScreenRegistry, repository: Arc<Repository>) -> Self {
        Self {
            registry,
            repository,
            current: None,
            back_stack: Vec::new(),
            finished: false,
        }
    }

    /// Show the first screen for the start `action`
    pub fn on_create(&mut self, action: Option<&str>) {
        let start = match action {
            Some(ACTION_MANAGE_BOOKS) => BookManager::NAME,
            _ => GeneralPreferences::NAME,
        };
        info!(screen = start, "Opening settings");

        self.back_stack.clear();
        self.finished = false;
        self.current = self.registry.create(start);
        if self.current.is_none() {
            warn!(screen = start, "Start screen is not registered");
        }
    }

    /// Open the screen registered as `name` on top of the current one
    ///
    /// Unknown names are logged and ignored; returns whether a screen was
    /// opened.
    pub fn on_preference_start_screen(&mut self, name: &str) -> bool {
        let Some(screen) = self.registry.create(name) else {
            warn!(screen = name, "No preference screen registered under this name");
            return false;
        };

        info!(screen = name, "Opening preference screen");
        if let Some(previous) = self.current.replace(screen) {
            self.back_stack.push(previous);
        }
        true
    }

    pub fn navigate_up(&mut self) -> NavigateUp {
        match self.back_stack.pop() {
            Some(previous) => {
                self.current = Some(previous);
                NavigateUp::Popped
            }
            None => {
                self.current = None;
                self.finished = true;
                NavigateUp::Finished
            }
        }
    }

    pub fn current_screen(&self) -> Option<&dyn PreferenceScreen> {
        self.current.as_deref()
    }

    pub fn back_stack_depth(&self) -> usize {
        self.back_stack.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Items of the current screen; empty when no screen is shown
    pub fn render(&self) -> BooksResult<Vec<PreferenceItem>> {
        match &self.current {
            Some(screen) => screen.items(&self.repository),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BookPaths;
    use crate::context::AppContext;
    use tempfile::TempDir;

    fn host() -> (SettingsHost, TempDir) {
        let temp = TempDir::new().unwrap();
        let ctx = AppContext::initialize(BookPaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        (ctx.settings_host(), temp)
    }

    fn current_name(host: &SettingsHost) -> Option<&'static str> {
        host.current_screen().map(|s| s.name())
    }

    #[test]
    fn test_start_screen_depends_on_action() {
        let (mut host, _temp) = host();

        host.on_create(None);
        assert_eq!(current_name(&host), Some(GeneralPreferences::NAME));

        host.on_create(Some(ACTION_MANAGE_BOOKS));
        assert_eq!(current_name(&host), Some(BookManager::NAME));

        host.on_create(Some("org.gnucash.android.intent.action.SOMETHING_ELSE"));
        assert_eq!(current_name(&host), Some(GeneralPreferences::NAME));
    }

    #[test]
    fn test_unknown_screen_changes_nothing() {
        let (mut host, _temp) = host();
        host.on_create(None);

        assert!(!host.on_preference_start_screen("org.example.NoSuchFragment"));
        assert_eq!(current_name(&host), Some(GeneralPreferences::NAME));
        assert_eq!(host.back_stack_depth(), 0);
    }

    #[test]
    fn test_navigate_up_pops_then_finishes() {
        let (mut host, _temp) = host();
        host.on_create(None);
        assert!(host.on_preference_start_screen(AccountPreferences::NAME));
        assert!(host.on_preference_start_screen(BackupPreferences::NAME));
        assert_eq!(host.back_stack_depth(), 2);

        assert_eq!(host.navigate_up(), NavigateUp::Popped);
        assert_eq!(current_name(&host), Some(AccountPreferences::NAME));
        assert_eq!(host.navigate_up(), NavigateUp::Popped);
        assert_eq!(host.navigate_up(), NavigateUp::Finished);
        assert!(host.is_finished());
        assert!(host.render().unwrap().is_empty());
    }

    #[test]
    fn test_custom_registry() {
        let temp = TempDir::new().unwrap();
        let ctx = AppContext::initialize(BookPaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        let mut registry = ScreenRegistry::new();
        registry.register(BackupPreferences::NAME, || Box::new(BackupPreferences));
        let mut host = SettingsHost::new(registry, ctx.repository());

        host.on_create(None);
        assert!(host.current_screen().is_none());
        assert!(host.on_preference_start_screen(BackupPreferences::NAME));
        assert_eq!(host.back_stack_depth(), 0);
    }

    #[test]
    fn test_defaults_registered() {
        let names: Vec<_> = ScreenRegistry::with_defaults().names().collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"book_manager"));
    }
}
