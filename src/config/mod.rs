//! Configuration module for gnucash-books
//!
//! - Data directory resolution and on-disk layout
//! - Global application settings

pub mod paths;
pub mod settings;

pub use paths::BookPaths;
pub use settings::Settings;
