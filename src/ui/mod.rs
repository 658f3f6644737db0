//! Front-end building blocks that do not depend on a terminal

pub mod screens;
pub mod settings;

pub use settings::{NavigateUp, PreferenceItem, PreferenceScreen, ScreenRegistry, SettingsHost, ACTION_MANAGE_BOOKS};
