//! Per-book preference CLI commands

use clap::Subcommand;
use serde_json::Value;

use crate::audit::{AuditEntry, EntityType, Operation};
use crate::error::{BooksError, BooksResult};
use crate::preferences::{keys, SharedPreferences};
use crate::repository::Repository;

use super::book::resolve_book;

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// List every stored preference
    List {
        /// Book (defaults to the active book)
        #[arg(short, long)]
        book: Option<String>,
    },
    /// Print one preference
    Get {
        key: String,
        #[arg(short, long)]
        book: Option<String>,
    },
    /// Set a preference; `true`/`false` and integers are stored typed
    Set {
        key: String,
        value: String,
        #[arg(short, long)]
        book: Option<String>,
    },
    /// Remove a preference, restoring its default
    Unset {
        key: String,
        #[arg(short, long)]
        book: Option<String>,
    },
}

pub fn handle_prefs_command(repository: &Repository, cmd: PrefsCommands) -> BooksResult<()> {
    match cmd {
        PrefsCommands::List { book } => {
            let prefs = book_preferences(repository, book.as_deref())?;
            let all = prefs.all()?;
            if all.is_empty() {
                println!("No preferences set.");
            }
            for (key, value) in all {
                println!("{} = {}", key, value);
            }
        }

        PrefsCommands::Get { key, book } => {
            let prefs = book_preferences(repository, book.as_deref())?;
            match prefs.all()?.get(&key) {
                Some(value) => println!("{}", value),
                None => println!("{} is not set", key),
            }
        }

        PrefsCommands::Set { key, value, book } => {
            let prefs = book_preferences(repository, book.as_deref())?;
            let value = parse_value(&key, &value)?;
            prefs.edit().put_value(&key, value.clone()).apply()?;
            repository.audit().record(
                AuditEntry::new(Operation::Update, EntityType::Preferences, prefs.name())
                    .with_details(&serde_json::json!({ "key": key, "value": value })),
            );
            println!("{} = {}", key, value);
        }

        PrefsCommands::Unset { key, book } => {
            let prefs = book_preferences(repository, book.as_deref())?;
            if !prefs.contains(&key)? {
                println!("{} is not set", key);
                return Ok(());
            }
            prefs.edit().remove(&key).apply()?;
            repository.audit().record(
                AuditEntry::new(Operation::Delete, EntityType::Preferences, prefs.name())
                    .with_details(&serde_json::json!({ "key": key })),
            );
            println!("Removed {}", key);
        }
    }
    Ok(())
}

fn book_preferences(
    repository: &Repository,
    book: Option<&str>,
) -> BooksResult<std::sync::Arc<SharedPreferences>> {
    let manager = repository.preferences();
    match book {
        Some(identifier) => {
            let found = resolve_book(repository, identifier)?;
            manager.get_book_shared_preferences(&found.uid)
        }
        None => manager.get_active_book_shared_preferences(),
    }
}

/// Typed value for `key`; known keys are checked
fn parse_value(key: &str, raw: &str) -> BooksResult<Value> {
    let raw = raw.trim();
    match key {
        keys::USE_DOUBLE_ENTRY | keys::SAVE_OPENING_BALANCES => match raw {
            "true" | "on" | "yes" => Ok(Value::Bool(true)),
            "false" | "off" | "no" => Ok(Value::Bool(false)),
            _ => Err(BooksError::Validation(format!(
                "'{}' expects true or false, got '{}'",
                key, raw
            ))),
        },
        keys::DEFAULT_CURRENCY => {
            let code = raw.to_ascii_uppercase();
            if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
                Ok(Value::String(code))
            } else {
                Err(BooksError::Validation(format!(
                    "Invalid currency code: '{}'",
                    raw
                )))
            }
        }
        _ => Ok(match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_keys() {
        assert_eq!(parse_value(keys::USE_DOUBLE_ENTRY, "off").unwrap(), Value::Bool(false));
        assert_eq!(
            parse_value(keys::DEFAULT_CURRENCY, "eur").unwrap(),
            Value::String("EUR".into())
        );
        assert!(parse_value(keys::DEFAULT_CURRENCY, "euro").unwrap_err().is_validation());
        assert!(parse_value(keys::SAVE_OPENING_BALANCES, "maybe").is_err());
    }

    #[test]
    fn test_parse_other_keys() {
        assert_eq!(parse_value("theme", "dark").unwrap(), Value::String("dark".into()));
        assert_eq!(parse_value("page_size", "25").unwrap(), Value::from(25));
        assert_eq!(parse_value("beta", "true").unwrap(), Value::Bool(true));
    }
}
