//! Transaction CLI commands

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use crate::display::transaction::format_transaction_register;
use crate::error::{BooksError, BooksResult};
use crate::models::{Money, Split, Transaction};
use crate::repository::Repository;
use crate::storage::Ledger;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a transaction to the active book
    Add {
        /// Description
        description: String,
        /// Split as ACCOUNT=AMOUNT, e.g. "Groceries=42.50"; repeat per split
        #[arg(short, long = "split", required = true)]
        splits: Vec<String>,
        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Currency code (defaults to the book's default currency)
        #[arg(short, long)]
        currency: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Mark as an opening-balance transaction
        #[arg(long)]
        opening_balance: bool,
    },
    /// List transactions, newest first
    List {
        /// Only transactions touching this account
        #[arg(short, long)]
        account: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Delete every non-template transaction of the active book
    DeleteAll {
        /// Keep opening balances (defaults to the book preference)
        #[arg(long)]
        keep_opening_balances: bool,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    repository: &Repository,
    cmd: TransactionCommands,
) -> BooksResult<()> {
    match cmd {
        TransactionCommands::Add {
            description,
            splits,
            date,
            currency,
            notes,
            opening_balance,
        } => {
            let ledger = repository.storage().ledger()?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => Local::now().date_naive(),
            };
            let currency = match currency {
                Some(c) => c.to_ascii_uppercase(),
                None => repository.preferences().default_currency()?,
            };

            let mut txn = Transaction::new(description, date, currency);
            for raw in &splits {
                txn.splits.push(parse_split(&ledger, raw)?);
            }
            txn.notes = notes.unwrap_or_default();
            txn.is_opening_balance = opening_balance;

            let saved = repository.add_transaction(txn)?;
            println!("Added transaction: {}", saved);
            println!("  ID: {}", saved.id);
        }

        TransactionCommands::List { account, limit } => {
            let ledger = repository.storage().ledger()?;
            let transactions = match account {
                Some(identifier) => {
                    let found = ledger
                        .accounts
                        .find(&identifier)?
                        .ok_or_else(|| BooksError::account_not_found(&identifier))?;
                    ledger.transactions.get_by_account(found.id)?
                }
                None => ledger.transactions.get_all()?,
            };
            let mut transactions = transactions;
            transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
            transactions.truncate(limit);
            print!(
                "{}",
                format_transaction_register(&transactions, &ledger.accounts.get_all()?)
            );
        }

        TransactionCommands::DeleteAll {
            keep_opening_balances,
            force,
        } => {
            let book = repository.storage().books().active_book()?;
            if !force {
                println!(
                    "WARNING: This deletes all transactions of '{}'.",
                    book.display_name
                );
                println!("A backup is made first. To proceed, run again with --force:");
                println!("  gnucash-books transaction delete-all --force");
                return Ok(());
            }
            let preserve =
                keep_opening_balances || repository.preferences().should_save_opening_balances()?;
            let deleted = repository.delete_all_transactions(preserve)?;
            println!("Deleted {} transaction(s) from '{}'.", deleted, book.display_name);
        }
    }

    Ok(())
}

fn parse_date(s: &str) -> BooksResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        BooksError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", s))
    })
}

/// `ACCOUNT=AMOUNT`; the account is looked up by name or id
fn parse_split(ledger: &Ledger, raw: &str) -> BooksResult<Split> {
    let (account, amount) = raw.rsplit_once('=').ok_or_else(|| {
        BooksError::Validation(format!("Invalid split '{}'. Use ACCOUNT=AMOUNT", raw))
    })?;
    let account = account.trim();
    let found = ledger
        .accounts
        .find(account)?
        .ok_or_else(|| BooksError::account_not_found(account))?;
    let amount = Money::parse(amount).map_err(|e| {
        BooksError::Validation(format!("Invalid amount in split '{}': {}", raw, e))
    })?;
    Ok(Split::new(found.id, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-03-14").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
        assert!(parse_date("14/03/2025").unwrap_err().is_validation());
    }
}
