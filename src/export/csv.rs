//! CSV export of accounts and transactions
//!
//! Accounts are written one per row with their colon-separated full name,
//! the way GnuCash names them (`Assets:Current Assets:Checking Account`).
//! Transactions are written one row per split.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::error::{BooksError, BooksResult};
use crate::models::{Account, AccountId, AccountType, Transaction};

#[derive(Serialize)]
struct AccountRow<'a> {
    #[serde(rename = "type")]
    account_type: String,
    full_name: String,
    name: &'a str,
    currency: &'a str,
    placeholder: bool,
    id: String,
}

#[derive(Serialize)]
struct SplitRow<'a> {
    date: String,
    transaction_id: String,
    description: &'a str,
    notes: &'a str,
    currency: &'a str,
    account: String,
    amount: String,
    memo: &'a str,
}

/// Write every non-root account
pub fn write_accounts_csv<W: Write>(accounts: &[Account], writer: W) -> BooksResult<()> {
    let names = FullNames::new(accounts);
    let mut out = ::csv::Writer::from_writer(writer);

    for account in accounts.iter().filter(|a| a.account_type != AccountType::Root) {
        out.serialize(AccountRow {
            account_type: account.account_type.to_string(),
            full_name: names.full_name(account.id),
            name: &account.name,
            currency: &account.currency,
            placeholder: account.placeholder,
            id: account.id.to_string(),
        })
        .map_err(export_error)?;
    }

    out.flush()
        .map_err(|e| BooksError::Export(format!("Failed to flush CSV: {}", e)))
}

/// Write one row per split of every non-template transaction
pub fn write_transactions_csv<W: Write>(
    transactions: &[Transaction],
    accounts: &[Account],
    writer: W,
) -> BooksResult<()> {
    let names = FullNames::new(accounts);
    let mut out = ::csv::Writer::from_writer(writer);

    for txn in transactions.iter().filter(|t| !t.is_template) {
        for split in &txn.splits {
            out.serialize(SplitRow {
                date: txn.date.format("%Y-%m-%d").to_string(),
                transaction_id: txn.id.to_string(),
                description: &txn.description,
                notes: &txn.notes,
                currency: &txn.currency,
                account: names.full_name(split.account_id),
                amount: split.amount.to_string(),
                memo: &split.memo,
            })
            .map_err(export_error)?;
        }
    }

    out.flush()
        .map_err(|e| BooksError::Export(format!("Failed to flush CSV: {}", e)))
}

fn export_error(e: ::csv::Error) -> BooksError {
    BooksError::Export(format!("Failed to write CSV row: {}", e))
}

/// Colon-separated account paths, root excluded
pub(crate) struct FullNames<'a> {
    by_id: HashMap<AccountId, &'a Account>,
}

impl<'a> FullNames<'a> {
    pub(crate) fn new(accounts: &'a [Account]) -> Self {
        Self {
            by_id: accounts.iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub(crate) fn full_name(&self, id: AccountId) -> String {
        let mut parts = Vec::new();
        let mut current = self.by_id.get(&id).copied();

        // Bounded walk; a corrupt parent cycle must not hang the export
        while let Some(account) = current {
            if account.account_type == AccountType::Root || parts.len() > self.by_id.len() {
                break;
            }
            parts.push(account.name.as_str());
            current = account.parent_id.and_then(|p| self.by_id.get(&p).copied());
        }

        if parts.is_empty() {
            return id.to_string();
        }
        parts.reverse();
        parts.join(":")
    }
}
