//! Storage initialization
//!
//! First-run setup and the default account tree.

use tracing::info;

use crate::error::BooksResult;
use crate::models::{Account, AccountType, Book};

use super::{Ledger, Storage};

/// Name given to the book created on first run
pub const DEFAULT_BOOK_NAME: &str = "Book 1";

/// Initialize storage for a fresh installation
///
/// Creates and activates a first book when the registry is empty. Returns the
/// created book, or `None` if books already existed.
pub fn initialize_storage(storage: &Storage) -> BooksResult<Option<Book>> {
    storage.paths().ensure_directories()?;

    if storage.books().count()? > 0 {
        return Ok(None);
    }

    let book = storage.create_book(DEFAULT_BOOK_NAME)?;
    storage.books().set_active(&book.uid)?;
    storage.initialize_database_adapters()?;
    info!(book = %book.uid, "Created first book");

    Ok(Some(book))
}

/// Create the standard GnuCash starter account tree in `ledger`
///
/// Returns the created accounts. The ledger is saved.
pub fn create_default_accounts(ledger: &Ledger, currency: &str) -> BooksResult<Vec<Account>> {
    let root = match ledger.accounts.root_account()? {
        Some(root) => root,
        None => Account::new("Root Account", AccountType::Root, None, currency).placeholder(),
    };

    let mut accounts = vec![root.clone()];
    let mut add = |name: &str, account_type: AccountType, parent: &Account| -> Account {
        let account = Account::new(name, account_type, Some(parent.id), currency);
        accounts.push(account.clone());
        account
    };

    let assets = add("Assets", AccountType::Asset, &root);
    let current = add("Current Assets", AccountType::Asset, &assets);
    add("Cash in Wallet", AccountType::Cash, &current);
    add("Checking Account", AccountType::Bank, &current);
    add("Savings Account", AccountType::Bank, &current);

    let liabilities = add("Liabilities", AccountType::Liability, &root);
    add("Credit Card", AccountType::Credit, &liabilities);

    let income = add("Income", AccountType::Income, &root);
    add("Salary", AccountType::Income, &income);

    let expenses = add("Expenses", AccountType::Expense, &root);
    for name in ["Groceries", "Rent", "Utilities", "Transportation", "Dining"] {
        add(name, AccountType::Expense, &expenses);
    }

    let equity = add("Equity", AccountType::Equity, &root);
    add("Opening Balances", AccountType::Equity, &equity);

    // Group accounts are placeholders
    for account in accounts.iter_mut() {
        if matches!(account.name.as_str(), "Assets" | "Income" | "Expenses" | "Equity" | "Liabilities") {
            account.placeholder = true;
        }
    }

    ledger.accounts.bulk_add(accounts.clone())?;
    ledger.save()?;
    Ok(accounts)
}
