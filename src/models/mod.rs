//! Core data models for gnucash-books
//!
//! Books, and the accounts and transactions that make up each book's ledger.

pub mod account;
pub mod book;
pub mod ids;
pub mod money;
pub mod transaction;

pub use account::{Account, AccountType};
pub use book::{Book, MAX_DISPLAY_NAME_LEN};
pub use ids::{AccountId, BookUid, TransactionId};
pub use money::Money;
pub use transaction::{Split, Transaction};
