//! Display formatting for terminal output
//!
//! Books and accounts are rendered with `tabled`; the transaction register
//! and backup list are laid out by hand.

pub mod account;
pub mod backup;
pub mod book;
pub mod transaction;

pub use account::format_account_list;
pub use backup::{format_backup_list, format_duration, format_size};
pub use book::{format_book_details, format_book_list};
pub use transaction::format_transaction_register;
