//! Transaction model
//!
//! A transaction is a set of splits, each moving an amount into or out of
//! one account. In double-entry mode the splits of a transaction must sum to
//! zero.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, TransactionId};
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub account_id: AccountId,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
}

impl Split {
    pub fn new(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            amount,
            memo: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub description: String,

    pub date: NaiveDate,

    /// ISO 4217 currency code
    pub currency: String,

    pub splits: Vec<Split>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    /// Opening balance transactions may be kept when clearing a book
    #[serde(default)]
    pub is_opening_balance: bool,

    /// Template (scheduled) transactions are never bulk deleted
    #[serde(default)]
    pub is_template: bool,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, date: NaiveDate, currency: impl Into<String>) -> Self {
        Self {
            id: TransactionId::new(),
            description: description.into(),
            date,
            currency: currency.into(),
            splits: Vec::new(),
            notes: String::new(),
            is_opening_balance: false,
            is_template: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_split(mut self, split: Split) -> Self {
        self.splits.push(split);
        self
    }

    /// Sum of all split amounts
    pub fn imbalance(&self) -> Money {
        self.splits.iter().map(|s| s.amount).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }

    pub fn touches_account(&self, account_id: AccountId) -> bool {
        self.splits.iter().any(|s| s.account_id == account_id)
    }

    /// Structural validation; balance is checked separately because it
    /// depends on the book's double-entry setting
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.description.trim().is_empty() {
            return Err(TransactionValidationError::EmptyDescription);
        }
        if self.splits.is_empty() {
            return Err(TransactionValidationError::NoSplits);
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({} splits)", self.date, self.description, self.splits.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    EmptyDescription,
    NoSplits,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "Transaction description cannot be empty"),
            Self::NoSplits => write!(f, "Transaction must have at least one split"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_balanced_transaction() {
        let cash = AccountId::new();
        let food = AccountId::new();
        let txn = Transaction::new("Lunch", date(), "USD")
            .with_split(Split::new(food, Money::from_minor(1200)))
            .with_split(Split::new(cash, Money::from_minor(-1200)));

        assert!(txn.is_balanced());
        assert!(txn.touches_account(cash));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_single_sided_transaction_is_unbalanced() {
        let txn = Transaction::new("Lunch", date(), "USD")
            .with_split(Split::new(AccountId::new(), Money::from_minor(1200)));

        assert!(!txn.is_balanced());
        assert_eq!(txn.imbalance(), Money::from_minor(1200));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let txn = Transaction::new("  ", date(), "USD");
        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::EmptyDescription)
        );

        let txn = Transaction::new("Rent", date(), "USD");
        assert_eq!(txn.validate(), Err(TransactionValidationError::NoSplits));
    }
}
